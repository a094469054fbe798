// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use forge_core::Stage;

fn sample_workflow() -> Workflow {
    let mut wf = Workflow::new(WorkflowId::new("wf-1"));
    wf.add_stage(Stage::new("plan", "plan", "Plan"));
    wf.status = WorkflowStatus::Running;
    wf
}

#[test]
fn round_trip_save_and_load() {
    let store = Store::open_in_memory().expect("open");
    let wf = sample_workflow();
    store.save_workflow(&wf, 1_000).expect("save");

    let loaded = store.load_workflow(&wf.id).expect("load").expect("present");
    assert_eq!(loaded.id, wf.id);
    assert_eq!(loaded.status, WorkflowStatus::Running);
    assert!(loaded.stage("plan").is_some());
}

#[test]
fn save_is_upsert() {
    let store = Store::open_in_memory().expect("open");
    let mut wf = sample_workflow();
    store.save_workflow(&wf, 1_000).expect("first save");

    wf.status = WorkflowStatus::Succeeded;
    store.save_workflow(&wf, 2_000).expect("second save");

    let loaded = store.load_workflow(&wf.id).expect("load").expect("present");
    assert_eq!(loaded.status, WorkflowStatus::Succeeded);
}

#[test]
fn missing_workflow_loads_as_none() {
    let store = Store::open_in_memory().expect("open");
    let result = store.load_workflow(&WorkflowId::new("missing")).expect("load");
    assert!(result.is_none());
}

#[test]
fn require_workflow_errors_when_absent() {
    let store = Store::open_in_memory().expect("open");
    let err = store.require_workflow(&WorkflowId::new("missing")).unwrap_err();
    assert!(matches!(err, StorageError::WorkflowNotFound(_)));
}

#[test]
fn recoverable_workflows_filters_by_status() {
    let store = Store::open_in_memory().expect("open");

    let mut running = Workflow::new(WorkflowId::new("running"));
    running.status = WorkflowStatus::Running;
    store.save_workflow(&running, 1).expect("save running");

    let mut succeeded = Workflow::new(WorkflowId::new("succeeded"));
    succeeded.status = WorkflowStatus::Succeeded;
    store.save_workflow(&succeeded, 1).expect("save succeeded");

    let recoverable = store.recoverable_workflows().expect("query");
    assert_eq!(recoverable.len(), 1);
    assert_eq!(recoverable[0].id, running.id);
}

#[test]
fn append_and_count_workflow_events() {
    let store = Store::open_in_memory().expect("open");
    let id = WorkflowId::new("wf-1");
    store
        .append_workflow_event(&id, Some("validate"), "task_result", &serde_json::json!({"ok": true}), 1)
        .expect("append");
    store
        .append_workflow_event(&id, Some("validate"), "task_result", &serde_json::json!({"ok": false}), 2)
        .expect("append");
    assert_eq!(store.workflow_event_count(&id).expect("count"), 2);
}

#[test]
fn due_stage_retries_respects_not_before() {
    let store = Store::open_in_memory().expect("open");
    let id = WorkflowId::new("wf-1");
    store
        .enqueue_stage_retry("msg-1", &id, "validate", 5_000, 1_000)
        .expect("enqueue");

    assert!(store.due_stage_retries(4_000).expect("query").is_empty());
    let due = store.due_stage_retries(5_000).expect("query");
    assert_eq!(due.len(), 1);
    assert_eq!(due[0].0, "msg-1");

    store.remove_queue_message("msg-1").expect("remove");
    assert!(store.due_stage_retries(5_000).expect("query").is_empty());
}

#[test]
fn list_workflow_ids_returns_every_saved_workflow() {
    let store = Store::open_in_memory().expect("open");
    store.save_workflow(&sample_workflow(), 1).expect("save");
    let mut other = Workflow::new(WorkflowId::new("wf-2"));
    other.status = WorkflowStatus::Succeeded;
    store.save_workflow(&other, 2).expect("save");

    let mut ids = store.list_workflow_ids().expect("list");
    ids.sort();
    assert_eq!(ids, vec!["wf-1".to_string(), "wf-2".to_string()]);
}

#[test]
fn purge_removes_workflow_and_events() {
    let store = Store::open_in_memory().expect("open");
    let wf = sample_workflow();
    store.save_workflow(&wf, 1).expect("save");
    store
        .append_workflow_event(&wf.id, None, "created", &serde_json::json!({}), 1)
        .expect("append");

    store.purge_workflow(&wf.id).expect("purge");

    assert!(store.load_workflow(&wf.id).expect("load").is_none());
    assert_eq!(store.workflow_event_count(&wf.id).expect("count"), 0);
}
