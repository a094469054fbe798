// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::sync::Arc;

use forge_core::{EngineConfig, EventBus, FakeClock, Stage, StageStatus, TaskResult, Workflow, WorkflowId, WorkflowStatus};
use forge_gateway::Gateway;
use forge_storage::Store;

use super::*;
use crate::services::EngineServices;

fn services() -> EngineServices {
    let home = tempfile::tempdir().unwrap();
    let bus = EventBus::new();
    let clock = FakeClock::new(1_000);
    let gateway = Gateway::new(home.path(), bus.clone(), clock.clone()).unwrap();
    let store = Store::open_in_memory().unwrap();
    EngineServices::new(
        Arc::new(gateway),
        bus,
        Arc::new(store),
        EngineConfig::default(),
        home.path().to_path_buf(),
        clock,
    )
}

#[tokio::test]
async fn unknown_stage_type_halts_the_workflow() {
    let mut wf = Workflow::new(WorkflowId::new("wf-unknown"));
    wf.add_stage(Stage::new("mystery", "no_such_task", "Mystery"));

    let mut runtime = WorkflowRuntime::new(services());
    let outcome = runtime.drive(&mut wf).await.unwrap();

    assert_eq!(outcome, DriveOutcome::Done);
    assert_eq!(wf.status, WorkflowStatus::Terminal);
    assert_eq!(wf.stage("mystery").unwrap().status, StageStatus::Terminal);
}

#[tokio::test]
async fn already_resolved_workflow_settles_to_succeeded() {
    let mut wf = Workflow::new(WorkflowId::new("wf-done"));
    wf.status = WorkflowStatus::Running;
    let mut plan = Stage::new("plan", "plan", "Plan");
    plan.status = StageStatus::Succeeded;
    wf.add_stage(plan);

    let mut runtime = WorkflowRuntime::new(services());
    let outcome = runtime.drive(&mut wf).await.unwrap();

    assert_eq!(outcome, DriveOutcome::Done);
    assert_eq!(wf.status, WorkflowStatus::Succeeded);
    assert!(wf.ended_at_ms.is_some());
}

#[tokio::test]
async fn apply_result_success_clears_retry_count_and_advances() {
    let mut wf = Workflow::new(WorkflowId::new("wf-apply"));
    wf.add_stage(Stage::new("implement", "implement", "Implement"));

    let mut runtime = WorkflowRuntime::new(services());
    runtime.retries.record_attempt("implement");
    runtime
        .apply_result(&mut wf, "implement", TaskResult::success())
        .unwrap();

    assert_eq!(wf.stage("implement").unwrap().status, StageStatus::Succeeded);
    assert_eq!(runtime.retries.attempts("implement"), 0);
}

#[tokio::test]
async fn apply_result_jump_resets_target_stage() {
    let mut wf = Workflow::new(WorkflowId::new("wf-jump"));
    wf.add_stage(Stage::new("implement", "implement", "Implement"));
    let mut repair = Stage::new("repair", "repair", "Repair");
    repair.status = StageStatus::Succeeded;
    wf.add_stage(repair);

    let mut runtime = WorkflowRuntime::new(services());
    let overrides = std::collections::BTreeMap::new();
    runtime
        .apply_result(&mut wf, "implement", TaskResult::jump_to("repair", overrides))
        .unwrap();

    assert_eq!(wf.stage("repair").unwrap().status, StageStatus::NotStarted);
}

#[tokio::test]
async fn apply_result_success_propagates_outputs_to_dependents() {
    let mut wf = Workflow::new(WorkflowId::new("wf-propagate"));
    wf.add_stage(Stage::new("plan", "plan", "Plan"));
    wf.add_stage(Stage::new("setup", "setup", "Setup").requires(["plan"]));
    let mut unrelated = Stage::new("watchdog", "watchdog", "Watchdog");
    unrelated.status = StageStatus::Succeeded;
    wf.add_stage(unrelated);

    let mut outputs = std::collections::BTreeMap::new();
    outputs.insert("plan_config".to_string(), serde_json::json!({"setup_commands": ["npm install"]}));
    outputs.insert("project_root".to_string(), serde_json::json!("/work"));

    let mut runtime = WorkflowRuntime::new(services());
    runtime
        .apply_result(&mut wf, "plan", TaskResult::success_with(outputs))
        .unwrap();

    let setup = wf.stage("setup").unwrap();
    assert_eq!(setup.context.get("plan_config").unwrap()["setup_commands"][0], "npm install");
    assert_eq!(setup.context.get("project_root").unwrap(), "/work");
    assert_eq!(
        setup.context.get("ancestor_outputs").unwrap()["plan"]["project_root"],
        "/work"
    );

    // an unrelated already-finished stage is left untouched
    assert!(wf.stage("watchdog").unwrap().context.get("ancestor_outputs").is_none());
}

#[tokio::test]
async fn apply_result_success_does_not_clobber_explicit_dependent_context() {
    let mut wf = Workflow::new(WorkflowId::new("wf-no-clobber"));
    wf.add_stage(Stage::new("plan", "plan", "Plan"));
    let mut setup = Stage::new("setup", "setup", "Setup").requires(["plan"]);
    setup.context.set("project_root", "/already-set");
    wf.add_stage(setup);

    let mut outputs = std::collections::BTreeMap::new();
    outputs.insert("project_root".to_string(), serde_json::json!("/work"));

    let mut runtime = WorkflowRuntime::new(services());
    runtime
        .apply_result(&mut wf, "plan", TaskResult::success_with(outputs))
        .unwrap();

    assert_eq!(wf.stage("setup").unwrap().context.get("project_root").unwrap(), "/already-set");
}

#[tokio::test]
async fn process_due_retries_is_a_noop_with_nothing_queued() {
    let services = services();
    let processed = process_due_retries(&services).await.unwrap();
    assert_eq!(processed, 0);
}
