// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The Workflow Runtime: drives a [`Workflow`]'s stage DAG to completion.
//!
//! One dispatch pass finds every currently-runnable stage (per
//! [`Stage::is_runnable`]), runs them concurrently, and folds each
//! `TaskResult` back into the workflow — advancing the DAG, applying a
//! jump, or halting. A `TransientError` never reaches the caller: it is
//! caught here and turned into a queued retry with Full Jitter backoff.

pub mod jump;
pub mod pipeline;
pub mod recovery;
pub mod retry;

use std::collections::BTreeMap;

use serde_json::json;

use forge_core::{codes, Event, EventKind, StageStatus, TaskResult, Workflow, WorkflowStatus};

use crate::error::EngineError;
use crate::services::EngineServices;
use crate::tasks;

use retry::RetryTracker;

/// Outcome of driving a workflow to a fixed point: either it's done (in
/// whatever terminal-ish status it landed on) or every runnable stage is
/// now waiting on a queued retry and the caller should come back later.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriveOutcome {
    Done,
    AwaitingRetry,
}

/// Runs stages to completion for one workflow, owning the per-process
/// retry budget (`RetryTracker` does not persist across a crash; the
/// durable retry queue in storage does).
pub struct WorkflowRuntime {
    services: EngineServices,
    retries: RetryTracker,
}

impl WorkflowRuntime {
    pub fn new(services: EngineServices) -> Self {
        Self {
            services,
            retries: RetryTracker::new(),
        }
    }

    /// Drive `workflow` forward until no stage is runnable: either every
    /// stage reached a resting status, or every remaining runnable stage
    /// is now parked behind a due-at-future-time retry.
    pub async fn drive(&mut self, workflow: &mut Workflow) -> Result<DriveOutcome, EngineError> {
        if workflow.status == WorkflowStatus::NotStarted {
            workflow.status = WorkflowStatus::Running;
            workflow.started_at_ms = Some(self.services.now_ms());
        }

        loop {
            let runnable_refs: Vec<String> = workflow
                .stages
                .iter()
                .filter(|(_, stage)| stage.is_runnable(&workflow.stages))
                .map(|(ref_id, _)| ref_id.clone())
                .collect();

            if runnable_refs.is_empty() {
                break;
            }

            for ref_id in runnable_refs {
                self.dispatch_one(workflow, &ref_id).await?;
                if workflow.status == WorkflowStatus::Terminal {
                    self.persist(workflow)?;
                    return Ok(DriveOutcome::Done);
                }
            }

            self.persist(workflow)?;
        }

        // `not_before_ms` is stored as a SQLite `i64`; querying with
        // `u64::MAX` would wrap to `-1` and match nothing, so the
        // practical "anything ever queued" ceiling is `i64::MAX`.
        let any_pending_retry = self
            .services
            .store
            .due_stage_retries(i64::MAX as u64)?
            .iter()
            .any(|(_, wf_id, _)| *wf_id == workflow.id);

        if workflow.status == WorkflowStatus::Running && !any_pending_retry && workflow.stages.values().all(|s| {
            matches!(
                s.status,
                StageStatus::Succeeded | StageStatus::FailedContinue | StageStatus::Skipped
            )
        }) {
            workflow.status = WorkflowStatus::Succeeded;
            workflow.ended_at_ms = Some(self.services.now_ms());
        }

        self.persist(workflow)?;

        if any_pending_retry {
            Ok(DriveOutcome::AwaitingRetry)
        } else {
            Ok(DriveOutcome::Done)
        }
    }

    /// Run one stage's Task and fold its outcome back into the workflow.
    async fn dispatch_one(&mut self, workflow: &mut Workflow, ref_id: &str) -> Result<(), EngineError> {
        let stage = workflow
            .stage_mut(ref_id)
            .ok_or_else(|| EngineError::StageNotFound(ref_id.to_string()))?;
        stage.status = StageStatus::Running;
        let stage_snapshot = stage.clone();

        self.services.bus.publish(
            Event::new(EventKind::Message, codes::WORKFLOW_STAGE_START, self.services.now_ms())
                .with_label(ref_id.to_string()),
        );

        let outcome = tasks::execute_stage(&stage_snapshot, &self.services).await;

        match outcome {
            Ok(result) => self.apply_result(workflow, ref_id, result),
            Err(transient) => self.queue_retry(workflow, ref_id, transient),
        }
    }

    fn apply_result(
        &mut self,
        workflow: &mut Workflow,
        ref_id: &str,
        result: TaskResult,
    ) -> Result<(), EngineError> {
        match result {
            TaskResult::Success { outputs } => {
                let stage = workflow
                    .stage_mut(ref_id)
                    .ok_or_else(|| EngineError::StageNotFound(ref_id.to_string()))?;
                stage.status = StageStatus::Succeeded;
                stage.outputs = outputs;
                self.retries.clear(ref_id);
                propagate_outputs(workflow, ref_id);
                self.record_event(workflow.id.clone(), ref_id, codes::WORKFLOW_STAGE_DONE, json!({"status": "succeeded"}));
            }
            TaskResult::FailedContinue { error, outputs } => {
                let stage = workflow
                    .stage_mut(ref_id)
                    .ok_or_else(|| EngineError::StageNotFound(ref_id.to_string()))?;
                stage.status = StageStatus::FailedContinue;
                stage.outputs = outputs;
                self.retries.clear(ref_id);
                propagate_outputs(workflow, ref_id);
                self.record_event(
                    workflow.id.clone(),
                    ref_id,
                    codes::WORKFLOW_STAGE_DONE,
                    json!({"status": "failed_continue", "error": error}),
                );
            }
            TaskResult::JumpTo { target_ref, context_overrides } => {
                self.retries.clear(ref_id);
                jump::apply_jump(workflow, &target_ref, context_overrides)?;
                self.record_event(
                    workflow.id.clone(),
                    ref_id,
                    codes::WORKFLOW_JUMP,
                    json!({"target": target_ref}),
                );
            }
            TaskResult::Terminal { error } => {
                let stage = workflow
                    .stage_mut(ref_id)
                    .ok_or_else(|| EngineError::StageNotFound(ref_id.to_string()))?;
                stage.status = StageStatus::Terminal;
                workflow.status = WorkflowStatus::Terminal;
                workflow.ended_at_ms = Some(self.services.now_ms());
                self.record_event(
                    workflow.id.clone(),
                    ref_id,
                    codes::WORKFLOW_TERMINAL,
                    json!({"error": error}),
                );
            }
        }
        Ok(())
    }

    /// A `TransientError` unwound out of the Task: reset the stage to
    /// `NotStarted` so it's re-dispatched once its retry is due, and queue
    /// that retry with Full Jitter backoff scaled by this stage's attempt
    /// count so far this process.
    fn queue_retry(&mut self, workflow: &mut Workflow, ref_id: &str, transient: forge_core::TransientError) -> Result<(), EngineError> {
        let attempt = self.retries.record_attempt(ref_id);
        if self.retries.exhausted(ref_id, self.services.config.auto_retry_max_cycles) {
            let stage = workflow
                .stage_mut(ref_id)
                .ok_or_else(|| EngineError::StageNotFound(ref_id.to_string()))?;
            stage.status = StageStatus::Terminal;
            workflow.status = WorkflowStatus::Terminal;
            workflow.ended_at_ms = Some(self.services.now_ms());
            self.record_event(
                workflow.id.clone(),
                ref_id,
                codes::WORKFLOW_TERMINAL,
                json!({"error": format!("retry budget exhausted: {}", transient.message)}),
            );
            return Ok(());
        }

        self.services.gateway.reset_circuits();

        let delay = retry::full_jitter_delay(transient.retry_after, attempt.saturating_sub(1));
        let not_before_ms = self.services.now_ms() + delay.as_millis() as u64;
        let message_id = format!("{}:{}:{}", workflow.id.as_str(), ref_id, attempt);
        self.services.store.enqueue_stage_retry(
            &message_id,
            &workflow.id,
            ref_id,
            not_before_ms,
            self.services.now_ms(),
        )?;

        let stage = workflow
            .stage_mut(ref_id)
            .ok_or_else(|| EngineError::StageNotFound(ref_id.to_string()))?;
        stage.status = StageStatus::NotStarted;
        self.record_event(
            workflow.id.clone(),
            ref_id,
            codes::WORKFLOW_STAGE_START,
            json!({"retry_attempt": attempt, "delay_ms": delay.as_millis() as u64, "message": transient.message}),
        );
        Ok(())
    }

    fn record_event(&self, workflow_id: forge_core::WorkflowId, ref_id: &str, kind: &str, payload: serde_json::Value) {
        let _ = self.services.store.append_workflow_event(
            &workflow_id,
            Some(ref_id),
            kind,
            &payload,
            self.services.now_ms(),
        );
    }

    fn persist(&self, workflow: &Workflow) -> Result<(), EngineError> {
        self.services.store.save_workflow(workflow, self.services.now_ms())?;
        Ok(())
    }
}

/// Carry a just-finished stage's outputs into every not-yet-started stage
/// that lists it as a requisite: flattened (so e.g. `plan_config` or
/// `acceptance_criteria` land directly in a dependent's context under the
/// same key the Task that produced them used) and nested under
/// `ancestor_outputs.<ref_id>` for a Task that wants a specific ancestor's
/// raw output rather than a merged view. Flattened keys never clobber a
/// value the workflow assembler already set on the dependent.
fn propagate_outputs(workflow: &mut Workflow, ref_id: &str) {
    let Some(outputs) = workflow.stage(ref_id).map(|s| s.outputs.clone()) else {
        return;
    };
    if outputs.is_empty() {
        return;
    }

    let dependents: Vec<String> = workflow
        .stages
        .iter()
        .filter(|(other_ref, stage)| {
            stage.status == StageStatus::NotStarted
                && other_ref.as_str() != ref_id
                && stage.requisite_stage_ref_ids.iter().any(|r| r == ref_id)
        })
        .map(|(other_ref, _)| other_ref.clone())
        .collect();

    for dependent_ref in dependents {
        if let Some(dependent) = workflow.stage_mut(&dependent_ref) {
            dependent.context.merge_missing(&outputs);
            let mut ancestor_outputs = dependent
                .context
                .get("ancestor_outputs")
                .and_then(|v| v.as_object())
                .cloned()
                .unwrap_or_default();
            ancestor_outputs.insert(ref_id.to_string(), serde_json::to_value(&outputs).unwrap_or(serde_json::Value::Null));
            dependent.context.set("ancestor_outputs", serde_json::Value::Object(ancestor_outputs));
        }
    }
}

/// Re-dispatch every due retry against its owning workflow, one
/// [`WorkflowRuntime::drive`] pass each. Intended to be polled by the
/// daemon on a timer.
pub async fn process_due_retries(services: &EngineServices) -> Result<usize, EngineError> {
    let due = services.store.due_stage_retries(services.now_ms())?;
    let mut processed = 0;
    let mut seen_workflows = BTreeMap::new();
    for (message_id, workflow_id, _stage_ref_id) in due {
        services.store.remove_queue_message(&message_id)?;
        if seen_workflows.contains_key(workflow_id.as_str()) {
            continue;
        }
        seen_workflows.insert(workflow_id.as_str().to_string(), ());
        let mut workflow = services.store.require_workflow(&workflow_id)?;
        let mut runtime = WorkflowRuntime::new(services.clone());
        runtime.drive(&mut workflow).await?;
        processed += 1;
    }
    Ok(processed)
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
