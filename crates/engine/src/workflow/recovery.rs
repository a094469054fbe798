// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Crash recovery: on daemon startup, every workflow left in a
//! non-terminal or ambiguous status gets reset to `Running` and handed
//! back to the runtime so in-flight stages are re-dispatched.

use forge_core::{StageStatus, Workflow, WorkflowStatus};
use forge_storage::Store;

use crate::error::EngineError;

/// Load every workflow crash recovery should reconsider, reset its
/// workflow-level status to `Running`, and re-arm any stage that was
/// `Running` when the process died — its task may or may not have
/// completed, so the safe move is to redispatch it. Stages already
/// `Succeeded` or `FailedContinue` are untouched; completed work isn't
/// redone.
pub fn recover(store: &Store) -> Result<Vec<Workflow>, EngineError> {
    let mut workflows = store.recoverable_workflows()?;
    for workflow in &mut workflows {
        workflow.status = WorkflowStatus::Running;
        for stage in workflow.stages.values_mut() {
            if stage.status == StageStatus::Running {
                stage.status = StageStatus::NotStarted;
            }
        }
    }
    Ok(workflows)
}

#[cfg(test)]
#[path = "recovery_tests.rs"]
mod tests;
