// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Applying a `TaskResult::JumpTo` to a running workflow: reset the target
//! stage and merge in the overrides a Task built with
//! [`forge_core::build_jump_overrides`].

use forge_core::{Stage, StageStatus, Workflow};

use crate::error::EngineError;

/// Reset `target_ref` to runnable and merge `overrides` into its context.
/// Creates the target stage (with no requisites, so it reruns immediately)
/// if the workflow doesn't already define it — a Task may jump to a stage
/// name the workflow assembler didn't pre-declare, e.g. a synthetic retry
/// target.
pub fn apply_jump(
    workflow: &mut Workflow,
    target_ref: &str,
    overrides: std::collections::BTreeMap<String, serde_json::Value>,
) -> Result<(), EngineError> {
    match workflow.stage_mut(target_ref) {
        Some(stage) => {
            stage.context.merge(overrides);
            stage.status = StageStatus::NotStarted;
            stage.outputs.clear();
        }
        None => {
            let mut stage = Stage::new(target_ref, target_ref, target_ref);
            stage.context.merge(overrides);
            workflow.add_stage(stage);
        }
    }
    Ok(())
}

#[cfg(test)]
#[path = "jump_tests.rs"]
mod tests;
