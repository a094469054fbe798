// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Workflow: the persistent DAG of stages the runtime schedules.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::stage::Stage;

crate::define_id! {
    /// Unique identifier for a workflow.
    pub struct WorkflowId;
}

/// Workflow status. Transitions monotonically forward unless explicitly
/// reset by crash recovery.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowStatus {
    NotStarted,
    Running,
    Succeeded,
    FailedContinue,
    Terminal,
    Canceled,
    Skipped,
}

impl WorkflowStatus {
    /// Non-terminal statuses that crash recovery resets to `Running` on startup.
    pub fn is_recoverable(self) -> bool {
        matches!(
            self,
            WorkflowStatus::Running
                | WorkflowStatus::Terminal
                | WorkflowStatus::Canceled
                | WorkflowStatus::FailedContinue
        )
    }

    pub fn is_done(self) -> bool {
        matches!(
            self,
            WorkflowStatus::Succeeded
                | WorkflowStatus::Terminal
                | WorkflowStatus::Canceled
                | WorkflowStatus::Skipped
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Workflow {
    pub id: WorkflowId,
    pub status: WorkflowStatus,
    /// Stages keyed by their `ref_id`, insertion-ordered.
    pub stages: BTreeMap<String, Stage>,
    pub started_at_ms: Option<u64>,
    pub ended_at_ms: Option<u64>,
}

impl Workflow {
    pub fn new(id: WorkflowId) -> Self {
        Self {
            id,
            status: WorkflowStatus::NotStarted,
            stages: BTreeMap::new(),
            started_at_ms: None,
            ended_at_ms: None,
        }
    }

    pub fn add_stage(&mut self, stage: Stage) {
        self.stages.insert(stage.ref_id.clone(), stage);
    }

    pub fn stage(&self, ref_id: &str) -> Option<&Stage> {
        self.stages.get(ref_id)
    }

    pub fn stage_mut(&mut self, ref_id: &str) -> Option<&mut Stage> {
        self.stages.get_mut(ref_id)
    }
}

#[cfg(test)]
#[path = "workflow_tests.rs"]
mod tests;
