// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! TaskResult: the tagged union every Task returns.
//!
//! Represented as a plain enum, inspected by the runtime dispatcher and
//! never mutated, per the design notes — not inheritance, not per-variant
//! exceptions. `TransientError` is the one case modeled as an error instead
//! of a variant, because it crosses the Task/runtime boundary and must
//! unwind whatever subprocess or LLM call is in flight.

use std::collections::BTreeMap;
use std::time::Duration;

use serde_json::Value;
use thiserror::Error;

/// What a Task decided for its stage.
#[derive(Debug, Clone)]
pub enum TaskResult {
    /// Stage completes; DAG advances. `outputs` is written once, read-only after.
    Success { outputs: BTreeMap<String, Value> },
    /// Stage records a failure but the DAG still advances.
    FailedContinue {
        error: String,
        outputs: BTreeMap<String, Value>,
    },
    /// Control transfers to `target_ref`; its context is updated with
    /// `context_overrides` (last-writer-wins), preserving the jump counter.
    JumpTo {
        target_ref: String,
        context_overrides: BTreeMap<String, Value>,
    },
    /// The workflow halts. Resumable later.
    Terminal { error: String },
}

impl TaskResult {
    pub fn success() -> Self {
        TaskResult::Success {
            outputs: BTreeMap::new(),
        }
    }

    pub fn success_with(outputs: BTreeMap<String, Value>) -> Self {
        TaskResult::Success { outputs }
    }

    pub fn failed_continue(error: impl Into<String>) -> Self {
        TaskResult::FailedContinue {
            error: error.into(),
            outputs: BTreeMap::new(),
        }
    }

    pub fn jump_to(
        target_ref: impl Into<String>,
        context_overrides: BTreeMap<String, Value>,
    ) -> Self {
        TaskResult::JumpTo {
            target_ref: target_ref.into(),
            context_overrides,
        }
    }

    pub fn terminal(error: impl Into<String>) -> Self {
        TaskResult::Terminal {
            error: error.into(),
        }
    }
}

/// Raised (not returned) by a Task to signal the runtime should re-queue the
/// stage after a delay, without the Task itself tracking a retry counter.
#[derive(Debug, Error)]
#[error("transient task error, retry after {retry_after:?}: {message}")]
pub struct TransientError {
    pub retry_after: Duration,
    pub message: String,
}

impl TransientError {
    pub fn new(retry_after: Duration, message: impl Into<String>) -> Self {
        Self {
            retry_after,
            message: message.into(),
        }
    }
}

/// What a Task's `execute` returns: either a decided [`TaskResult`] or a
/// [`TransientError`] that unwinds to the runtime.
pub type TaskOutcome = Result<TaskResult, TransientError>;

#[cfg(test)]
#[path = "task_tests.rs"]
mod tests;
