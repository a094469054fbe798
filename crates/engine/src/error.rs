// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Errors raised by the Workflow Runtime and its Stage Tasks.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("stage not found: {0}")]
    StageNotFound(String),
    #[error("unknown stage type: {0}")]
    UnknownStageType(String),
    #[error("workflow not found: {0}")]
    WorkflowNotFound(String),
    #[error("jump limit exceeded: {0} jumps")]
    JumpLimitExceeded(u32),
    #[error("storage error: {0}")]
    Storage(#[from] forge_storage::StorageError),
    #[error("gateway error: {0}")]
    Gateway(#[from] forge_gateway::GatewayError),
    #[error("agent error: {0}")]
    Agent(#[from] forge_agent::AgentError),
    #[error("tool error: {0}")]
    Tool(String),
    #[error("invalid plan output: {0}")]
    InvalidPlan(String),
}
