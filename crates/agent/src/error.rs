// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Errors the Agent Loop can raise. Tool-level failures never reach this
//! type — they are rendered as text and fed back to the LLM instead.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AgentError {
    #[error("gateway error: {0}")]
    Gateway(#[from] forge_gateway::GatewayError),
}
