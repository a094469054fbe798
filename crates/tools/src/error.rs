// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Tool errors are never raised across the agent boundary — they are
//! rendered to a string and handed back to the LLM as the tool result, per
//! the taxonomy's "tool errors are reported back to the LLM, not raised"
//! rule. [`ToolError`] exists so the registry and its tests can still match
//! on a concrete variant before that string is built.

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ToolError {
    #[error("access denied: {0}")]
    AccessDenied(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("io error: {0}")]
    Io(String),

    #[error("bad arguments: {0}")]
    BadArguments(String),

    #[error("timed out: {0}")]
    Timeout(String),

    #[error("unknown tool: {0}")]
    UnknownTool(String),
}

impl ToolError {
    /// Render as the plain-text message the LLM sees in a `tool` message.
    pub fn to_tool_result(&self) -> String {
        format!("Error: {self}")
    }
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
