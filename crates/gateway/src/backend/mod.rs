// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-backend shape-request / consume-stream / error-classify function
//! tables. Each backend is a flat module of free functions rather than a
//! trait object — none of the three need dynamic dispatch, and the gateway
//! client already knows which module to call from `BackendKind`.

pub mod anthropic;
pub mod google;
pub mod ollama;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use forge_core::ToolCall;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendKind {
    Ollama,
    Anthropic,
    Google,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThinkingLevel {
    Off,
    Low,
    High,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolSpec {
    pub name: String,
    pub description: String,
    pub parameters: serde_json::Value,
}

/// A chunk of incremental stream output, dispatched to event emitters as it
/// arrives.
#[derive(Debug, Clone)]
pub enum StreamDelta {
    Content(String),
    Thinking(String),
    ToolCall(ToolCall),
}

/// Checked between stream chunks; a watchdog sets this to stop a hung read
/// without waiting for the underlying socket to time out.
#[derive(Clone, Default)]
pub struct AbortFlag(Arc<AtomicBool>);

impl AbortFlag {
    pub fn new() -> Self {
        Self(Arc::new(AtomicBool::new(false)))
    }

    pub fn abort(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_aborted(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// The aggregated result of consuming one streamed response.
#[derive(Debug, Clone, Default)]
pub struct AggregatedMessage {
    pub content: String,
    pub tool_calls: Vec<ToolCall>,
}
