// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The observability event carried by the event bus and the UDS socket.

use serde::{Deserialize, Serialize};

/// Discriminates the shape of an event's payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    /// A single-line message.
    Message,
    /// Start of a grouped block of output.
    BlockStart,
    /// One line within a grouped block.
    BlockLine,
    /// End of a grouped block.
    BlockEnd,
    /// Start of incremental (streamed) output.
    StreamStart,
    /// One token of incremental output.
    StreamToken,
    /// End of incremental output.
    StreamEnd,
}

/// An immutable observability event.
///
/// `code` is a four-letter taxonomy tag, e.g. `ATHK` (agent thinking),
/// `VFAL` (validate failed), `WSTG` (workflow stage start).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub kind: EventKind,
    pub code: String,
    pub timestamp: u64,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub message: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub label: String,
}

impl Event {
    pub fn new(kind: EventKind, code: impl Into<String>, timestamp_ms: u64) -> Self {
        Self {
            kind,
            code: code.into(),
            timestamp: timestamp_ms,
            message: String::new(),
            label: String::new(),
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    /// Compact wire representation used on the UDS socket: newline-delimited
    /// JSON with short field names (`k`, `c`, `t`, `m`, `l`); `m`/`l` omitted
    /// when empty.
    pub fn to_wire_json(&self) -> serde_json::Value {
        let mut obj = serde_json::Map::new();
        obj.insert("k".to_string(), serde_json::to_value(self.kind).unwrap_or(serde_json::Value::Null));
        obj.insert("c".to_string(), serde_json::Value::String(self.code.clone()));
        obj.insert("t".to_string(), serde_json::Value::from(self.timestamp));
        if !self.message.is_empty() {
            obj.insert("m".to_string(), serde_json::Value::String(self.message.clone()));
        }
        if !self.label.is_empty() {
            obj.insert("l".to_string(), serde_json::Value::String(self.label.clone()));
        }
        serde_json::Value::Object(obj)
    }
}

/// Well-known four-letter event codes used across the engine.
pub mod codes {
    pub const AGENT_THINKING: &str = "ATHK";
    pub const AGENT_TOOL_CALL: &str = "ATLC";
    pub const VALIDATE_FAILED: &str = "VFAL";
    pub const VALIDATE_PASSED: &str = "VPAS";
    pub const WORKFLOW_STAGE_START: &str = "WSTG";
    pub const WORKFLOW_STAGE_DONE: &str = "WDON";
    pub const WORKFLOW_JUMP: &str = "WJMP";
    pub const WORKFLOW_TERMINAL: &str = "WTRM";
    pub const REPAIR_ATTEMPT: &str = "RPAT";
    pub const QUALITY_SCORE: &str = "QSCR";
    pub const CIRCUIT_OPEN: &str = "COPN";
    pub const CIRCUIT_CLOSE: &str = "CCLS";
    pub const TOKEN_REFRESHED: &str = "TREF";
    pub const WATCHDOG_FINDING: &str = "WFND";
    pub const CONTEXT_TRIMMED: &str = "CTRM";
    pub const AGENT_IDLE_WARN: &str = "AIDW";
    pub const AGENT_IDLE_ABORT: &str = "AIDA";
    pub const AGENT_EMPTY_RESPONSE: &str = "AEMP";
    pub const AGENT_TURN: &str = "ATRN";
    pub const MUTATION_SCORE: &str = "MSCR";
}

#[cfg(test)]
#[path = "event_tests.rs"]
mod tests;
