// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Engine-wide numeric defaults.
//!
//! Kept in one module per the design notes: the source this system was
//! distilled from scattered these across several files, which made the
//! invariants in the testable-properties section hard to audit. Every value
//! here is overridable via [`crate::config::EngineConfig`].

/// Default cap on `_jump_count` before the runtime forces a terminal transition.
pub const MAX_JUMPS: u32 = 50;

/// Default cap on `repair_attempt` before escalating to reimplementation.
pub const MAX_REPAIR_ATTEMPTS: u32 = 5;

/// Default cap on `reimplementation_count` before accepting partial results.
pub const MAX_REIMPLEMENTATIONS: u32 = 2;

/// Agent history is trimmed once it exceeds this many messages (system message excluded
/// from the count per invariant 4: total length after trim is `<= MAX_HISTORY_MESSAGES + 1`).
pub const MAX_HISTORY_MESSAGES: usize = 40;

/// Tool results longer than this are middle-truncated before returning to the LLM.
pub const TOOL_RESULT_TRUNCATION_LIMIT: usize = 8_000;

/// Consecutive turns with no write-tool call before a warning is emitted.
pub const IDLE_WARN_THRESHOLD: u32 = 5;

/// Consecutive turns with no write-tool call before the agent loop aborts.
pub const IDLE_HARD_THRESHOLD: u32 = 10;

/// Empty structurally-valid LLM responses are retried up to this many times per turn.
pub const EMPTY_RESPONSE_MAX_RETRIES: u32 = 2;

/// In-process event bus: bounded replay ring buffer for late subscribers.
pub const REPLAY_BUFFER_SIZE: usize = 100;

/// In-process event bus: per-subscriber bounded queue depth (drop-on-full).
pub const SUBSCRIBER_QUEUE_CAPACITY: usize = 10_000;

/// Consecutive LLM call failures before a model's circuit opens.
pub const CIRCUIT_FAILURE_THRESHOLD: u32 = 5;

/// Context-window guard trims history once estimated usage exceeds this fraction.
pub const CONTEXT_WINDOW_GUARD_FRACTION: f64 = 0.90;

/// Heuristic bytes-per-token used to estimate message size for the context-window guard.
pub const BYTES_PER_TOKEN_ESTIMATE: usize = 4;

/// Token refresh fires when time-to-expiry drops below this margin.
pub const TOKEN_REFRESH_MARGIN_SECS: u64 = 300;

/// Default subprocess timeout.
pub const SUBPROCESS_TIMEOUT_SECS: u64 = 120;

/// TCP connect timeout for the LLM gateway.
pub const TCP_CONNECT_TIMEOUT_SECS: u64 = 10;

/// Minimum quality-gate threshold, inclusive.
pub const QUALITY_THRESHOLD_MIN: f64 = 0.1;

/// Maximum quality-gate threshold, inclusive.
pub const QUALITY_THRESHOLD_MAX: f64 = 1.0;

/// Default watchdog max runtime before it stops on its own.
pub const WATCHDOG_MAX_RUNTIME_SECS: u64 = 2 * 60 * 60;

/// Number of identical consecutive failure summaries before ValidateTask escalates
/// straight to reimplementation instead of repeating repair.
pub const REPEATED_FAILURE_ESCALATION_THRESHOLD: u32 = 3;

/// Default cap on `quality_attempt` before QualityTask accepts a partial result
/// rather than jumping back to repair again.
pub const MAX_QUALITY_ATTEMPTS: u32 = 3;
