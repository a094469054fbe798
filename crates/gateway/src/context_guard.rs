// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Context-window guard: trims outgoing messages when the estimated token
//! count would overrun a model's known context window.

use forge_core::constants::{BYTES_PER_TOKEN_ESTIMATE, CONTEXT_WINDOW_GUARD_FRACTION};
use forge_core::Message;

/// Heuristic token estimate: total content bytes across all messages,
/// divided by [`BYTES_PER_TOKEN_ESTIMATE`].
pub fn estimate_tokens(messages: &[Message]) -> usize {
    let bytes: usize = messages.iter().map(|m| m.content.len()).sum();
    bytes / BYTES_PER_TOKEN_ESTIMATE
}

/// Whether `messages` should be trimmed before sending to a model whose
/// context window is `context_window` tokens.
pub fn exceeds_guard(messages: &[Message], context_window: usize) -> bool {
    let threshold = (context_window as f64 * CONTEXT_WINDOW_GUARD_FRACTION) as usize;
    estimate_tokens(messages) > threshold
}

/// Trim `messages` in place to fit under the guard threshold: the system
/// message (index 0, if present) and the last non-system message are always
/// preserved; oldest non-system messages are dropped first. Returns `true`
/// if any message was dropped.
pub fn trim_to_guard(messages: &mut Vec<Message>, context_window: usize) -> bool {
    if messages.len() <= 2 {
        return false;
    }
    let mut trimmed = false;
    while messages.len() > 2 && exceeds_guard(messages, context_window) {
        messages.remove(1);
        trimmed = true;
    }
    trimmed
}

#[cfg(test)]
#[path = "context_guard_tests.rs"]
mod tests;
