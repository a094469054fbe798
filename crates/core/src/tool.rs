// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! ToolCall and the truncation helper every tool result passes through
//! before it is shown back to the LLM.

use serde::{Deserialize, Serialize};

use crate::constants::TOOL_RESULT_TRUNCATION_LIMIT;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    pub id: String,
    pub name: String,
    pub arguments_json: String,
}

/// Middle-truncate `text` to at most `limit` characters, inserting a marker
/// so the LLM knows content was elided. Text at or under the limit is
/// returned unchanged (testable property: boundary at the limit).
pub fn truncate_tool_result(text: &str, limit: usize) -> String {
    if text.chars().count() <= limit {
        return text.to_string();
    }
    let marker = "\n...[truncated]...\n";
    let budget = limit.saturating_sub(marker.chars().count());
    let head_len = budget / 2;
    let tail_len = budget - head_len;

    let chars: Vec<char> = text.chars().collect();
    let head: String = chars[..head_len].iter().collect();
    let tail: String = chars[chars.len() - tail_len..].iter().collect();
    format!("{head}{marker}{tail}")
}

/// Truncate using the engine-wide default limit.
pub fn truncate_tool_result_default(text: &str) -> String {
    truncate_tool_result(text, TOOL_RESULT_TRUNCATION_LIMIT)
}

#[cfg(test)]
#[path = "tool_tests.rs"]
mod tests;
