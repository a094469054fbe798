// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! AgentHistory: the bounded ordered conversation the Agent Loop maintains.

use serde::{Deserialize, Serialize};

use crate::constants::MAX_HISTORY_MESSAGES;
use crate::tool::ToolCall;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    System,
    User,
    Assistant,
    Tool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<ToolCall>,
    /// Set on `Role::Tool` messages: the `id` of the `ToolCall` this is a result for.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
            tool_calls: Vec::new(),
            tool_call_id: None,
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
            tool_calls: Vec::new(),
            tool_call_id: None,
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
            tool_calls: Vec::new(),
            tool_call_id: None,
        }
    }

    pub fn assistant_with_tool_calls(content: impl Into<String>, tool_calls: Vec<ToolCall>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
            tool_calls,
            tool_call_id: None,
        }
    }

    pub fn tool_result(tool_call_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: Role::Tool,
            content: content.into(),
            tool_calls: Vec::new(),
            tool_call_id: Some(tool_call_id.into()),
        }
    }

    pub fn is_empty_assistant(&self) -> bool {
        self.role == Role::Assistant && self.content.is_empty() && self.tool_calls.is_empty()
    }
}

/// A bounded, ordered conversation.
///
/// Invariants (testable property 4): the first message is always the system
/// prompt; trimming drops oldest non-system messages first and never
/// removes the system message; after trimming, total length is
/// `<= limit + 1` (the `+1` accounts for the system message itself).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AgentHistory {
    messages: Vec<Message>,
    limit: usize,
}

impl AgentHistory {
    pub fn new(system_prompt: impl Into<String>) -> Self {
        Self {
            messages: vec![Message::system(system_prompt)],
            limit: MAX_HISTORY_MESSAGES,
        }
    }

    pub fn with_limit(system_prompt: impl Into<String>, limit: usize) -> Self {
        Self {
            messages: vec![Message::system(system_prompt)],
            limit,
        }
    }

    pub fn push(&mut self, message: Message) {
        self.messages.push(message);
        self.trim();
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Remove the last message if it is an empty assistant message (used by
    /// the empty-response retry path before re-issuing a turn).
    pub fn pop_if_empty_assistant(&mut self) {
        if self
            .messages
            .last()
            .map(Message::is_empty_assistant)
            .unwrap_or(false)
        {
            self.messages.pop();
        }
    }

    /// Drop oldest non-system messages until within `limit + 1` total
    /// (the `+1` is the system message, which is never dropped).
    fn trim(&mut self) {
        while self.messages.len() > self.limit + 1 {
            // index 0 is always system; the oldest non-system message is index 1.
            if self.messages.len() <= 1 {
                break;
            }
            self.messages.remove(1);
        }
    }
}

#[cfg(test)]
#[path = "agent_history_tests.rs"]
mod tests;
