// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Construction-time configuration for an [`crate::agent::Agent`].

use std::time::Duration;

use forge_tools::AccessControl;

/// Per-turn LLM call timeout, halved against the remaining wall-clock
/// budget on each turn so a single slow turn can't eat the whole run.
pub const DEFAULT_PER_TURN_TIMEOUT_SECS: u64 = 120;

pub const DEFAULT_MAX_TURNS: u32 = 20;

pub struct AgentConfig {
    pub name: String,
    pub system_prompt: String,
    pub model: String,
    pub max_turns: u32,
    pub per_turn_timeout: Duration,
    pub timeout: Option<Duration>,
    pub interactive: bool,
    pub allowed_tools: Option<Vec<String>>,
    pub access: AccessControl,
}

impl AgentConfig {
    pub fn new(name: impl Into<String>, system_prompt: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            system_prompt: system_prompt.into(),
            model: model.into(),
            max_turns: DEFAULT_MAX_TURNS,
            per_turn_timeout: Duration::from_secs(DEFAULT_PER_TURN_TIMEOUT_SECS),
            timeout: None,
            interactive: false,
            allowed_tools: None,
            access: AccessControl::new(),
        }
    }

    pub fn with_max_turns(mut self, max_turns: u32) -> Self {
        self.max_turns = max_turns;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_interactive(mut self, interactive: bool) -> Self {
        self.interactive = interactive;
        self
    }

    pub fn with_allowed_tools(mut self, allowed_tools: Vec<String>) -> Self {
        self.allowed_tools = Some(allowed_tools);
        self
    }

    pub fn with_access(mut self, access: AccessControl) -> Self {
        self.access = access;
        self
    }
}
