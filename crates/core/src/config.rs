// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Layered engine configuration.
//!
//! Resolution order, lowest to highest priority: built-in defaults (see
//! [`crate::constants`]), `<project_root>/.forge/config.toml`, then
//! environment variables (`FORGE_<FIELD>`). Each layer only overrides the
//! fields it sets.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::constants;

/// Resolved, effective configuration for one engine instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub max_jumps: u32,
    pub max_repair_attempts: u32,
    pub max_reimplementations: u32,
    pub max_history_messages: usize,
    pub tool_result_truncation_limit: usize,
    pub idle_warn_threshold: u32,
    pub idle_hard_threshold: u32,
    pub empty_response_max_retries: u32,
    pub circuit_failure_threshold: u32,
    pub token_refresh_margin_secs: u64,
    pub subprocess_timeout_secs: u64,
    pub watchdog_max_runtime_secs: u64,
    pub auto_retry_max_cycles: u32,
    pub max_quality_attempts: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_jumps: constants::MAX_JUMPS,
            max_repair_attempts: constants::MAX_REPAIR_ATTEMPTS,
            max_reimplementations: constants::MAX_REIMPLEMENTATIONS,
            max_history_messages: constants::MAX_HISTORY_MESSAGES,
            tool_result_truncation_limit: constants::TOOL_RESULT_TRUNCATION_LIMIT,
            idle_warn_threshold: constants::IDLE_WARN_THRESHOLD,
            idle_hard_threshold: constants::IDLE_HARD_THRESHOLD,
            empty_response_max_retries: constants::EMPTY_RESPONSE_MAX_RETRIES,
            circuit_failure_threshold: constants::CIRCUIT_FAILURE_THRESHOLD,
            token_refresh_margin_secs: constants::TOKEN_REFRESH_MARGIN_SECS,
            subprocess_timeout_secs: constants::SUBPROCESS_TIMEOUT_SECS,
            watchdog_max_runtime_secs: constants::WATCHDOG_MAX_RUNTIME_SECS,
            auto_retry_max_cycles: 10,
            max_quality_attempts: constants::MAX_QUALITY_ATTEMPTS,
        }
    }
}

/// Partial override layer as read from `config.toml`; every field optional so
/// an absent key falls through to the layer below it.
#[derive(Debug, Clone, Default, Deserialize)]
struct ConfigFile {
    max_jumps: Option<u32>,
    max_repair_attempts: Option<u32>,
    max_reimplementations: Option<u32>,
    max_history_messages: Option<usize>,
    tool_result_truncation_limit: Option<usize>,
    idle_warn_threshold: Option<u32>,
    idle_hard_threshold: Option<u32>,
    empty_response_max_retries: Option<u32>,
    circuit_failure_threshold: Option<u32>,
    token_refresh_margin_secs: Option<u64>,
    subprocess_timeout_secs: Option<u64>,
    watchdog_max_runtime_secs: Option<u64>,
    auto_retry_max_cycles: Option<u32>,
    max_quality_attempts: Option<u32>,
}

impl EngineConfig {
    /// Load the effective config for `project_root`, applying the file and
    /// then environment-variable layers over the defaults.
    pub fn load(project_root: &Path) -> Self {
        let mut cfg = Self::default();
        cfg.apply_file(&project_root.join(".forge").join("config.toml"));
        cfg.apply_env();
        cfg
    }

    fn apply_file(&mut self, path: &Path) {
        let Ok(content) = std::fs::read_to_string(path) else {
            return;
        };
        let Ok(file) = toml::from_str::<ConfigFile>(&content) else {
            return;
        };
        macro_rules! take {
            ($field:ident) => {
                if let Some(v) = file.$field {
                    self.$field = v;
                }
            };
        }
        take!(max_jumps);
        take!(max_repair_attempts);
        take!(max_reimplementations);
        take!(max_history_messages);
        take!(tool_result_truncation_limit);
        take!(idle_warn_threshold);
        take!(idle_hard_threshold);
        take!(empty_response_max_retries);
        take!(circuit_failure_threshold);
        take!(token_refresh_margin_secs);
        take!(subprocess_timeout_secs);
        take!(watchdog_max_runtime_secs);
        take!(auto_retry_max_cycles);
        take!(max_quality_attempts);
    }

    fn apply_env(&mut self) {
        macro_rules! take_env {
            ($field:ident, $name:literal) => {
                if let Ok(raw) = std::env::var($name) {
                    if let Ok(parsed) = raw.parse() {
                        self.$field = parsed;
                    }
                }
            };
        }
        take_env!(max_jumps, "FORGE_MAX_JUMPS");
        take_env!(max_repair_attempts, "FORGE_MAX_REPAIR_ATTEMPTS");
        take_env!(max_reimplementations, "FORGE_MAX_REIMPLEMENTATIONS");
        take_env!(max_history_messages, "FORGE_MAX_HISTORY_MESSAGES");
        take_env!(
            tool_result_truncation_limit,
            "FORGE_TOOL_RESULT_TRUNCATION_LIMIT"
        );
        take_env!(idle_warn_threshold, "FORGE_IDLE_WARN_THRESHOLD");
        take_env!(idle_hard_threshold, "FORGE_IDLE_HARD_THRESHOLD");
        take_env!(
            empty_response_max_retries,
            "FORGE_EMPTY_RESPONSE_MAX_RETRIES"
        );
        take_env!(circuit_failure_threshold, "FORGE_CIRCUIT_FAILURE_THRESHOLD");
        take_env!(
            token_refresh_margin_secs,
            "FORGE_TOKEN_REFRESH_MARGIN_SECS"
        );
        take_env!(subprocess_timeout_secs, "FORGE_SUBPROCESS_TIMEOUT_SECS");
        take_env!(
            watchdog_max_runtime_secs,
            "FORGE_WATCHDOG_MAX_RUNTIME_SECS"
        );
        take_env!(auto_retry_max_cycles, "FORGE_AUTO_RETRY_MAX_CYCLES");
        take_env!(max_quality_attempts, "FORGE_MAX_QUALITY_ATTEMPTS");
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
