// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Maps the CLI's `--provider` selection to the `"primary"` model's
//! [`ModelConfig`], loading whatever token `login` has stashed in the
//! [`TokenStore`] for that provider.

use std::time::Duration;

use crate::backend::{BackendKind, ThinkingLevel};
use crate::client::ModelConfig;
use crate::error::GatewayError;
use crate::token_store::TokenStore;

/// Registration key every Stage Task calls the gateway with.
pub const PRIMARY_MODEL: &str = "primary";

/// Provider slugs accepted by `--provider` and `login`/`logout`.
pub const PROVIDERS: &[&str] = &["claude", "google", "ollama"];

pub fn is_known_provider(provider: &str) -> bool {
    PROVIDERS.contains(&provider)
}

const DEFAULT_CALL_TIMEOUT_SECS: u64 = 120;
const DEFAULT_HALF_OPEN_AFTER_SECS: u64 = 30;

/// Build the `"primary"` [`ModelConfig`] for `provider`. Base URL and wire
/// model id are overridable via environment variables so a local proxy or a
/// pinned model version can be swapped in without code changes.
pub fn model_config_for(provider: &str, token_store: &TokenStore) -> Result<ModelConfig, GatewayError> {
    let token = token_store.load(provider)?.map(|t| t.access_token);

    let (backend, base_url_env, base_url_default, model_env, model_default, context_window) = match provider {
        "claude" => (
            BackendKind::Anthropic,
            "FORGE_CLAUDE_BASE_URL",
            "https://api.anthropic.com",
            "FORGE_CLAUDE_MODEL",
            "claude-opus-4-6-20260115",
            Some(200_000),
        ),
        "google" => (
            BackendKind::Google,
            "FORGE_GOOGLE_BASE_URL",
            "https://generativelanguage.googleapis.com",
            "FORGE_GOOGLE_MODEL",
            "gemini-2.5-pro",
            Some(1_000_000),
        ),
        "ollama" => (
            BackendKind::Ollama,
            "FORGE_OLLAMA_BASE_URL",
            "http://localhost:11434",
            "FORGE_OLLAMA_MODEL",
            "llama3",
            None,
        ),
        other => return Err(GatewayError::TokenStore(format!("unknown provider: {other}"))),
    };

    Ok(ModelConfig {
        model_name: PRIMARY_MODEL.to_string(),
        wire_model: std::env::var(model_env).unwrap_or_else(|_| model_default.to_string()),
        base_url: std::env::var(base_url_env).unwrap_or_else(|_| base_url_default.to_string()),
        backend,
        auth_header_name: None,
        auth_token: token,
        provider_name: Some(provider.to_string()),
        fallback_models: Vec::new(),
        thinking_level: ThinkingLevel::Off,
        timeout: Duration::from_secs(DEFAULT_CALL_TIMEOUT_SECS),
        context_window,
        half_open_after: Duration::from_secs(DEFAULT_HALF_OPEN_AFTER_SECS),
    })
}

#[cfg(test)]
#[path = "provider_tests.rs"]
mod tests;
