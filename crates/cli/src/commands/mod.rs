// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Command handlers for the `forge` CLI.

pub mod auth_status;
pub mod develop;
pub mod init;
pub mod login;
pub mod logout;
pub mod loop_cmd;
pub mod plan;
pub mod resume;
pub mod run;
pub mod watch;

use forge_gateway::provider::{is_known_provider, PROVIDERS};

/// LLM backend selection, shared by every command that talks to the gateway.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum Provider {
    #[default]
    Claude,
    Google,
    Ollama,
}

impl Provider {
    pub fn as_str(self) -> &'static str {
        match self {
            Provider::Claude => "claude",
            Provider::Google => "google",
            Provider::Ollama => "ollama",
        }
    }
}

impl std::str::FromStr for Provider {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "claude" => Ok(Provider::Claude),
            "google" => Ok(Provider::Google),
            "ollama" => Ok(Provider::Ollama),
            other => anyhow::bail!("unknown provider '{other}', expected one of {:?}", PROVIDERS),
        }
    }
}

/// Parse a free-form provider string (used by `login`/`logout`, which accept
/// any provider name the token store recognizes, not just the gateway's
/// built-in three — consistent with [`is_known_provider`]).
pub fn parse_provider_name(s: &str) -> anyhow::Result<String> {
    if is_known_provider(s) {
        Ok(s.to_string())
    } else {
        anyhow::bail!("unknown provider '{s}', expected one of {:?}", PROVIDERS)
    }
}

/// Shared context every command handler gets: the resolved `--provider` and
/// whether `--headless` suppresses interactive prompts and live rendering.
pub struct Ctx {
    pub provider: Provider,
    pub headless: bool,
}

/// Error carrying an explicit process exit code, per the CLI's exit code
/// contract: 0 success, 1 configuration/auth error, 130 on SIGINT (handled
/// separately, in `main`, via a ctrl_c race).
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("{0}")]
    Config(String),
    #[error("{0}")]
    Auth(String),
}

impl CliError {
    pub fn exit_code(&self) -> i32 {
        1
    }
}

/// Resolve the home directory used for encrypted token storage and gateway
/// state. Centralized so every command asks the same way.
pub fn home_dir() -> anyhow::Result<std::path::PathBuf> {
    dirs::home_dir().ok_or_else(|| anyhow::anyhow!("could not determine home directory"))
}
