// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The `Bash` tool: run a shell command under a timeout, returning
//! stdout/stderr/exit-code rather than raising on non-zero exit.

use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::process::Command;

use crate::error::ToolError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BashResult {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i32,
}

impl BashResult {
    /// Render as the combined text the LLM sees for this tool result.
    pub fn render(&self) -> String {
        let mut out = String::new();
        if !self.stdout.is_empty() {
            out.push_str(&self.stdout);
        }
        if !self.stderr.is_empty() {
            if !out.is_empty() {
                out.push('\n');
            }
            out.push_str("stderr:\n");
            out.push_str(&self.stderr);
        }
        out.push_str(&format!("\n[exit code: {}]", self.exit_code));
        out
    }
}

/// Run `command` via `bash -c`, optionally in `workdir`, bounded by `timeout`.
///
/// A non-zero exit code is a successful [`BashResult`], not an error — only
/// a timeout or a failure to spawn the shell itself is a [`ToolError`].
pub async fn run(command: &str, workdir: Option<&Path>, timeout: Duration) -> Result<BashResult, ToolError> {
    run_with_env(command, workdir, timeout, None).await
}

/// Same as [`run`], but replaces the child's environment with `env` when
/// given (e.g. a `PYTHONPATH` prepended for a `src/`-rooted test run).
pub async fn run_with_env(
    command: &str,
    workdir: Option<&Path>,
    timeout: Duration,
    env: Option<&HashMap<String, String>>,
) -> Result<BashResult, ToolError> {
    let mut cmd = Command::new("bash");
    cmd.arg("-c").arg(command);
    if let Some(dir) = workdir {
        cmd.current_dir(dir);
    }
    if let Some(env) = env {
        cmd.env_clear();
        cmd.envs(env);
    }

    match tokio::time::timeout(timeout, cmd.output()).await {
        Ok(Ok(output)) => Ok(BashResult {
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            exit_code: output.status.code().unwrap_or(-1),
        }),
        Ok(Err(e)) => Err(ToolError::Io(format!("failed to spawn bash: {e}"))),
        Err(_elapsed) => Err(ToolError::Timeout(format!(
            "command timed out after {}s",
            timeout.as_secs()
        ))),
    }
}

#[cfg(test)]
#[path = "bash_tests.rs"]
mod tests;
