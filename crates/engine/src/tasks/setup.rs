// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! SetupTask: runs the planner's setup commands (or an `init_project`
//! fallback for an empty workspace) before any code gets written.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

use serde_json::{json, Value};

use forge_core::{Stage, TaskOutcome, TaskResult};
use forge_tools::{bash, project};

use crate::services::EngineServices;

const SETUP_TIMEOUT_SECS: u64 = 120;

async fn run_setup_command(cmd: &str, cwd: &std::path::Path) -> (i32, String) {
    match bash::run(cmd, Some(cwd), Duration::from_secs(SETUP_TIMEOUT_SECS)).await {
        Ok(result) => (result.exit_code, result.render()),
        Err(forge_tools::ToolError::Timeout(msg)) => (124, msg),
        Err(err) => (1, err.to_string()),
    }
}

pub async fn execute(stage: &Stage, services: &EngineServices) -> TaskOutcome {
    let project_root = stage
        .context
        .get_str("project_root")
        .map(PathBuf::from)
        .unwrap_or_else(|| services.project_root.clone());

    let commands = stage.context.get_string_vec("setup_commands").unwrap_or_default();

    if !project_root.exists() || std::fs::read_dir(&project_root).map(|mut d| d.next().is_none()).unwrap_or(true) {
        if let Err(err) = project::init_project(&project_root, Duration::from_secs(SETUP_TIMEOUT_SECS)).await {
            return Ok(TaskResult::failed_continue(format!("failed to initialize project: {err}")));
        }
    }

    let mut outputs_log = Vec::new();
    for cmd in &commands {
        let (exit_code, output) = run_setup_command(cmd, &project_root).await;
        outputs_log.push(json!({"command": cmd, "exit_code": exit_code, "output": output}));
        if exit_code != 0 {
            let mut outputs = BTreeMap::new();
            outputs.insert("setup_log".to_string(), Value::Array(outputs_log));
            outputs.insert("failed_command".to_string(), json!(cmd));
            return Ok(TaskResult::FailedContinue {
                error: format!("setup command failed: {cmd} (exit {exit_code})"),
                outputs,
            });
        }
    }

    let mut outputs = BTreeMap::new();
    outputs.insert("setup_log".to_string(), Value::Array(outputs_log));
    outputs.insert("project_root".to_string(), json!(project_root.display().to_string()));
    Ok(TaskResult::success_with(outputs))
}

#[cfg(test)]
#[path = "setup_tests.rs"]
mod tests;
