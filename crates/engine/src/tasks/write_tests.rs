// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! WriteTestsTask: runs before ImplementTask so tests are written against
//! the acceptance criteria first, scoped to the stage's `test_files`
//! (never the implementation files it doesn't own).

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde_json::{json, Value};

use forge_agent::{Agent, AgentConfig};
use forge_core::{Stage, TaskOutcome, TaskResult};
use forge_tools::AccessControl;

use crate::services::EngineServices;

fn test_paths(stage: &Stage) -> Vec<PathBuf> {
    stage
        .context
        .get_string_vec("test_files")
        .unwrap_or_default()
        .into_iter()
        .map(PathBuf::from)
        .collect()
}

fn build_prompt(stage: &Stage) -> String {
    let criteria = stage
        .context
        .get("acceptance_criteria")
        .and_then(Value::as_array)
        .map(|arr| arr.iter().filter_map(Value::as_str).collect::<Vec<_>>().join("\n"))
        .unwrap_or_default();

    let mut prompt = String::from(
        "Write tests that encode the following acceptance criteria. \
         Do not implement the feature itself.\n",
    );
    prompt.push_str(&criteria);
    prompt
}

pub async fn execute(stage: &Stage, services: &EngineServices) -> TaskOutcome {
    let project_root = stage
        .context
        .get_str("project_root")
        .map(PathBuf::from)
        .unwrap_or_else(|| services.project_root.clone());

    let owned = test_paths(stage);
    let access = if owned.is_empty() {
        AccessControl::new()
    } else {
        AccessControl::new().with_owned_files(owned)
    };

    let config = AgentConfig::new(
        "test-writer",
        "You write tests that encode acceptance criteria before any implementation exists. \
         Only modify the test files you own.",
        "primary",
    )
    .with_access(access);

    let mut agent = Agent::new(config, services.gateway.clone(), services.bus.clone(), project_root.clone(), Vec::new()).await;
    let prompt = build_prompt(stage);

    let response = match agent.run(&prompt).await {
        Ok(text) => text,
        Err(err) => return Ok(TaskResult::failed_continue(format!("test-writer agent failed: {err}"))),
    };

    let mut outputs = BTreeMap::new();
    outputs.insert("tests_written_summary".to_string(), json!(response));
    Ok(TaskResult::success_with(outputs))
}

#[cfg(test)]
#[path = "write_tests_tests.rs"]
mod tests;
