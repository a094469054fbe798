// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! ImplementTask: runs a tool-calling coding agent scoped to the stage's
//! `owned_files`, instructed by the latest spec/acceptance criteria and
//! (on a repair jump back here) the accumulated failure summary.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde_json::{json, Value};

use forge_agent::{Agent, AgentConfig};
use forge_core::{Stage, TaskOutcome, TaskResult};
use forge_tools::AccessControl;

use crate::services::EngineServices;

fn owned_paths(stage: &Stage) -> Vec<PathBuf> {
    stage
        .context
        .get_string_vec("owned_files")
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

    let mut prompt = String::from("Implement the following acceptance criteria using the Read/Write/Edit/Bash tools.\n");
    if !criteria.is_empty() {
        prompt.push_str(&criteria);
        prompt.push('\n');
    }
    if let Some(summary) = stage.context.get_str("failure_summary") {
        prompt.push_str("\nPrevious attempt failed with:\n");
        prompt.push_str(summary);
    }
    prompt
}

pub async fn execute(stage: &Stage, services: &EngineServices) -> TaskOutcome {
    let project_root = stage
        .context
        .get_str("project_root")
        .map(PathBuf::from)
        .unwrap_or_else(|| services.project_root.clone());

    let owned = owned_paths(stage);
    let access = if owned.is_empty() {
        AccessControl::new()
    } else {
        AccessControl::new().with_owned_files(owned)
    };

    let config = AgentConfig::new(
        "implementer",
        "You write production code to satisfy the given acceptance criteria. \
         Only modify files you own. Never modify test files.",
        "primary",
    )
    .with_access(access);

    let mut agent = Agent::new(config, services.gateway.clone(), services.bus.clone(), project_root.clone(), Vec::new()).await;
    let prompt = build_prompt(stage);

    let response = match agent.run(&prompt).await {
        Ok(text) => text,
        Err(err) => {
            if let Some(transient) = crate::tasks::transient_from_agent_error(&err) {
                return Err(transient);
            }
            return Ok(TaskResult::failed_continue(format!("implementer agent failed: {err}")));
        }
    };

    let mut outputs = BTreeMap::new();
    outputs.insert("implementation_summary".to_string(), json!(response));
    outputs.insert("project_root".to_string(), json!(project_root.display().to_string()));
    Ok(TaskResult::success_with(outputs))
}

#[cfg(test)]
#[path = "implement_tests.rs"]
mod tests;
