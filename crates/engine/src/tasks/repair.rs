// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! RepairTask: runs a coding agent scoped to the failing module's owned
//! files (never its tests) against the validation failure output, then
//! jumps back to ValidateTask (or QualityTask, for a quality-triggered
//! repair) for re-checking.

use std::path::{Path, PathBuf};

use serde_json::{json, Value};

use forge_agent::{Agent, AgentConfig};
use forge_core::{build_jump_overrides, Stage, TaskOutcome, TaskResult};
use forge_tools::AccessControl;

use crate::services::EngineServices;
use crate::tasks::increment_jump_count;

const MAX_SOURCE_BYTES: usize = 40_000;
const MAX_FAILURE_OUTPUT: usize = 6_000;
const MAX_SPEC_CONTEXT: usize = 3_000;

/// Truncate the middle of a string, keeping the head and tail — the part of
/// a failure log most likely to matter (the triggering assertion, and the
/// final error line) tends to sit at one end or the other.
fn truncate_middle(s: &str, limit: usize) -> String {
    if s.len() <= limit {
        return s.to_string();
    }
    let half = limit / 2;
    let head: String = s.chars().take(half).collect();
    let tail: String = s.chars().rev().take(half).collect::<Vec<_>>().into_iter().rev().collect();
    format!("{head}\n... [truncated] ...\n{tail}")
}

fn owned_or_discovered_files(stage: &Stage, project_root: &Path) -> Vec<String> {
    let owned = stage.context.get_string_vec("owned_files").unwrap_or_default();
    if !owned.is_empty() {
        return owned;
    }
    crate::tasks::validate_helpers::discover_source_files(project_root, &[".rs", ".py", ".go", ".ts", ".js"], &[])
}

fn build_prompt(stage: &Stage, project_root: &Path) -> String {
    let failure_type = stage.context.get_str("failure_type").unwrap_or("test");
    let mut parts = vec![format!(
        "The previous attempt failed a {failure_type} check. Fix only the files you own; \
         never modify test files."
    )];

    if let Some(raw_plan) = stage.context.get("ancestor_outputs").and_then(|v| v.get("plan")).and_then(Value::as_str) {
        let truncated: String = raw_plan.chars().take(MAX_SPEC_CONTEXT).collect();
        parts.push(format!("## Spec Context\n\n{truncated}"));
    }

    if let Some(criteria) = stage.context.get("acceptance_criteria").and_then(Value::as_array) {
        let joined = criteria.iter().filter_map(Value::as_str).collect::<Vec<_>>().join("\n");
        if !joined.is_empty() {
            parts.push(format!("## Acceptance Criteria\n\n{joined}"));
        }
    }

    let owned_files = owned_or_discovered_files(stage, project_root);
    let test_files = stage.context.get_string_vec("test_files").unwrap_or_default();
    let mut total_len = 0usize;
    let mut source_parts = Vec::new();
    for rel in &owned_files {
        if total_len >= MAX_SOURCE_BYTES {
            break;
        }
        let Ok(content) = std::fs::read_to_string(project_root.join(rel)) else {
            continue;
        };
        total_len += content.len();
        source_parts.push(format!("--- {rel} ---\n{content}"));
    }
    if !source_parts.is_empty() {
        parts.push(format!("## Source Files\n\n{}", source_parts.join("\n\n")));
    }

    let mut test_parts = Vec::new();
    for rel in &test_files {
        if total_len >= MAX_SOURCE_BYTES {
            break;
        }
        let Ok(content) = std::fs::read_to_string(project_root.join(rel)) else {
            continue;
        };
        total_len += content.len();
        test_parts.push(format!("--- {rel} ---\n{content}"));
    }
    if !test_parts.is_empty() {
        parts.push(format!("## Test Files (read-only, never modify)\n\n{}", test_parts.join("\n\n")));
    }

    if let Some(previous) = stage.context.get("previous_failures").and_then(Value::as_array) {
        let recent: Vec<String> = previous
            .iter()
            .rev()
            .take(3)
            .rev()
            .enumerate()
            .map(|(i, f)| format!("Attempt {}: {}", i + 1, f.get("summary").and_then(Value::as_str).unwrap_or_default()))
            .collect();
        if !recent.is_empty() {
            parts.push(format!("## Previous Repair Attempts\n\n{}", recent.join("\n\n")));
        }
    }

    let test_output = stage.context.get_str("test_output").unwrap_or_default();
    parts.push(format!("## Failure Output\n\n{}", truncate_middle(test_output, MAX_FAILURE_OUTPUT)));

    parts.join("\n\n")
}

pub async fn execute(stage: &Stage, services: &EngineServices) -> TaskOutcome {
    let project_root = stage
        .context
        .get_str("project_root")
        .map(PathBuf::from)
        .unwrap_or_else(|| services.project_root.clone());

    let owned_files: Vec<PathBuf> = stage.context.get_string_vec("owned_files").unwrap_or_default().into_iter().map(PathBuf::from).collect();
    let mut access = AccessControl::new().with_deny_test_patterns(true);
    if !owned_files.is_empty() {
        access = access.with_owned_files(owned_files);
    }

    let config = AgentConfig::new(
        "repairer",
        "You fix a failing test/lint/syntax check. Only modify files you own; \
         never modify test files, even if they appear broken.",
        "primary",
    )
    .with_access(access);

    let mut agent = Agent::new(config, services.gateway.clone(), services.bus.clone(), project_root.clone(), Vec::new()).await;
    let prompt = build_prompt(stage, &project_root);

    if let Err(err) = agent.run(&prompt).await {
        if let Some(transient) = crate::tasks::transient_from_agent_error(&err) {
            return Err(transient);
        }
        return Ok(TaskResult::terminal(format!("repair agent failed: {err}")));
    }

    let mut overrides = build_jump_overrides(&stage.context, [("_repair_requested".to_string(), json!(false))]);
    increment_jump_count(&mut overrides, &stage.context);

    let target = if stage.context.get_str("failure_type") == Some("quality") {
        stage.context.get_str("jump_quality_ref").unwrap_or("quality").to_string()
    } else {
        stage.context.get_str("jump_validate_ref").unwrap_or("validate").to_string()
    };
    Ok(TaskResult::jump_to(target, overrides))
}

#[cfg(test)]
#[path = "repair_tests.rs"]
mod tests;
