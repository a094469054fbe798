// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! ValidateTask: runs syntax check, lint, and tests in sequence, scoped to
//! the stage's owned files. On any failure it builds a repair jump,
//! carrying forward the accumulated failure history; once
//! `REPEATED_FAILURE_ESCALATION_THRESHOLD` identical failures or
//! `max_repair_attempts` have been reached it jumps to reimplementation
//! instead of repeating repair.

use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;
use std::time::Duration;

use serde_json::{json, Value};

use forge_core::constants::REPEATED_FAILURE_ESCALATION_THRESHOLD;
use forge_core::{build_jump_overrides, codes, Event, EventKind, Stage, TaskOutcome, TaskResult};
use forge_tools::bash;

use crate::lang::{detect_language, get_profile, Language, LanguageProfile};
use crate::services::EngineServices;
use crate::tasks::{increment_jump_count, validate_helpers as helpers};

const TEST_OUTPUT_LIMIT: usize = 4_000;

struct RunOutcome {
    failure_type: Option<&'static str>,
    output: String,
}

async fn run_one(cmd: &str, project_root: &std::path::Path, timeout: Duration, env: &HashMap<String, String>) -> (i32, String) {
    match helpers::parse_command(cmd) {
        helpers::ParsedCommand::Shell(s) => match bash::run_with_env(&s, Some(project_root), timeout, Some(env)).await {
            Ok(r) => (r.exit_code, r.render()),
            Err(err) => (1, err.to_string()),
        },
        helpers::ParsedCommand::Argv(parts) => {
            let joined = parts.join(" ");
            match bash::run_with_env(&joined, Some(project_root), timeout, Some(env)).await {
                Ok(r) => (r.exit_code, r.render()),
                Err(err) => (1, err.to_string()),
            }
        }
    }
}

/// Strip `owned_files` entries that no longer exist on disk (a module's
/// ownership list can go stale across a repair/reimplementation cycle), and
/// substitute discovered non-test source files if every entry went stale.
fn resolve_owned_files(project_root: &std::path::Path, owned_files: Option<Vec<String>>, profile: &LanguageProfile) -> Option<Vec<String>> {
    let owned = owned_files?;
    let existing: Vec<String> = owned.into_iter().filter(|f| helpers::file_exists_relative(project_root, f)).collect();
    if !existing.is_empty() {
        return Some(existing);
    }
    let discovered = helpers::discover_source_files(project_root, profile.extensions, profile.skip_dirs);
    if discovered.is_empty() {
        None
    } else {
        Some(discovered)
    }
}

pub async fn execute(stage: &Stage, services: &EngineServices) -> TaskOutcome {
    let project_root = stage
        .context
        .get_str("project_root")
        .map(PathBuf::from)
        .unwrap_or_else(|| services.project_root.clone());

    let repair_attempt = stage.context.get_u32("repair_attempt").unwrap_or(0);
    let max_attempts = services.config.max_repair_attempts;
    let reimpl_count = stage.context.get_u32("reimplementation_count").unwrap_or(0);
    let max_reimpl = services.config.max_reimplementations;

    if !crate::tasks::check_jump_limit(&stage.context, services.config.max_jumps) {
        let mut outputs = BTreeMap::new();
        outputs.insert("tests_passed".to_string(), json!(false));
        outputs.insert("jump_limit_reached".to_string(), json!(true));
        return Ok(TaskResult::FailedContinue {
            error: "jump limit exceeded before validation could run".to_string(),
            outputs,
        });
    }

    let language = stage
        .context
        .get_str("language_profile")
        .and_then(|s| match s {
            "rust" => Some(Language::Rust),
            "python" => Some(Language::Python),
            "go" => Some(Language::Go),
            "typescript" => Some(Language::TypeScript),
            "javascript" => Some(Language::JavaScript),
            _ => None,
        })
        .unwrap_or_else(|| detect_language(&project_root));
    let profile = get_profile(language);

    let owned_files = resolve_owned_files(&project_root, stage.context.get_string_vec("owned_files"), profile);
    let test_files = stage.context.get_string_vec("test_files").unwrap_or_default();
    let test_files = if test_files.is_empty() {
        let all = helpers::discover_test_files(&project_root, profile.extensions, profile.skip_dirs);
        match &owned_files {
            Some(owned) => helpers::derive_module_test_files(&all, owned),
            None => all,
        }
    } else {
        test_files
    };

    let timeout = Duration::from_secs(services.config.subprocess_timeout_secs);
    let env = helpers::build_test_env(&project_root, profile.source_roots, profile.path_env_var);

    if let Some(syntax_cmd) = profile.syntax_check_command {
        let (rc, output) = run_one(syntax_cmd, &project_root, timeout, &env).await;
        if rc != 0 {
            return handle_failure(stage, services, RunOutcome { failure_type: Some("syntax"), output }, repair_attempt, max_attempts, reimpl_count, max_reimpl).await;
        }
    }

    for &lint_cmd in profile.lint_check_commands {
        let (rc, raw_output) = run_one(lint_cmd, &project_root, timeout, &env).await;
        let filtered = helpers::filter_test_file_lint(&raw_output, owned_files.as_deref());
        if rc != 0 && !filtered.trim().is_empty() {
            return handle_failure(stage, services, RunOutcome { failure_type: Some("lint"), output: filtered }, repair_attempt, max_attempts, reimpl_count, max_reimpl).await;
        }
    }

    let test_cmd = if test_files.is_empty() {
        profile.test_command.to_string()
    } else {
        helpers::scope_test_command(profile.test_command, &test_files)
    };
    let (rc, output) = run_one(&test_cmd, &project_root, timeout, &env).await;
    if rc != 0 {
        return handle_failure(stage, services, RunOutcome { failure_type: Some("test"), output }, repair_attempt, max_attempts, reimpl_count, max_reimpl).await;
    }

    let total_tests = helpers::count_tests(&output);
    services.bus.publish(Event::new(EventKind::Message, codes::VALIDATE_PASSED, services.now_ms()).with_message(format!("{total_tests} tests")));
    let mut outputs = BTreeMap::new();
    outputs.insert("tests_passed".to_string(), json!(true));
    outputs.insert("test_output".to_string(), json!(truncate(&output, TEST_OUTPUT_LIMIT)));
    outputs.insert("total_tests".to_string(), json!(total_tests));
    outputs.insert("repair_attempts_used".to_string(), json!(repair_attempt));
    Ok(TaskResult::success_with(outputs))
}

fn truncate(s: &str, limit: usize) -> String {
    if s.len() <= limit {
        s.to_string()
    } else {
        s.chars().take(limit).collect()
    }
}

async fn handle_failure(
    stage: &Stage,
    services: &EngineServices,
    outcome: RunOutcome,
    attempt: u32,
    max_attempts: u32,
    reimpl_count: u32,
    max_reimpl: u32,
) -> TaskOutcome {
    services.bus.publish(
        Event::new(EventKind::Message, codes::VALIDATE_FAILED, services.now_ms())
            .with_message(outcome.failure_type.unwrap_or("unknown").to_string()),
    );
    let summary = truncate(&outcome.output, 500);
    let mut previous_failures = stage
        .context
        .get("previous_failures")
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default();

    let repeated = previous_failures
        .iter()
        .rev()
        .take(REPEATED_FAILURE_ESCALATION_THRESHOLD as usize)
        .all(|f| f.get("summary").and_then(Value::as_str) == Some(summary.as_str()))
        && previous_failures.len() as u32 >= REPEATED_FAILURE_ESCALATION_THRESHOLD;

    previous_failures.push(json!({"summary": summary, "failure_type": outcome.failure_type}));

    if repeated || attempt >= max_attempts {
        if reimpl_count < max_reimpl {
            return jump_to_reimplementation(stage, &previous_failures, reimpl_count);
        }
        let mut outputs = BTreeMap::new();
        outputs.insert("tests_passed".to_string(), json!(false));
        outputs.insert("repeated_failure".to_string(), json!(true));
        return Ok(TaskResult::FailedContinue {
            error: format!("validation exhausted after {attempt} repair attempts: {summary}"),
            outputs,
        });
    }

    let mut overrides = build_jump_overrides(&stage.context, [
        ("_repair_requested".to_string(), json!(true)),
        ("test_output".to_string(), json!(outcome.output)),
        ("tests_passed".to_string(), json!(false)),
        ("previous_failures".to_string(), Value::Array(previous_failures.iter().rev().take(5).rev().cloned().collect())),
        ("failure_type".to_string(), json!(outcome.failure_type)),
    ]);
    increment_jump_count(&mut overrides, &stage.context);
    // repair_attempt is set after the propagation copy so a stale copied
    // value from stage.context can't clobber the increment.
    overrides.insert("repair_attempt".to_string(), json!(attempt + 1));

    let target = stage.context.get_str("jump_repair_ref").unwrap_or("repair").to_string();
    Ok(TaskResult::jump_to(target, overrides))
}

fn jump_to_reimplementation(stage: &Stage, previous_failures: &[Value], reimpl_count: u32) -> TaskOutcome {
    let failure_summary = previous_failures
        .iter()
        .enumerate()
        .map(|(i, f)| format!("Attempt {}: {}", i + 1, f.get("summary").and_then(Value::as_str).unwrap_or_default()))
        .collect::<Vec<_>>()
        .join("\n\n");

    let mut overrides = build_jump_overrides(&stage.context, [
        ("previous_test_failures".to_string(), Value::Array(previous_failures.to_vec())),
        ("failure_summary".to_string(), json!(failure_summary)),
    ]);
    increment_jump_count(&mut overrides, &stage.context);
    overrides.insert("repair_attempt".to_string(), json!(0));
    overrides.insert("reimplementation_count".to_string(), json!(reimpl_count + 1));
    overrides.insert("previous_failures".to_string(), json!(Vec::<Value>::new()));

    let target = stage.context.get_str("jump_implement_ref").unwrap_or("implement").to_string();
    Ok(TaskResult::jump_to(target, overrides))
}

#[cfg(test)]
#[path = "validate_tests.rs"]
mod tests;
