// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! QualityTask: runs the five scored pillars concurrently plus the
//! completeness gate, assembles a [`crate::quality::QualityReport`], and
//! either succeeds, jumps back to repair with the report's issues as
//! context for the next repair attempt, or — once `max_quality_attempts`
//! is reached or the score has stopped improving across attempts — accepts
//! the current state as a partial pass rather than looping forever.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde_json::{json, Value};

use forge_core::{build_jump_overrides, codes, Event, EventKind, Stage, TaskOutcome, TaskResult};

use crate::lang::{detect_language, get_profile};
use crate::quality::QualityReport;
use crate::services::EngineServices;
use crate::tasks::increment_jump_count;
use crate::validators;

/// A repeat attempt whose score improves by less than this over the
/// previous attempt is treated as stagnant.
const STAGNATION_EPSILON: f64 = 0.01;

/// Whether a failing quality report should be accepted as a partial pass
/// instead of jumping back to repair again, and why. `None` means retry.
fn partial_accept_reason(score: f64, quality_attempt: u32, max_attempts: u32, previous_score: Option<f64>) -> Option<&'static str> {
    if quality_attempt + 1 >= max_attempts {
        return Some("quality attempt limit reached");
    }
    if previous_score.map(|prev| score <= prev + STAGNATION_EPSILON).unwrap_or(false) {
        return Some("score stopped improving across repair attempts");
    }
    None
}

pub async fn execute(stage: &Stage, services: &EngineServices) -> TaskOutcome {
    let project_root = stage
        .context
        .get_str("project_root")
        .map(PathBuf::from)
        .unwrap_or_else(|| services.project_root.clone());

    let language = stage
        .context
        .get_str("language_profile")
        .and_then(|s| match s {
            "rust" => Some(crate::lang::Language::Rust),
            "python" => Some(crate::lang::Language::Python),
            "go" => Some(crate::lang::Language::Go),
            "typescript" => Some(crate::lang::Language::TypeScript),
            "javascript" => Some(crate::lang::Language::JavaScript),
            _ => None,
        })
        .unwrap_or_else(|| detect_language(&project_root));
    let profile = get_profile(language);

    let threshold = stage
        .context
        .get("plan_config")
        .and_then(|v| v.get("quality_threshold"))
        .and_then(Value::as_f64)
        .unwrap_or(crate::quality::PASS_SCORE_THRESHOLD);

    let coverage_threshold = 0.8;
    let max_warnings = 20;

    let mutation_score = stage
        .context
        .get("ancestor_outputs")
        .and_then(|v| v.get("mutation"))
        .and_then(|v| v.get("mutation_score"))
        .and_then(Value::as_f64);

    let test_cmd = profile.test_command;
    let (tested, readable, understandable, secured, trackable) = tokio::join!(
        validators::run_tested(&project_root, profile, test_cmd, coverage_threshold, mutation_score),
        validators::run_readable(&project_root, profile),
        validators::run_understandable(&project_root, profile, max_warnings),
        validators::run_secured(&project_root, profile),
        validators::run_trackable(&project_root, profile),
    );
    let completeness = validators::run_completeness(&project_root, profile);

    let report = QualityReport::assemble(vec![tested, readable, understandable, secured, trackable], completeness, threshold, None);

    services.bus.publish(
        Event::new(EventKind::Message, codes::QUALITY_SCORE, services.now_ms())
            .with_message(format!("{:.2}", report.score)),
    );

    if report.passed {
        let mut outputs = BTreeMap::new();
        outputs.insert("quality_passed".to_string(), json!(true));
        outputs.insert("quality_report".to_string(), serde_json::to_value(&report).unwrap_or(Value::Null));
        return Ok(TaskResult::success_with(outputs));
    }

    if !crate::tasks::check_jump_limit(&stage.context, services.config.max_jumps) {
        let mut outputs = BTreeMap::new();
        outputs.insert("quality_passed".to_string(), json!(false));
        outputs.insert("quality_report".to_string(), serde_json::to_value(&report).unwrap_or(Value::Null));
        return Ok(TaskResult::FailedContinue {
            error: "quality gate failed and jump limit reached".to_string(),
            outputs,
        });
    }

    let quality_attempt = stage.context.get_u32("quality_attempt").unwrap_or(0);
    let max_attempts = services.config.max_quality_attempts;
    let previous_score = stage.context.get("quality_previous_score").and_then(Value::as_f64);

    if let Some(reason) = partial_accept_reason(report.score, quality_attempt, max_attempts, previous_score) {
        let mut outputs = BTreeMap::new();
        outputs.insert("quality_passed".to_string(), json!(false));
        outputs.insert("quality_report".to_string(), serde_json::to_value(&report).unwrap_or(Value::Null));
        outputs.insert("tests_partial".to_string(), json!(true));
        outputs.insert("quality_attempts_used".to_string(), json!(quality_attempt + 1));
        return Ok(TaskResult::FailedContinue {
            error: format!("quality gate accepted as partial pass ({reason}, score={:.2})", report.score),
            outputs,
        });
    }

    let failure_summary = report
        .principles
        .iter()
        .filter(|p| !p.passed)
        .map(|p| format!("{}: {}", p.name, p.issues.iter().map(|i| i.message.clone()).collect::<Vec<_>>().join("; ")))
        .collect::<Vec<_>>()
        .join("\n");

    let mut overrides = build_jump_overrides(&stage.context, [
        ("_repair_requested".to_string(), json!(true)),
        ("test_output".to_string(), json!(failure_summary)),
        ("failure_type".to_string(), json!("quality")),
        ("tests_passed".to_string(), json!(false)),
        ("quality_attempt".to_string(), json!(quality_attempt + 1)),
        ("quality_previous_score".to_string(), json!(report.score)),
    ]);
    increment_jump_count(&mut overrides, &stage.context);

    let target = stage.context.get_str("jump_repair_ref").unwrap_or("repair").to_string();
    Ok(TaskResult::jump_to(target, overrides))
}

#[cfg(test)]
#[path = "quality_task_tests.rs"]
mod tests;
