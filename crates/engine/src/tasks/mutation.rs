// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! MutationTask: spot-check mutation testing to verify the test suite
//! actually exercises the code it covers. Injects a small random sample of
//! single-line mutations (comparison-operator flips, boolean-literal
//! flips) into non-test source files and re-runs the test command against
//! each one. A mutant the suite fails to catch ("survives") lowers the
//! mutation score; the Quality Gate folds that score into its `tested`
//! pillar. Never blocks the pipeline outright — a low score is reported via
//! `failed_continue`, same as a failing validation check.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use rand::seq::SliceRandom;
use regex::Regex;
use serde_json::json;

use forge_core::{codes, Event, EventKind, Stage, TaskOutcome, TaskResult};
use forge_tools::{bash, ToolError};

use crate::lang::{detect_language, get_profile, Language};
use crate::services::EngineServices;
use crate::tasks::validate_helpers;

const DEFAULT_MAX_MUTANTS: usize = 10;

/// One line-level mutation operator. Rust's `regex` crate has no
/// lookaround, so the comparison-operator patterns use a capture-group
/// boundary (one character of context on either side) in place of the
/// original's `(?<!=)`/`(?!=)` assertions, folding the preserved boundary
/// characters back in via `${1}`/`${2}` in the replacement.
struct MutationOp {
    pattern: &'static str,
    replacement: &'static str,
    description: &'static str,
}

const MUTATION_OPERATORS: &[MutationOp] = &[
    MutationOp { pattern: r"(^|[^=!<>])==($|[^=])", replacement: "${1}!=${2}", description: "eq→neq" },
    MutationOp { pattern: r"(^|[^=])!=($|[^=])", replacement: "${1}==${2}", description: "neq→eq" },
    MutationOp { pattern: r"(^|[^=])>=", replacement: "${1}>", description: "gte→gt" },
    MutationOp { pattern: r"(^|[^=])<=", replacement: "${1}<", description: "lte→lt" },
    MutationOp { pattern: r"(^|[^<!=])>($|[^>=])", replacement: "${1}>=${2}", description: "gt→gte" },
    MutationOp { pattern: r"(^|[^>!=])<($|[^<=])", replacement: "${1}<=${2}", description: "lt→lte" },
    MutationOp { pattern: r"\bTrue\b", replacement: "False", description: "true→false" },
    MutationOp { pattern: r"\bFalse\b", replacement: "True", description: "false→true" },
    MutationOp { pattern: r"\btrue\b", replacement: "false", description: "true→false" },
    MutationOp { pattern: r"\bfalse\b", replacement: "true", description: "false→true" },
];

const COMMENT_PREFIXES: &[&str] = &["#", "//", "/*", "*", "///", "---"];

struct Mutant {
    file: String,
    line_no: usize,
    mutated_line: String,
    description: String,
}

/// Scan `source_files` (relative to `project_root`) line by line, skip
/// comment-prefixed lines, and collect every mutation operator match,
/// returning a random sample bounded by `max_mutants`.
fn generate_mutants(source_files: &[String], project_root: &Path, max_mutants: usize) -> Vec<Mutant> {
    let mut candidates = Vec::new();
    for rel in source_files {
        let Ok(content) = std::fs::read_to_string(project_root.join(rel)) else {
            continue;
        };
        for (idx, line) in content.split_inclusive('\n').enumerate() {
            let stripped = line.trim_start();
            if COMMENT_PREFIXES.iter().any(|p| stripped.starts_with(p)) {
                continue;
            }
            for op in MUTATION_OPERATORS {
                let Ok(re) = Regex::new(op.pattern) else {
                    continue;
                };
                if !re.is_match(line) {
                    continue;
                }
                let mutated = re.replacen(line, 1, op.replacement).into_owned();
                if mutated != line {
                    candidates.push(Mutant {
                        file: rel.clone(),
                        line_no: idx + 1,
                        mutated_line: mutated,
                        description: format!("{rel}:{} ({})", idx + 1, op.description),
                    });
                }
            }
        }
    }
    if candidates.len() <= max_mutants {
        return candidates;
    }
    candidates.shuffle(&mut rand::thread_rng());
    candidates.truncate(max_mutants);
    candidates
}

/// Splice `mutant`'s line into its file and return the original content, so
/// the caller can restore it once the test run completes.
fn apply_mutant(mutant: &Mutant, project_root: &Path) -> std::io::Result<String> {
    let path = project_root.join(&mutant.file);
    let original = std::fs::read_to_string(&path)?;
    let mut lines: Vec<&str> = original.split_inclusive('\n').collect();
    if mutant.line_no == 0 || mutant.line_no > lines.len() {
        return Ok(original);
    }
    lines[mutant.line_no - 1] = mutant.mutated_line.as_str();
    std::fs::write(&path, lines.concat())?;
    Ok(original)
}

fn restore_file(project_root: &Path, rel: &str, content: &str) {
    let _ = std::fs::write(project_root.join(rel), content);
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
            "rust" => Some(Language::Rust),
            "python" => Some(Language::Python),
            "go" => Some(Language::Go),
            "typescript" => Some(Language::TypeScript),
            "javascript" => Some(Language::JavaScript),
            _ => None,
        })
        .unwrap_or_else(|| detect_language(&project_root));
    let profile = get_profile(language);

    let max_mutants = stage
        .context
        .get_u32("max_mutation_samples")
        .map(|n| n as usize)
        .unwrap_or(DEFAULT_MAX_MUTANTS);

    let source_files = validate_helpers::discover_source_files(&project_root, profile.extensions, profile.skip_dirs);
    if source_files.is_empty() {
        let mut outputs = BTreeMap::new();
        outputs.insert("mutation_score".to_string(), json!(-1.0));
        outputs.insert("mutants_tested".to_string(), json!(0));
        return Ok(TaskResult::success_with(outputs));
    }

    let mutants = generate_mutants(&source_files, &project_root, max_mutants);
    if mutants.is_empty() {
        let mut outputs = BTreeMap::new();
        outputs.insert("mutation_score".to_string(), json!(-1.0));
        outputs.insert("mutants_tested".to_string(), json!(0));
        return Ok(TaskResult::success_with(outputs));
    }

    let timeout = Duration::from_secs(services.config.subprocess_timeout_secs);
    let test_cmd = profile.test_command;

    let mut killed = 0u32;
    let mut survived = 0u32;
    let mut survived_details = Vec::new();

    for mutant in &mutants {
        let Ok(original) = apply_mutant(mutant, &project_root) else {
            continue;
        };
        let outcome = bash::run(test_cmd, Some(&project_root), timeout).await;
        restore_file(&project_root, &mutant.file, &original);
        match outcome {
            Ok(result) if result.exit_code != 0 => killed += 1,
            Ok(_) => {
                survived += 1;
                survived_details.push(mutant.description.clone());
            }
            // a timeout counts as "caught" — the mutation changed the suite's behavior
            Err(ToolError::Timeout(_)) => killed += 1,
            Err(_) => continue,
        }
    }

    let total = killed + survived;
    let score = if total > 0 { killed as f64 / total as f64 } else { -1.0 };

    services.bus.publish(
        Event::new(EventKind::Message, codes::MUTATION_SCORE, services.now_ms())
            .with_message(format!("{:.2}", score.max(0.0))),
    );

    let mut outputs = BTreeMap::new();
    outputs.insert("mutation_score".to_string(), json!(score));
    outputs.insert("mutants_tested".to_string(), json!(total));
    outputs.insert("mutants_killed".to_string(), json!(killed));
    outputs.insert("mutants_survived".to_string(), json!(survived));

    if survived > 0 {
        let details: String = survived_details.iter().take(5).cloned().collect::<Vec<_>>().join("; ");
        return Ok(TaskResult::FailedContinue {
            error: format!("mutation score {:.0}% — {survived} mutant(s) survived the test suite ({details})", score * 100.0),
            outputs,
        });
    }

    Ok(TaskResult::success_with(outputs))
}

#[cfg(test)]
#[path = "mutation_tests.rs"]
mod tests;
