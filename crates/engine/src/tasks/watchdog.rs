// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! WatchdogTask: a deterministic filesystem and pipeline-health audit,
//! run once per invocation rather than as a background polling loop
//! (the workflow runtime re-invokes it on its own cadence). Writes a
//! structured report to `.forge/watchdog_report.json` so repair and
//! implement prompts can surface findings, and signals a rebuild when
//! the pipeline is clearly stuck.

use std::collections::BTreeMap;
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use regex::Regex;
use serde::Serialize;
use serde_json::json;

use forge_core::constants::WATCHDOG_MAX_RUNTIME_SECS;
use forge_core::{codes, Event, EventBus, Stage, TaskOutcome, TaskResult};

use crate::lang::LanguageProfile;
use crate::services::EngineServices;

const SENTINEL_NAME: &str = "pipeline_complete";
const REBUILD_SENTINEL: &str = "watchdog_rebuild";
const REBUILD_JUMP_RATIO: f64 = 0.8;

/// Consecutive agent turns with no intervening stage completion before the
/// agent is considered stuck in a read-only loop.
const IDLE_AGENT_TURN_THRESHOLD: u32 = 8;
/// How far back the regression check looks for a run of failures after an
/// earlier pass.
const REGRESSION_WINDOW: usize = 3;
/// Elapsed time since the last stage completion before a stall is a warning
/// (doubles to an error past 2x this).
const STALL_WARN_MS: u64 = 1_800_000;

const LEGIT_DOUBLE_EXT: &[&str] = &[
    ".spec.ts", ".spec.js", ".test.ts", ".test.js", ".test.tsx", ".test.jsx", ".spec.tsx", ".spec.jsx", ".d.ts",
    ".config.js", ".config.ts", ".config.mjs", ".module.ts", ".module.css", ".stories.tsx", ".min.js", ".min.css",
    ".map.js", ".setup.ts", ".setup.js",
];
const STUB_INDICATORS: &[&str] = &["implementation required", "# module:", "// module:", "\"\"\"module:"];
const SKIP_DIRS: &[&str] = &[".forge", ".git", "node_modules", "vendor", "__pycache__", ".venv", "venv", "target", "dist", "build", ".tox", ".nox"];
const SOURCE_EXTS: &[&str] = &[".py", ".go", ".ts", ".js", ".tsx", ".jsx", ".rs", ".java", ".rb", ".ex", ".exs", ".cpp", ".c", ".h"];

#[derive(Debug, Clone, Serialize)]
struct Finding {
    severity: &'static str,
    category: &'static str,
    file: String,
    message: String,
}

fn now_unix_secs() -> u64 {
    SystemTime::now().duration_since(UNIX_EPOCH).map(|d| d.as_secs()).unwrap_or(0)
}

fn forge_dir(project_root: &Path) -> std::path::PathBuf {
    project_root.join(".forge")
}

/// Write the pipeline-complete sentinel so the watchdog stops promptly.
pub fn signal_pipeline_done(project_root: &Path) {
    let dir = forge_dir(project_root);
    let _ = std::fs::create_dir_all(&dir);
    let _ = std::fs::write(dir.join(SENTINEL_NAME), now_unix_secs().to_string());
}

fn pipeline_done(project_root: &Path) -> bool {
    forge_dir(project_root).join(SENTINEL_NAME).exists()
}

fn clear_sentinel(project_root: &Path) {
    let _ = std::fs::remove_file(forge_dir(project_root).join(SENTINEL_NAME));
}

/// Signal that the project is in an unrecoverable state; validate/repair
/// check this and trigger reimplementation instead of another repair pass.
pub fn signal_rebuild(project_root: &Path, reason: &str) {
    let dir = forge_dir(project_root);
    let _ = std::fs::create_dir_all(&dir);
    let payload = json!({"reason": reason, "timestamp": now_unix_secs()});
    let _ = std::fs::write(dir.join(REBUILD_SENTINEL), payload.to_string());
}

/// Returns `(signaled, reason)`.
pub fn check_rebuild_signal(project_root: &Path) -> (bool, String) {
    let path = forge_dir(project_root).join(REBUILD_SENTINEL);
    let Ok(raw) = std::fs::read_to_string(&path) else {
        return (false, String::new());
    };
    let reason = serde_json::from_str::<serde_json::Value>(&raw)
        .ok()
        .and_then(|v| v.get("reason").and_then(|r| r.as_str()).map(str::to_string))
        .unwrap_or_else(|| "watchdog-triggered rebuild (unreadable sentinel)".to_string());
    (true, reason)
}

pub fn clear_rebuild_signal(project_root: &Path) {
    let _ = std::fs::remove_file(forge_dir(project_root).join(REBUILD_SENTINEL));
}

fn walk_skip_dotdirs(dir: &Path, mut visit: impl FnMut(&Path)) {
    fn inner(dir: &Path, visit: &mut dyn FnMut(&Path)) {
        let Ok(entries) = std::fs::read_dir(dir) else {
            return;
        };
        for entry in entries.flatten() {
            let path = entry.path();
            let name = entry.file_name();
            let name = name.to_string_lossy();
            if path.is_dir() {
                if SKIP_DIRS.contains(&name.as_ref()) || name.starts_with('.') {
                    continue;
                }
                inner(&path, visit);
            } else {
                visit(&path);
            }
        }
    }
    inner(dir, &mut visit);
}

fn check_garbled_files(project_root: &Path) -> Vec<Finding> {
    let garbled_re = Regex::new(r"^=\d").expect("static pattern");
    let mut findings = Vec::new();
    let Ok(entries) = std::fs::read_dir(project_root) else {
        return findings;
    };
    for entry in entries.flatten() {
        if !entry.file_type().map(|t| t.is_file()).unwrap_or(false) {
            continue;
        }
        let name = entry.file_name().to_string_lossy().to_string();
        if !garbled_re.is_match(&name) {
            continue;
        }
        let message = match std::fs::remove_file(entry.path()) {
            Ok(()) => format!("Garbled file auto-deleted: {name} (shell redirect artifact)"),
            Err(_) => format!("Garbled file detected but could not delete: {name}"),
        };
        findings.push(Finding { severity: "error", category: "garbled_file", file: name, message });
    }
    findings
}

fn check_manifest_files(project_root: &Path, profile: &LanguageProfile) -> Vec<Finding> {
    profile
        .manifest_files
        .iter()
        .filter(|req| !project_root.join(req).exists())
        .map(|req| Finding {
            severity: "warning",
            category: "missing_manifest",
            file: req.to_string(),
            message: format!("Required project file missing: {req}"),
        })
        .collect()
}

fn check_corrupted_extensions(project_root: &Path) -> Vec<Finding> {
    let double_ext_re = Regex::new(r"\.\w+\.\w+$").expect("static pattern");
    let mut findings = Vec::new();
    let Ok(entries) = std::fs::read_dir(project_root) else {
        return findings;
    };
    for entry in entries.flatten() {
        if !entry.file_type().map(|t| t.is_file()).unwrap_or(false) {
            continue;
        }
        let name = entry.file_name().to_string_lossy().to_string();
        if !double_ext_re.is_match(&name) {
            continue;
        }
        let lower = name.to_lowercase();
        if LEGIT_DOUBLE_EXT.iter().any(|ext| lower.ends_with(ext)) {
            continue;
        }
        findings.push(Finding { severity: "warning", category: "corrupted_extension", file: name.clone(), message: format!("Suspicious double extension: {name}") });
    }
    findings
}

fn check_empty_source_files(project_root: &Path) -> Vec<Finding> {
    let mut findings = Vec::new();
    walk_skip_dotdirs(project_root, |path| {
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            return;
        };
        if !SOURCE_EXTS.iter().any(|ext| name.ends_with(ext)) {
            return;
        }
        if matches!(name, "__init__.py" | "mod.rs" | "lib.rs") {
            return;
        }
        if std::fs::metadata(path).map(|m| m.len() == 0).unwrap_or(false) {
            let rel = path.strip_prefix(project_root).unwrap_or(path).to_string_lossy().to_string();
            findings.push(Finding { severity: "warning", category: "empty_source", file: rel.clone(), message: format!("Empty source file: {rel}") });
        }
    });
    findings
}

fn check_stub_files(project_root: &Path) -> Vec<Finding> {
    let mut findings = Vec::new();
    walk_skip_dotdirs(project_root, |path| {
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            return;
        };
        if !SOURCE_EXTS.iter().any(|ext| name.ends_with(ext)) || name == "__init__.py" {
            return;
        }
        let Ok(metadata) = std::fs::metadata(path) else {
            return;
        };
        if metadata.len() == 0 || metadata.len() > 500 {
            return;
        }
        let Ok(content) = std::fs::read_to_string(path) else {
            return;
        };
        let lower = content.to_lowercase();
        if STUB_INDICATORS.iter().any(|needle| lower.contains(needle)) {
            let rel = path.strip_prefix(project_root).unwrap_or(path).to_string_lossy().to_string();
            findings.push(Finding { severity: "warning", category: "stub_file", file: rel.clone(), message: format!("Stub file still present: {rel}") });
        }
    });
    findings
}

fn first_word(cmd: &str) -> Option<&str> {
    cmd.split_whitespace().next()
}

fn binary_on_path(name: &str) -> bool {
    let candidate = Path::new(name);
    if candidate.is_absolute() || name.contains('/') {
        return candidate.exists();
    }
    let Some(path_var) = std::env::var_os("PATH") else {
        return true;
    };
    std::env::split_paths(&path_var).any(|dir| dir.join(name).exists())
}

/// Rule: verify the binaries the language profile's own commands depend on
/// are actually on `PATH` — a missing toolchain means every downstream
/// validate/quality run will fail for a reason no repair can fix.
fn rule_tool_availability(profile: &LanguageProfile) -> Vec<Finding> {
    let mut commands: Vec<&str> = Vec::new();
    commands.push(profile.test_command);
    commands.extend(profile.syntax_check_command);
    commands.extend(profile.lint_commands.iter().copied());
    commands.extend(profile.lint_check_commands.iter().copied());
    commands.extend(profile.coverage_command);
    commands.extend(profile.security_command);

    let mut seen = std::collections::BTreeSet::new();
    let mut findings = Vec::new();
    for cmd in commands {
        let Some(binary) = first_word(cmd) else {
            continue;
        };
        if binary.is_empty() || !seen.insert(binary.to_string()) {
            continue;
        }
        if !binary_on_path(binary) {
            findings.push(Finding {
                severity: "warning",
                category: "tool_missing",
                file: binary.to_string(),
                message: format!("Required tool not found on PATH: {binary} (from command: {cmd})"),
            });
        }
    }
    findings
}

/// Drain every event currently buffered for a fresh subscriber — the
/// replay buffer plus anything published since — then unsubscribe. A
/// one-shot substitute for the persistent `PipelineHealth` accumulator a
/// long-running watchdog would keep: this task re-runs once per workflow
/// re-invocation rather than polling in a background loop, so it rebuilds
/// its view of recent history from the bus each time instead.
fn drain_bus_events(bus: &EventBus) -> Vec<Event> {
    let mut sub = bus.subscribe();
    let mut events = Vec::new();
    while let Ok(event) = sub.rx.try_recv() {
        events.push(event);
    }
    bus.unsubscribe(sub.id);
    events
}

/// Rule: an agent that keeps taking turns with no stage ever completing is
/// probably stuck re-reading the same files rather than making progress.
fn rule_idle_agent(events: &[Event]) -> Vec<Finding> {
    let mut consecutive = 0u32;
    for event in events {
        match event.code.as_str() {
            codes::AGENT_TURN => consecutive += 1,
            codes::WORKFLOW_STAGE_DONE => consecutive = 0,
            _ => {}
        }
    }
    if consecutive >= IDLE_AGENT_TURN_THRESHOLD {
        vec![Finding {
            severity: "warning",
            category: "idle_agent",
            file: String::new(),
            message: format!("Agent appears stuck in a read-only loop ({consecutive} consecutive agent turns with no stage completion)"),
        }]
    } else {
        Vec::new()
    }
}

/// Rule: the test suite going from passing to failing across the last
/// `REGRESSION_WINDOW` validation runs, after having passed at least once
/// before that, is a stronger signal than a single failure.
fn rule_regression(events: &[Event]) -> Vec<Finding> {
    let history: Vec<bool> = events
        .iter()
        .filter_map(|e| match e.code.as_str() {
            codes::VALIDATE_PASSED => Some(true),
            codes::VALIDATE_FAILED => Some(false),
            _ => None,
        })
        .collect();
    if history.len() <= REGRESSION_WINDOW {
        return Vec::new();
    }
    let (earlier, recent) = history.split_at(history.len() - REGRESSION_WINDOW);
    if earlier.iter().any(|&passed| passed) && recent.iter().all(|&passed| !passed) {
        let passes = history.iter().filter(|&&passed| passed).count();
        vec![Finding {
            severity: "error",
            category: "regression",
            file: String::new(),
            message: format!(
                "Test regression detected: last {REGRESSION_WINDOW} validation runs failed after an earlier pass ({passes}/{} passes overall)",
                history.len()
            ),
        }]
    } else {
        Vec::new()
    }
}

/// Rule: no stage has completed and no validate run has passed in a long
/// time — the pipeline may be wedged rather than merely slow.
fn rule_stall(events: &[Event], now_ms: u64) -> Vec<Finding> {
    let last_progress = events
        .iter()
        .filter(|e| e.code == codes::WORKFLOW_STAGE_DONE || e.code == codes::VALIDATE_PASSED)
        .map(|e| e.timestamp)
        .max();
    let Some(last) = last_progress else {
        return Vec::new();
    };
    let elapsed_ms = now_ms.saturating_sub(last);
    if elapsed_ms > STALL_WARN_MS {
        let severity = if elapsed_ms > STALL_WARN_MS * 2 { "error" } else { "warning" };
        vec![Finding {
            severity,
            category: "pipeline_stall",
            file: String::new(),
            message: format!("Pipeline stall: no stage completed in {} minutes", elapsed_ms / 60_000),
        }]
    } else {
        Vec::new()
    }
}

fn run_checks(project_root: &Path, profile: &LanguageProfile) -> Vec<Finding> {
    let mut findings = check_garbled_files(project_root);
    findings.extend(check_manifest_files(project_root, profile));
    findings.extend(check_corrupted_extensions(project_root));
    findings.extend(check_empty_source_files(project_root));
    findings.extend(check_stub_files(project_root));
    findings
}

fn rule_repair_loop(repair_attempts: u32, jump_count: u32) -> Vec<Finding> {
    let mut findings = Vec::new();
    if repair_attempts >= 3 {
        findings.push(Finding { severity: "warning", category: "repair_loop", file: String::new(), message: format!("Pipeline has attempted {repair_attempts} repairs — may be stuck in repair loop") });
    }
    if jump_count >= 20 {
        findings.push(Finding { severity: "error", category: "excessive_jumps", file: String::new(), message: format!("Pipeline has {jump_count} jumps — likely stuck in infinite loop") });
    }
    findings
}

fn rule_exhaustion(jump_count: u32, max_jumps: u32) -> Vec<Finding> {
    if max_jumps == 0 {
        return Vec::new();
    }
    let ratio = f64::from(jump_count) / f64::from(max_jumps);
    if ratio >= 0.8 {
        vec![Finding { severity: "error", category: "jump_exhaustion", file: String::new(), message: format!("Jump limit nearly exhausted: {jump_count}/{max_jumps} ({:.0}%). Pipeline may terminate soon.", ratio * 100.0) }]
    } else if ratio >= 0.6 {
        vec![Finding { severity: "warning", category: "jump_exhaustion", file: String::new(), message: format!("Jump count at {jump_count}/{max_jumps} ({:.0}%).", ratio * 100.0) }]
    } else {
        Vec::new()
    }
}

fn write_report(project_root: &Path, findings: &[Finding], check_number: u32, repair_attempts: u32, jump_count: u32) {
    let dir = forge_dir(project_root);
    if std::fs::create_dir_all(&dir).is_err() {
        return;
    }
    let report = json!({
        "check_number": check_number,
        "findings": findings,
        "pipeline_health": {"repair_attempts": repair_attempts, "jump_count": jump_count},
    });
    let tmp = dir.join(format!("watchdog_report.{check_number}.tmp"));
    if std::fs::write(&tmp, report.to_string()).is_ok() {
        let _ = std::fs::rename(&tmp, dir.join("watchdog_report.json"));
    }
}

/// Format the latest watchdog report for injection into an agent's prompt.
/// Returns an empty string when no report exists or it carries no findings.
pub fn load_watchdog_findings(project_root: &Path) -> String {
    let path = forge_dir(project_root).join("watchdog_report.json");
    let Ok(raw) = std::fs::read_to_string(path) else {
        return String::new();
    };
    let Ok(report) = serde_json::from_str::<serde_json::Value>(&raw) else {
        return String::new();
    };
    let Some(findings) = report.get("findings").and_then(|v| v.as_array()) else {
        return String::new();
    };
    if findings.is_empty() {
        return String::new();
    }

    let mut lines = vec![
        "## Watchdog Audit Findings (auto-injected)".to_string(),
        String::new(),
        "The watchdog has detected the following issues in the project. You MUST address \
         these if they relate to files you are modifying.\n"
            .to_string(),
    ];
    for finding in findings {
        let severity = finding.get("severity").and_then(|v| v.as_str()).unwrap_or("warning").to_uppercase();
        let category = finding.get("category").and_then(|v| v.as_str()).unwrap_or("unknown");
        let file = finding.get("file").and_then(|v| v.as_str()).unwrap_or("");
        let message = finding.get("message").and_then(|v| v.as_str()).unwrap_or("");
        lines.push(format!("- **[{severity}]** ({category}) `{file}`: {message}"));
    }
    lines.join("\n")
}

pub async fn execute(stage: &Stage, services: &EngineServices) -> TaskOutcome {
    let project_root = stage.context.get_str("project_root").map(std::path::PathBuf::from).unwrap_or_else(|| services.project_root.clone());
    clear_sentinel(&project_root);

    let started_at_ms = stage.context.get("workflow_started_at_ms").and_then(|v| v.as_u64());
    if let Some(started) = started_at_ms {
        let elapsed_secs = services.now_ms().saturating_sub(started) / 1000;
        if elapsed_secs > WATCHDOG_MAX_RUNTIME_SECS {
            return Ok(TaskResult::terminal(format!("watchdog max runtime reached ({WATCHDOG_MAX_RUNTIME_SECS}s)")));
        }
    }

    if pipeline_done(&project_root) {
        clear_sentinel(&project_root);
        let mut outputs = BTreeMap::new();
        outputs.insert("watchdog_checks".to_string(), json!(0));
        outputs.insert("watchdog_done".to_string(), json!(true));
        return Ok(TaskResult::success_with(outputs));
    }

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
        .unwrap_or_else(|| crate::lang::detect_language(&project_root));
    let profile = crate::lang::get_profile(language);

    let repair_attempts = stage.context.get_u32("repair_attempt").unwrap_or(0);
    let jump_count = stage.context.get_u32("_jump_count").unwrap_or(0);
    let max_jumps = services.config.max_jumps;
    let check_number = stage.context.get_u32("watchdog_check_count").unwrap_or(0) + 1;

    let events = drain_bus_events(&services.bus);

    let mut findings = run_checks(&project_root, profile);
    findings.extend(rule_repair_loop(repair_attempts, jump_count));
    findings.extend(rule_exhaustion(jump_count, max_jumps));
    findings.extend(rule_tool_availability(profile));
    findings.extend(rule_idle_agent(&events));
    findings.extend(rule_regression(&events));
    findings.extend(rule_stall(&events, services.now_ms()));

    if max_jumps > 0 && f64::from(jump_count) / f64::from(max_jumps) >= REBUILD_JUMP_RATIO {
        signal_rebuild(&project_root, &format!("jump count {jump_count}/{max_jumps} near exhaustion"));
    }

    let warnings = findings.iter().filter(|f| f.severity == "warning").count() as u32;
    let errors = findings.iter().filter(|f| f.severity == "error").count() as u32;
    write_report(&project_root, &findings, check_number, repair_attempts, jump_count);

    let mut outputs = BTreeMap::new();
    outputs.insert("watchdog_checks".to_string(), json!(check_number));
    outputs.insert("watchdog_warnings".to_string(), json!(warnings));
    outputs.insert("watchdog_errors".to_string(), json!(errors));
    outputs.insert("watchdog_check_count".to_string(), json!(check_number));
    Ok(TaskResult::success_with(outputs))
}

#[cfg(test)]
#[path = "watchdog_tests.rs"]
mod tests;
