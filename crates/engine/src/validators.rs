// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The five scored Quality Gate pillars plus the completeness gate.
//!
//! Each validator is a plain async function over a project root and a
//! language profile, run concurrently by QualityTask. None of them parse a
//! language's AST — assertion density, like every other signal here, is a
//! line-oriented regex scan, the same restriction the generic (non-Python)
//! path of the corpus this was distilled from applies to every language.

use std::path::Path;
use std::time::Duration;

use regex::Regex;

use crate::lang::LanguageProfile;
use crate::quality::{Issue, PrincipleResult, PRINCIPLE_COMPLETENESS, PRINCIPLE_READABLE, PRINCIPLE_SECURED, PRINCIPLE_TESTED, PRINCIPLE_TRACKABLE, PRINCIPLE_UNDERSTANDABLE};

const MAX_FILE_LINES: usize = 500;

fn is_tool_missing(output: &str) -> bool {
    let lower = output.to_lowercase();
    ["no module named", "command not found", "not found in path", "is not recognized", "not installed", "cannot run program"]
        .iter()
        .any(|needle| lower.contains(needle))
}

async fn run_command(cmd: &str, cwd: &Path, timeout: Duration) -> (i32, String) {
    match forge_tools::bash::run(cmd, Some(cwd), timeout).await {
        Ok(result) => (result.exit_code, format!("{}\n{}", result.stdout, result.stderr)),
        Err(_) => (127, String::new()),
    }
}

fn source_files(project_root: &Path, profile: &LanguageProfile) -> Vec<std::path::PathBuf> {
    let mut out = Vec::new();
    collect_source_files(project_root, profile, &mut out);
    out
}

fn collect_source_files(dir: &Path, profile: &LanguageProfile, out: &mut Vec<std::path::PathBuf>) {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return;
    };
    for entry in entries.flatten() {
        let path = entry.path();
        let name = entry.file_name();
        let name = name.to_string_lossy();
        if path.is_dir() {
            if profile.skip_dirs.iter().any(|skip| name == *skip) || name.starts_with('.') {
                continue;
            }
            collect_source_files(&path, profile, out);
        } else if profile.extensions.iter().any(|ext| name.ends_with(ext)) {
            out.push(path);
        }
    }
}

fn is_test_file(path: &Path) -> bool {
    let name = path.file_name().and_then(|n| n.to_str()).unwrap_or_default();
    let as_str = path.to_string_lossy();
    name.starts_with("test_")
        || name.ends_with("_test.py")
        || name.ends_with("_tests.rs")
        || name.ends_with(".test.ts")
        || name.ends_with(".test.js")
        || name.ends_with(".spec.ts")
        || as_str.contains("/tests/")
        || as_str.contains("/test/")
}

/// `tested`: tests pass, zero "type error" lines, coverage vs threshold,
/// assertion density — averaged into one score.
pub async fn run_tested(
    project_root: &Path,
    profile: &LanguageProfile,
    test_cmd: &str,
    coverage_threshold: f64,
    mutation_score: Option<f64>,
) -> PrincipleResult {
    let mut issues = Vec::new();
    let mut checks = Vec::new();

    let (rc, output) = run_command(test_cmd, project_root, Duration::from_secs(120)).await;
    checks.push(if rc == 0 { 1.0 } else { 0.0 });
    if rc != 0 {
        issues.push(Issue::error(format!("tests failed (exit {rc})")));
    }

    let type_error_re = Regex::new(r"(?i)type error").ok();
    let type_errors = type_error_re.map(|re| re.find_iter(&output).count()).unwrap_or(0);
    checks.push(if type_errors == 0 { 1.0 } else { 0.0 });
    if type_errors > 0 {
        issues.push(Issue::error(format!("{type_errors} type error(s) reported")));
    }

    if let Some(coverage_cmd) = profile.coverage_command {
        let (cov_rc, cov_out) = run_command(coverage_cmd, project_root, Duration::from_secs(120)).await;
        if cov_rc == 127 || is_tool_missing(&cov_out) {
            checks.push(0.5);
            issues.push(Issue::hint("no coverage tool available"));
        } else if let Some(pct) = parse_coverage(&cov_out) {
            let ratio = (pct / 100.0 / coverage_threshold).min(1.0);
            checks.push(ratio);
            if ratio < 1.0 {
                issues.push(Issue::error(format!("coverage {pct:.1}% below threshold")));
            }
        } else {
            checks.push(0.5);
            issues.push(Issue::hint("coverage output could not be parsed"));
        }
    }

    let density = assertion_density(project_root, profile);
    checks.push(density);
    if density < 0.5 {
        issues.push(Issue::error("assertion density below 0.5"));
    } else if density < 1.0 {
        issues.push(Issue::warning("assertion density below 1.0"));
    }

    if let Some(mscore) = mutation_score.filter(|s| *s >= 0.0) {
        checks.push(mscore);
        if mscore < 0.5 {
            issues.push(Issue::error(format!("mutation score {mscore:.2} below 0.5")));
        } else if mscore < 1.0 {
            issues.push(Issue::warning(format!("mutation score {mscore:.2} below 1.0")));
        }
    }

    let score = checks.iter().sum::<f64>() / checks.len() as f64;
    let passed = rc == 0 && type_errors == 0 && density >= 0.5;
    PrincipleResult::new(PRINCIPLE_TESTED, passed, score, issues)
}

fn parse_coverage(output: &str) -> Option<f64> {
    for line in output.lines() {
        if let Some(caps) = Regex::new(r"TOTAL\s+\d+\s+\d+\s+(\d+)%").ok()?.captures(line) {
            return caps.get(1)?.as_str().parse().ok();
        }
        if let Some(caps) = Regex::new(r"coverage:\s+([\d.]+)%").ok()?.captures(line) {
            return caps.get(1)?.as_str().parse().ok();
        }
    }
    Regex::new(r"(\d+)%")
        .ok()?
        .captures_iter(output)
        .last()
        .and_then(|c| c.get(1)?.as_str().parse().ok())
}

const ASSERTION_PATTERN: &str = r"\bassert(?:_eq|_ne|!|ion)?";
const TEST_FUNC_PATTERN: &str = r"(?m)^\s*(?:fn\s+test_\w+|def\s+test_\w+|func\s+Test\w+|it\(|test\()";

fn assertion_density(project_root: &Path, profile: &LanguageProfile) -> f64 {
    let files = source_files(project_root, profile).into_iter().filter(|p| is_test_file(p));
    let assertion_re = Regex::new(ASSERTION_PATTERN).ok();
    let test_re = Regex::new(TEST_FUNC_PATTERN).ok();

    let mut tests = 0usize;
    let mut assertions = 0usize;
    for file in files {
        let Ok(content) = std::fs::read_to_string(&file) else {
            continue;
        };
        if let Some(re) = &test_re {
            tests += re.find_iter(&content).count();
        }
        if let Some(re) = &assertion_re {
            assertions += re.find_iter(&content).count();
        }
    }
    if tests == 0 {
        return 1.0;
    }
    (assertions as f64 / tests as f64).min(1.0)
}

/// `readable`: runs the lint commands, but never parses their output —
/// stores it raw (truncated) so a repair agent can interpret the feedback.
pub async fn run_readable(project_root: &Path, profile: &LanguageProfile) -> PrincipleResult {
    let mut issues = Vec::new();
    let mut failures = 0u32;

    for cmd in profile.lint_check_commands {
        let (rc, output) = run_command(cmd, project_root, Duration::from_secs(60)).await;
        if rc == 127 || is_tool_missing(&output) {
            continue;
        }
        if rc != 0 {
            failures += 1;
            let truncated: String = output.chars().take(2000).collect();
            issues.push(Issue::error(truncated));
        }
    }

    let score = (1.0 - f64::from(failures) * 0.2).max(0.0);
    PrincipleResult::new(PRINCIPLE_READABLE, failures == 0, score, issues)
}

/// `understandable`: warning count, file sizes, doc completeness.
pub async fn run_understandable(project_root: &Path, profile: &LanguageProfile, max_warnings: u32) -> PrincipleResult {
    let mut issues = Vec::new();
    let mut checks = Vec::new();

    let mut warnings = 0u32;
    for cmd in profile.lint_check_commands {
        let (_rc, output) = run_command(cmd, project_root, Duration::from_secs(60)).await;
        warnings += output.lines().filter(|l| l.to_lowercase().contains("warning")).count() as u32;
    }
    let within_warnings = max_warnings == 0 || warnings <= max_warnings;
    checks.push(if within_warnings { 1.0 } else { 0.0 });
    if !within_warnings {
        issues.push(Issue::warning(format!("{warnings} warnings exceed threshold of {max_warnings}")));
    }

    let files = source_files(project_root, profile);
    let oversized: Vec<_> = files
        .iter()
        .filter(|f| !is_test_file(f))
        .filter(|f| std::fs::read_to_string(f).map(|c| c.lines().count() > MAX_FILE_LINES).unwrap_or(false))
        .collect();
    checks.push(if oversized.is_empty() { 1.0 } else { 0.0 });
    for file in &oversized {
        issues.push(Issue::warning(format!("{} exceeds {MAX_FILE_LINES} lines", file.display())));
    }

    let score = checks.iter().sum::<f64>() / checks.len() as f64;
    PrincipleResult::new(PRINCIPLE_UNDERSTANDABLE, within_warnings && oversized.is_empty(), score, issues)
}

/// `secured`: runs the language's security scanner if configured.
pub async fn run_secured(project_root: &Path, profile: &LanguageProfile) -> PrincipleResult {
    let Some(cmd) = profile.security_command else {
        return PrincipleResult::new(PRINCIPLE_SECURED, true, 1.0, vec![Issue::hint("no security scanner configured")]);
    };

    let (rc, output) = run_command(cmd, project_root, Duration::from_secs(120)).await;
    if rc == 127 || is_tool_missing(&output) {
        return PrincipleResult::new(PRINCIPLE_SECURED, true, 1.0, vec![Issue::hint("security scanner not installed")]);
    }

    let high = output.to_lowercase().matches("high").count() + output.to_lowercase().matches("critical").count();
    let medium = output.to_lowercase().matches("medium").count();
    let mut issues = Vec::new();
    if high > 0 {
        issues.push(Issue::error(format!("{high} high/critical security finding(s)")));
    }
    if medium > 0 {
        issues.push(Issue::warning(format!("{medium} medium security finding(s)")));
    }
    let score = (1.0 - high as f64 * 0.3 - medium as f64 * 0.1).max(0.0);
    PrincipleResult::new(PRINCIPLE_SECURED, high == 0, score, issues)
}

/// `trackable`: no spaces in filenames, tests exist alongside sources, last
/// commit message follows Conventional Commits.
pub async fn run_trackable(project_root: &Path, profile: &LanguageProfile) -> PrincipleResult {
    let mut issues = Vec::new();
    let mut checks = Vec::new();

    let files = source_files(project_root, profile);
    let bad_names: Vec<_> = files
        .iter()
        .filter(|f| f.file_name().and_then(|n| n.to_str()).map(|n| n.contains(' ')).unwrap_or(false))
        .collect();
    checks.push(if bad_names.is_empty() { 1.0 } else { 1.0 - bad_names.len() as f64 * 0.2 });
    for file in &bad_names {
        issues.push(Issue::warning(format!("{} contains a space in its filename", file.display())));
    }

    let has_tests = files.iter().any(|f| is_test_file(f));
    let has_non_test_sources = files.iter().any(|f| !is_test_file(f));
    let tests_present = !has_non_test_sources || has_tests;
    checks.push(if tests_present { 1.0 } else { 0.0 });
    if !tests_present {
        issues.push(Issue::error("no test files alongside source files"));
    }

    let (rc, output) = run_command("git log -1 --format=%s", project_root, Duration::from_secs(10)).await;
    let conventional_re = Regex::new(r"^(feat|fix|build|chore|ci|docs|style|refactor|perf|test)(\([a-zA-Z0-9_./-]+\))?!?: .+").ok();
    let conventional = rc == 0
        && conventional_re
            .map(|re| re.is_match(output.trim()))
            .unwrap_or(true);
    checks.push(if conventional { 1.0 } else { 0.0 });
    if !conventional {
        issues.push(Issue::hint("last commit message does not follow Conventional Commits"));
    }

    let score = checks.iter().sum::<f64>() / checks.len() as f64;
    PrincipleResult::new(PRINCIPLE_TRACKABLE, bad_names.is_empty() && tests_present, score, issues)
}

/// Pass/fail project-completeness gate: required manifest files exist, and
/// the project root carries no shell-redirect artifact files.
pub fn run_completeness(project_root: &Path, profile: &LanguageProfile) -> PrincipleResult {
    let mut issues = Vec::new();
    let has_manifest = profile.manifest_files.iter().any(|m| project_root.join(m).exists());
    if !has_manifest {
        issues.push(Issue::error("no recognized project manifest file found"));
    }

    let garbled_re = Regex::new(r"^=\d").ok();
    let mut garbled = Vec::new();
    if let Ok(entries) = std::fs::read_dir(project_root) {
        for entry in entries.flatten() {
            let name = entry.file_name();
            let name = name.to_string_lossy().to_string();
            if garbled_re.as_ref().map(|re| re.is_match(&name)).unwrap_or(false) {
                garbled.push(name);
            }
        }
    }
    for name in &garbled {
        issues.push(Issue::error(format!("garbled artifact file found: {name}")));
    }

    let passed = has_manifest && garbled.is_empty();
    PrincipleResult::new(PRINCIPLE_COMPLETENESS, passed, if passed { 1.0 } else { 0.0 }, issues)
}

#[cfg(test)]
#[path = "validators_tests.rs"]
mod tests;
