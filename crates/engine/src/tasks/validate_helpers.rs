// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Pure helper functions for ValidateTask: command parsing, test-file
//! discovery, lint-output filtering, and test-count parsing. Kept separate
//! from `validate.rs` so they stay independently unit-testable without a
//! live subprocess.

use std::collections::HashMap;
use std::path::Path;

use regex::Regex;

const SHELL_METACHARS: &[char] = &['&', '|', ';', '>', '<', '`', '$'];

/// One parsed command: either a direct argv, or a `sh -c` wrapped string
/// when the command uses shell syntax (metacharacters, `. ` sourcing, or a
/// leading `VAR=value` assignment).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedCommand {
    Argv(Vec<String>),
    Shell(String),
}

fn looks_like_env_prefix(cmd: &str) -> bool {
    let Some(first_word) = cmd.split_whitespace().next() else {
        return false;
    };
    let Some((key, value)) = first_word.split_once('=') else {
        return false;
    };
    !key.is_empty()
        && !value.is_empty()
        && key.chars().next().map(|c| c.is_alphabetic() || c == '_').unwrap_or(false)
        && key.chars().all(|c| c.is_alphanumeric() || c == '_')
}

/// Parse a planner- or profile-supplied command string into argv or a
/// shell-wrapped string, mirroring the original's `_parse_command`.
pub fn parse_command(cmd: &str) -> ParsedCommand {
    if cmd.contains(SHELL_METACHARS) || cmd.trim_start().starts_with(". ") || looks_like_env_prefix(cmd) {
        return ParsedCommand::Shell(cmd.to_string());
    }
    let parts: Vec<String> = cmd.split_whitespace().map(str::to_string).collect();
    if parts.is_empty() {
        ParsedCommand::Shell(cmd.to_string())
    } else {
        ParsedCommand::Argv(parts)
    }
}

/// Count test-pass lines across pytest, go test, jest, and generic runners.
pub fn count_tests(output: &str) -> u32 {
    let patterns = [
        r"(\d+)\s+passed",
        r"ok\s+\S+\s+[\d.]+s",
        r"Tests:\s+.*?(\d+)\s+passed",
        r"(\d+)\s+tests?\s+passed",
    ];
    let mut total = 0u32;
    for line in output.lines() {
        for pattern in &patterns {
            let Ok(re) = Regex::new(pattern) else { continue };
            if let Some(caps) = re.captures(line) {
                if let Some(n) = caps.get(1).and_then(|m| m.as_str().parse::<u32>().ok()) {
                    total += n;
                } else {
                    total += 1;
                }
            }
        }
    }
    total
}

const TEST_DIR_TOKENS: &[&str] = &["tests/", "tests", "test/", "test", "spec/", "spec"];

/// Replace the first directory-style token in a test command with the
/// concrete list of test files, dropping any further directory tokens.
pub fn scope_test_command(cmd: &str, test_files: &[String]) -> String {
    if test_files.is_empty() {
        return cmd.to_string();
    }
    let mut replaced = false;
    let tokens: Vec<String> = cmd
        .split_whitespace()
        .filter_map(|tok| {
            if TEST_DIR_TOKENS.contains(&tok) {
                if replaced {
                    None
                } else {
                    replaced = true;
                    Some(test_files.join(" "))
                }
            } else {
                Some(tok.to_string())
            }
        })
        .collect();
    tokens.join(" ")
}

fn matches_test_pattern(path: &str) -> bool {
    let name = Path::new(path).file_name().and_then(|n| n.to_str()).unwrap_or(path);
    name.starts_with("test_")
        || name.ends_with("_test.py")
        || name.ends_with("_tests.rs")
        || name.ends_with(".test.ts")
        || name.ends_with(".test.js")
        || name.ends_with(".spec.ts")
        || path.contains("/tests/")
        || path.contains("/test/")
        || path.contains("/spec/")
}

/// Drop lint output lines that reference a test file, or (when `owned_files`
/// is set) that reference a file this module doesn't own. Returns an empty
/// string if nothing remains after filtering.
pub fn filter_test_file_lint(raw_output: &str, owned_files: Option<&[String]>) -> String {
    let file_line_re = Regex::new(r"^(\S+?):\d+").expect("static pattern");
    let filtered: Vec<&str> = raw_output
        .lines()
        .filter(|line| {
            let Some(caps) = file_line_re.captures(line) else {
                return true;
            };
            let file = &caps[1];
            if matches_test_pattern(file) {
                return false;
            }
            if let Some(owned) = owned_files {
                if !owned.iter().any(|o| o == file) {
                    return false;
                }
            }
            true
        })
        .collect();

    if filtered.iter().all(|l| file_line_re.find(l).is_none()) {
        return String::new();
    }
    filtered.join("\n")
}

/// Walk `project_root` (skipping `skip_dirs`) collecting files that match a
/// test-file naming convention and one of `extensions`.
pub fn discover_test_files(project_root: &Path, extensions: &[&str], skip_dirs: &[&str]) -> Vec<String> {
    let mut out = Vec::new();
    walk_for_tests(project_root, project_root, extensions, skip_dirs, &mut out);
    out
}

fn walk_for_tests(root: &Path, dir: &Path, extensions: &[&str], skip_dirs: &[&str], out: &mut Vec<String>) {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return;
    };
    for entry in entries.flatten() {
        let path = entry.path();
        let name = entry.file_name();
        let name = name.to_string_lossy();
        if path.is_dir() {
            if skip_dirs.contains(&name.as_ref()) || name.starts_with('.') {
                continue;
            }
            walk_for_tests(root, &path, extensions, skip_dirs, out);
        } else if extensions.iter().any(|ext| name.ends_with(ext)) {
            let rel = path.strip_prefix(root).unwrap_or(&path);
            let rel_str = rel.to_string_lossy().replace('\\', "/");
            if matches_test_pattern(&rel_str) {
                out.push(rel_str);
            }
        }
    }
}

/// Match discovered test files to a module by stem: `foo.rs`'s module test
/// is any discovered file whose stem (with a `test_`/`_test` affix
/// stripped) matches one of the module's owned file stems.
pub fn derive_module_test_files(all_test_files: &[String], owned_files: &[String]) -> Vec<String> {
    let owned_stems: Vec<String> = owned_files
        .iter()
        .filter_map(|f| Path::new(f).file_stem().map(|s| s.to_string_lossy().to_string()))
        .collect();

    all_test_files
        .iter()
        .filter(|test_file| {
            let Some(stem) = Path::new(test_file).file_stem().map(|s| s.to_string_lossy().to_string()) else {
                return false;
            };
            let bare = stem.strip_prefix("test_").or_else(|| stem.strip_suffix("_test")).or_else(|| stem.strip_suffix("_tests")).unwrap_or(&stem);
            owned_stems.iter().any(|o| o == bare || o == &stem)
        })
        .cloned()
        .collect()
}

/// Prepend the first existing `source_roots` directory to `path_env_var` in
/// a copy of the current environment, so a test runner can import modules
/// under e.g. `src/` without an installed package.
pub fn build_test_env(project_root: &Path, source_roots: &[&str], path_env_var: &str) -> HashMap<String, String> {
    let mut env: HashMap<String, String> = std::env::vars().collect();
    if path_env_var.is_empty() {
        return env;
    }
    if let Some(root) = source_roots.iter().map(|r| project_root.join(r)).find(|p| p.exists()) {
        let existing = env.get(path_env_var).cloned().unwrap_or_default();
        let joined = if existing.is_empty() {
            root.display().to_string()
        } else {
            format!("{}:{}", root.display(), existing)
        };
        env.insert(path_env_var.to_string(), joined);
    }
    env
}

/// True if `path`, relative to `project_root`, still exists on disk.
pub fn file_exists_relative(project_root: &Path, path: &str) -> bool {
    project_root.join(path).exists()
}

/// Walk `project_root` (skipping `skip_dirs`) collecting non-test source
/// files matching one of `extensions`. The inverse of [`discover_test_files`].
pub fn discover_source_files(project_root: &Path, extensions: &[&str], skip_dirs: &[&str]) -> Vec<String> {
    let mut out = Vec::new();
    walk_for_sources(project_root, project_root, extensions, skip_dirs, &mut out);
    out
}

fn walk_for_sources(root: &Path, dir: &Path, extensions: &[&str], skip_dirs: &[&str], out: &mut Vec<String>) {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return;
    };
    for entry in entries.flatten() {
        let path = entry.path();
        let name = entry.file_name();
        let name = name.to_string_lossy();
        if path.is_dir() {
            if skip_dirs.contains(&name.as_ref()) || name.starts_with('.') {
                continue;
            }
            walk_for_sources(root, &path, extensions, skip_dirs, out);
        } else if extensions.iter().any(|ext| name.ends_with(ext)) {
            let rel = path.strip_prefix(root).unwrap_or(&path);
            let rel_str = rel.to_string_lossy().replace('\\', "/");
            if !matches_test_pattern(&rel_str) {
                out.push(rel_str);
            }
        }
    }
}

#[cfg(test)]
#[path = "validate_helpers_tests.rs"]
mod tests;
