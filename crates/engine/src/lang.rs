// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-language tooling profiles: which commands SetupTask/ValidateTask/
//! RepairTask/the Quality Gate run to install dependencies, check syntax,
//! lint, test, measure coverage, and scan for security issues.
//!
//! Detection prefers manifest files (`Cargo.toml`, `package.json`, ...)
//! over a directory scan, since a manifest is unambiguous and a scan is a
//! heuristic fallback for a project with no recognized manifest yet.

use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Language {
    Rust,
    Python,
    Go,
    TypeScript,
    JavaScript,
    Unknown,
}

impl Language {
    pub fn as_str(self) -> &'static str {
        match self {
            Language::Rust => "rust",
            Language::Python => "python",
            Language::Go => "go",
            Language::TypeScript => "typescript",
            Language::JavaScript => "javascript",
            Language::Unknown => "unknown",
        }
    }
}

/// Everything a Stage Task needs to act on a project written in one language.
#[derive(Debug, Clone)]
pub struct LanguageProfile {
    pub language: Language,
    pub extensions: &'static [&'static str],
    pub test_command: &'static str,
    pub syntax_check_command: Option<&'static str>,
    pub lint_commands: &'static [&'static str],
    pub lint_check_commands: &'static [&'static str],
    pub package_install_prefix: &'static str,
    pub dev_dependencies: &'static [&'static str],
    pub skip_dirs: &'static [&'static str],
    pub manifest_files: &'static [&'static str],
    pub coverage_command: Option<&'static str>,
    pub security_command: Option<&'static str>,
    pub source_roots: &'static [&'static str],
    pub path_env_var: &'static str,
}

const RUST: LanguageProfile = LanguageProfile {
    language: Language::Rust,
    extensions: &[".rs"],
    test_command: "cargo test",
    syntax_check_command: Some("cargo check"),
    lint_commands: &["cargo fmt", "cargo clippy --fix --allow-dirty"],
    lint_check_commands: &["cargo clippy --message-format=short"],
    package_install_prefix: "cargo add",
    dev_dependencies: &[],
    skip_dirs: &["target"],
    manifest_files: &["Cargo.toml"],
    coverage_command: Some("cargo llvm-cov --summary-only"),
    security_command: Some("cargo audit --json"),
    source_roots: &["src"],
    path_env_var: "",
};

const PYTHON: LanguageProfile = LanguageProfile {
    language: Language::Python,
    extensions: &[".py"],
    test_command: "python3 -m pytest -v --tb=long -x",
    syntax_check_command: Some("python3 -m compileall -q ."),
    lint_commands: &["ruff check --fix", "black ."],
    lint_check_commands: &["python3 -m ruff check --output-format=concise ."],
    package_install_prefix: "pip install",
    dev_dependencies: &["pytest", "ruff", "black"],
    skip_dirs: &["__pycache__", ".venv", "venv", ".tox", ".nox", ".eggs"],
    manifest_files: &["pyproject.toml", "requirements.txt", "setup.py"],
    coverage_command: Some(
        "python3 -m pytest --cov=. --cov-report=term-missing -q --ignore=.venv --ignore=venv",
    ),
    security_command: Some(
        "python3 -m bandit -r . -q -f json --exclude .venv,venv,.tox,.nox,.eggs,tests,test",
    ),
    source_roots: &["src", "lib"],
    path_env_var: "PYTHONPATH",
};

const GO: LanguageProfile = LanguageProfile {
    language: Language::Go,
    extensions: &[".go"],
    test_command: "go test -v -race ./...",
    syntax_check_command: Some("go vet ./..."),
    lint_commands: &["gofmt -w .", "go vet ./..."],
    lint_check_commands: &["gofmt -l .", "go vet ./... 2>&1"],
    package_install_prefix: "go get",
    dev_dependencies: &[],
    skip_dirs: &["vendor"],
    manifest_files: &["go.mod", "go.sum"],
    coverage_command: Some("go test -coverprofile=coverage.out -covermode=atomic ./..."),
    security_command: Some("gosec -fmt=json -quiet -exclude-dir=vendor ./..."),
    source_roots: &[],
    path_env_var: "",
};

const TYPESCRIPT: LanguageProfile = LanguageProfile {
    language: Language::TypeScript,
    extensions: &[".ts", ".tsx"],
    test_command: "npx jest --verbose",
    syntax_check_command: Some("npx tsc --noEmit"),
    lint_commands: &["npx eslint --fix .", "npx prettier --write ."],
    lint_check_commands: &["npx eslint --format=unix ."],
    package_install_prefix: "npm install",
    dev_dependencies: &[],
    skip_dirs: &["node_modules", "dist", ".next"],
    manifest_files: &["package.json", "tsconfig.json"],
    coverage_command: Some("npx jest --coverage --coverageReporters=text"),
    security_command: Some("npx audit-ci --moderate"),
    source_roots: &[],
    path_env_var: "",
};

const JAVASCRIPT: LanguageProfile = LanguageProfile {
    language: Language::JavaScript,
    extensions: &[".js", ".jsx"],
    test_command: "npx jest --verbose",
    syntax_check_command: None,
    lint_commands: &["npx eslint --fix .", "npx prettier --write ."],
    lint_check_commands: &["npx eslint --format=unix ."],
    package_install_prefix: "npm install",
    dev_dependencies: &[],
    skip_dirs: &["node_modules", "dist"],
    manifest_files: &["package.json"],
    coverage_command: Some("npx jest --coverage --coverageReporters=text"),
    security_command: Some("npx audit-ci --moderate"),
    source_roots: &[],
    path_env_var: "",
};

pub fn get_profile(language: Language) -> &'static LanguageProfile {
    match language {
        Language::Rust => &RUST,
        Language::Python => &PYTHON,
        Language::Go => &GO,
        Language::TypeScript => &TYPESCRIPT,
        Language::JavaScript => &JAVASCRIPT,
        Language::Unknown => &RUST,
    }
}

/// Detect a project's language: manifest files first (unambiguous), then an
/// extension-count scan of the top-level directory as a fallback.
pub fn detect_language(project_root: &Path) -> Language {
    for profile in [&RUST, &PYTHON, &GO, &TYPESCRIPT, &JAVASCRIPT] {
        if profile
            .manifest_files
            .iter()
            .any(|m| project_root.join(m).exists())
        {
            return profile.language;
        }
    }
    detect_by_extensions(project_root)
}

fn detect_by_extensions(project_root: &Path) -> Language {
    let Ok(entries) = std::fs::read_dir(project_root) else {
        return Language::Unknown;
    };

    let mut counts: std::collections::HashMap<Language, u32> = std::collections::HashMap::new();
    for entry in entries.flatten() {
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        for profile in [&RUST, &PYTHON, &GO, &TYPESCRIPT, &JAVASCRIPT] {
            if profile.extensions.iter().any(|ext| name.ends_with(ext)) {
                *counts.entry(profile.language).or_insert(0) += 1;
            }
        }
    }

    counts
        .into_iter()
        .max_by_key(|(_, count)| *count)
        .map(|(lang, _)| lang)
        .unwrap_or(Language::Unknown)
}

#[cfg(test)]
#[path = "lang_tests.rs"]
mod tests;
