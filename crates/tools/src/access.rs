// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! File-level access control checked before any write/edit dispatch.
//!
//! Pure predicate functions over paths, grounded on the same attempt-guard
//! shape as `forge_core`'s action tracking: a testable check performed
//! before the side-effecting call, never a panic.

use std::path::{Path, PathBuf};

use crate::error::ToolError;

/// Default glob patterns treated as test files when `deny_test_patterns` is set.
const DEFAULT_TEST_PATTERNS: &[&str] = &[
    "**/test_*.py",
    "**/*_test.py",
    "**/tests/**",
    "**/*_tests.rs",
    "**/*.test.ts",
    "**/*.test.js",
    "**/*.spec.ts",
];

#[derive(Debug, Clone, Default)]
pub struct AccessControl {
    /// If set, writes/edits are confined to these paths (repair agents scoped
    /// to a parallel pipeline's owned files).
    pub owned_files: Option<Vec<PathBuf>>,
    /// Writes/edits to these paths are always rejected regardless of `owned_files`.
    pub denied_files: Vec<PathBuf>,
    /// When true, paths matching [`DEFAULT_TEST_PATTERNS`] are denied even if
    /// they are in `owned_files` (a repairer must not rewrite the tests it is
    /// being graded against).
    pub deny_test_patterns: bool,
}

impl AccessControl {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_owned_files(mut self, files: Vec<PathBuf>) -> Self {
        self.owned_files = Some(files);
        self
    }

    pub fn with_denied_files(mut self, files: Vec<PathBuf>) -> Self {
        self.denied_files = files;
        self
    }

    pub fn with_deny_test_patterns(mut self, deny: bool) -> Self {
        self.deny_test_patterns = deny;
        self
    }

    /// Check whether `path` may be written or edited. Never panics; returns
    /// a structured [`ToolError::AccessDenied`] so the caller can render it
    /// back to the LLM.
    pub fn check_write(&self, path: &Path) -> Result<(), ToolError> {
        if self.deny_test_patterns && is_test_path(path) {
            return Err(ToolError::AccessDenied(format!(
                "{} matches a test file pattern and cannot be modified",
                path.display()
            )));
        }

        if self.denied_files.iter().any(|denied| paths_match(denied, path)) {
            return Err(ToolError::AccessDenied(format!(
                "{} is in the denied_files list",
                path.display()
            )));
        }

        if let Some(owned) = &self.owned_files {
            if !owned.iter().any(|o| paths_match(o, path)) {
                return Err(ToolError::AccessDenied(format!(
                    "{} is not in the owned_files list",
                    path.display()
                )));
            }
        }

        Ok(())
    }
}

fn paths_match(candidate: &Path, path: &Path) -> bool {
    candidate == path
}

fn is_test_path(path: &Path) -> bool {
    let as_str = path.to_string_lossy().replace('\\', "/");
    DEFAULT_TEST_PATTERNS.iter().any(|pattern| {
        glob::Pattern::new(pattern)
            .map(|p| p.matches(&as_str))
            .unwrap_or(false)
    })
}

#[cfg(test)]
#[path = "access_tests.rs"]
mod tests;
