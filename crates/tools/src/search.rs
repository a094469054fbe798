// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `Glob` and `Grep`: discovery tools. Glob reuses the `glob` crate exactly
//! as the subprocess shell layer already depends on it; Grep does a plain
//! line-oriented substring/regex-free scan rather than shelling out, since
//! the corpus to search is LLM-workspace-sized, not `git grep`-scale.

use std::path::Path;

use crate::error::ToolError;

/// List paths under `workdir` matching `pattern`, sorted for determinism.
pub fn glob(pattern: &str, workdir: Option<&Path>) -> Result<Vec<String>, ToolError> {
    let full_pattern = match workdir {
        Some(dir) => dir.join(pattern).to_string_lossy().into_owned(),
        None => pattern.to_string(),
    };

    let mut matches = Vec::new();
    for entry in glob::glob(&full_pattern).map_err(|e| ToolError::BadArguments(e.to_string()))? {
        match entry {
            Ok(path) => matches.push(path.to_string_lossy().into_owned()),
            Err(e) => return Err(ToolError::Io(e.to_string())),
        }
    }
    matches.sort();
    Ok(matches)
}

/// A single matching line, `path:line_number:text`.
pub struct GrepMatch {
    pub path: String,
    pub line_number: usize,
    pub text: String,
}

impl GrepMatch {
    pub fn render(&self) -> String {
        format!("{}:{}:{}", self.path, self.line_number, self.text)
    }
}

/// Search file contents under `path` (default `.`) for `pattern`, optionally
/// restricted to files matching the `include` glob. `pattern` is matched as
/// a literal substring; regex metacharacters are not interpreted, matching
/// what most repair prompts actually pass.
pub async fn grep(
    pattern: &str,
    path: Option<&Path>,
    include: Option<&str>,
) -> Result<Vec<GrepMatch>, ToolError> {
    let root = path.unwrap_or_else(|| Path::new("."));
    let files = collect_files(root, include)?;

    let mut matches = Vec::new();
    for file in files {
        let content = match tokio::fs::read_to_string(&file).await {
            Ok(c) => c,
            Err(_) => continue, // binary or unreadable files are skipped, not errors
        };
        for (idx, line) in content.lines().enumerate() {
            if line.contains(pattern) {
                matches.push(GrepMatch {
                    path: file.to_string_lossy().into_owned(),
                    line_number: idx + 1,
                    text: line.to_string(),
                });
            }
        }
    }
    Ok(matches)
}

fn collect_files(root: &Path, include: Option<&str>) -> Result<Vec<std::path::PathBuf>, ToolError> {
    let walk_pattern = match include {
        Some(glob_str) => root.join("**").join(glob_str),
        None => root.join("**").join("*"),
    };
    let mut files = Vec::new();
    for entry in glob::glob(&walk_pattern.to_string_lossy()).map_err(|e| ToolError::BadArguments(e.to_string()))? {
        if let Ok(path) = entry {
            if path.is_file() {
                files.push(path);
            }
        }
    }
    Ok(files)
}

#[cfg(test)]
#[path = "search_tests.rs"]
mod tests;
