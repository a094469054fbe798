// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `Read`, `Write`, `Edit`, and `ReadFiles`.

use std::collections::BTreeMap;
use std::path::Path;

use crate::access::AccessControl;
use crate::error::ToolError;

/// Read a file, optionally slicing by 1-indexed line `offset`/`limit`.
pub async fn read(path: &Path, offset: Option<usize>, limit: Option<usize>) -> Result<String, ToolError> {
    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| read_error(path, e))?;

    match (offset, limit) {
        (None, None) => Ok(content),
        (offset, limit) => {
            let start = offset.unwrap_or(1).max(1) - 1;
            let lines: Vec<&str> = content.lines().collect();
            if start >= lines.len() {
                return Ok(String::new());
            }
            let end = match limit {
                Some(n) => (start + n).min(lines.len()),
                None => lines.len(),
            };
            Ok(lines[start..end].join("\n"))
        }
    }
}

/// Read several files at once, returning a path-to-content mapping. Files
/// that fail to read get an `"Error: ..."` string as their value rather than
/// aborting the whole batch.
pub async fn read_files(paths: &[String]) -> BTreeMap<String, String> {
    let mut out = BTreeMap::new();
    for p in paths {
        let path = Path::new(p);
        let value = match tokio::fs::read_to_string(path).await {
            Ok(content) => content,
            Err(e) => read_error(path, e).to_tool_result(),
        };
        out.insert(p.clone(), value);
    }
    out
}

/// Overwrite `path` with `content`, subject to `access`.
pub async fn write(access: &AccessControl, path: &Path, content: &str) -> Result<(), ToolError> {
    access.check_write(path)?;
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| ToolError::Io(e.to_string()))?;
        }
    }
    tokio::fs::write(path, content)
        .await
        .map_err(|e| ToolError::Io(e.to_string()))
}

/// Replace a unique occurrence of `old_string` with `new_string` in `path`.
pub async fn edit(
    access: &AccessControl,
    path: &Path,
    old_string: &str,
    new_string: &str,
) -> Result<(), ToolError> {
    access.check_write(path)?;
    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| read_error(path, e))?;

    let occurrences = content.matches(old_string).count();
    if occurrences == 0 {
        return Err(ToolError::BadArguments(format!(
            "old_string not found in {}",
            path.display()
        )));
    }
    if occurrences > 1 {
        return Err(ToolError::BadArguments(format!(
            "old_string appears {occurrences} times in {}, must be unique",
            path.display()
        )));
    }

    let updated = content.replacen(old_string, new_string, 1);
    tokio::fs::write(path, updated)
        .await
        .map_err(|e| ToolError::Io(e.to_string()))
}

fn read_error(path: &Path, e: std::io::Error) -> ToolError {
    if e.kind() == std::io::ErrorKind::NotFound {
        ToolError::NotFound(path.display().to_string())
    } else {
        ToolError::Io(format!("{}: {e}", path.display()))
    }
}

#[cfg(test)]
#[path = "fs_tools_tests.rs"]
mod tests;
