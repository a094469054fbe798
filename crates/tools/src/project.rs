// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `InstallPackage` and `InitProject`: higher-level helpers that shell out
//! to whichever package manager the workspace's manifest files imply.

use std::path::Path;
use std::time::Duration;

use crate::bash::{self, BashResult};
use crate::error::ToolError;

/// Manifest file to install-command-prefix, checked in order; the first
/// manifest found in `workdir` decides the package manager.
const MANIFEST_COMMANDS: &[(&str, &str)] = &[
    ("Cargo.toml", "cargo add"),
    ("package.json", "npm install"),
    ("pyproject.toml", "pip install"),
    ("requirements.txt", "pip install"),
    ("go.mod", "go get"),
];

fn detect_install_command(workdir: &Path) -> Result<&'static str, ToolError> {
    for (manifest, command) in MANIFEST_COMMANDS {
        if workdir.join(manifest).exists() {
            return Ok(command);
        }
    }
    Err(ToolError::BadArguments(
        "no recognized project manifest found to determine a package manager".to_string(),
    ))
}

pub async fn install_package(workdir: &Path, package_name: &str, timeout: Duration) -> Result<BashResult, ToolError> {
    let prefix = detect_install_command(workdir)?;
    bash::run(&format!("{prefix} {package_name}"), Some(workdir), timeout).await
}

/// Initialize a new project at `path`. Only scaffolds a Rust binary crate
/// today via `cargo init`; other languages are left to the caller's own
/// setup conventions.
pub async fn init_project(path: &Path, timeout: Duration) -> Result<BashResult, ToolError> {
    tokio::fs::create_dir_all(path)
        .await
        .map_err(|e| ToolError::Io(e.to_string()))?;
    bash::run("cargo init --name project .", Some(path), timeout).await
}

#[cfg(test)]
#[path = "project_tests.rs"]
mod tests;
