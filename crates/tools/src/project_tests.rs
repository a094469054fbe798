// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use tempfile::tempdir;

#[test]
fn detects_cargo_manifest() {
    let dir = tempdir().unwrap();
    std::fs::write(dir.path().join("Cargo.toml"), "").unwrap();
    assert_eq!(detect_install_command(dir.path()).unwrap(), "cargo add");
}

#[test]
fn detects_npm_manifest() {
    let dir = tempdir().unwrap();
    std::fs::write(dir.path().join("package.json"), "").unwrap();
    assert_eq!(detect_install_command(dir.path()).unwrap(), "npm install");
}

#[test]
fn unrecognized_manifest_is_a_bad_argument() {
    let dir = tempdir().unwrap();
    let err = detect_install_command(dir.path()).unwrap_err();
    assert!(matches!(err, ToolError::BadArguments(_)));
}

#[tokio::test]
async fn install_package_runs_the_detected_command() {
    let dir = tempdir().unwrap();
    std::fs::write(dir.path().join("package.json"), "{}").unwrap();
    // `npm` need not be installed for this assertion; bash still reports a
    // non-zero exit rather than the tool layer raising.
    let result = install_package(dir.path(), "left-pad", Duration::from_secs(5)).await;
    assert!(result.is_ok());
}
