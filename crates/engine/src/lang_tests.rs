// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use tempfile::tempdir;

#[test]
fn detects_rust_from_cargo_toml() {
    let dir = tempdir().unwrap();
    std::fs::write(dir.path().join("Cargo.toml"), "[package]\nname=\"x\"").unwrap();
    assert_eq!(detect_language(dir.path()), Language::Rust);
}

#[test]
fn detects_python_from_pyproject() {
    let dir = tempdir().unwrap();
    std::fs::write(dir.path().join("pyproject.toml"), "").unwrap();
    assert_eq!(detect_language(dir.path()), Language::Python);
}

#[test]
fn falls_back_to_extension_scan_when_no_manifest_present() {
    let dir = tempdir().unwrap();
    std::fs::write(dir.path().join("main.go"), "package main").unwrap();
    std::fs::write(dir.path().join("util.go"), "package main").unwrap();
    assert_eq!(detect_language(dir.path()), Language::Go);
}

#[test]
fn unknown_when_directory_is_empty() {
    let dir = tempdir().unwrap();
    assert_eq!(detect_language(dir.path()), Language::Unknown);
}

#[test]
fn get_profile_returns_matching_test_command() {
    assert_eq!(get_profile(Language::Python).test_command, "python3 -m pytest -v --tb=long -x");
    assert_eq!(get_profile(Language::Rust).test_command, "cargo test");
}
