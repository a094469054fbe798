// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use tempfile::tempdir;

#[test]
fn parse_command_wraps_shell_metachars_in_sh_c() {
    assert_eq!(parse_command("cargo test && cargo clippy"), ParsedCommand::Shell("cargo test && cargo clippy".to_string()));
}

#[test]
fn parse_command_wraps_env_prefixed_commands() {
    assert_eq!(parse_command("RUST_LOG=debug cargo test"), ParsedCommand::Shell("RUST_LOG=debug cargo test".to_string()));
}

#[test]
fn parse_command_splits_plain_argv() {
    assert_eq!(parse_command("cargo test --workspace"), ParsedCommand::Argv(vec!["cargo".to_string(), "test".to_string(), "--workspace".to_string()]));
}

#[test]
fn count_tests_sums_pytest_and_generic_patterns() {
    let output = "12 passed, 0 failed\nsome noise\n3 tests passed\n";
    assert_eq!(count_tests(output), 15);
}

#[test]
fn count_tests_handles_go_ok_line_without_digits() {
    let output = "ok      example.com/mod  0.004s\n";
    assert_eq!(count_tests(output), 1);
}

#[test]
fn scope_test_command_substitutes_directory_token() {
    let scoped = scope_test_command("pytest tests/ -v", &["tests/test_a.py".to_string(), "tests/test_b.py".to_string()]);
    assert_eq!(scoped, "pytest tests/test_a.py tests/test_b.py -v");
}

#[test]
fn scope_test_command_is_noop_with_no_test_files() {
    assert_eq!(scope_test_command("pytest tests/ -v", &[]), "pytest tests/ -v");
}

#[test]
fn filter_test_file_lint_drops_lines_referencing_test_files() {
    let raw = "src/lib.rs:10 unused variable\ntests/foo_test.py:3 unused import\n";
    let filtered = filter_test_file_lint(raw, None);
    assert!(filtered.contains("src/lib.rs"));
    assert!(!filtered.contains("foo_test.py"));
}

#[test]
fn filter_test_file_lint_drops_unowned_files_in_module_scope() {
    let raw = "src/owned.rs:1 issue\nsrc/other.rs:2 issue\n";
    let owned = vec!["src/owned.rs".to_string()];
    let filtered = filter_test_file_lint(raw, Some(&owned));
    assert!(filtered.contains("owned.rs"));
    assert!(!filtered.contains("other.rs"));
}

#[test]
fn filter_test_file_lint_returns_empty_when_nothing_survives() {
    let raw = "tests/test_a.py:1 issue\n";
    assert_eq!(filter_test_file_lint(raw, None), "");
}

#[test]
fn discover_test_files_finds_conventionally_named_files_and_skips_dirs() {
    let dir = tempdir().unwrap();
    std::fs::create_dir_all(dir.path().join("tests")).unwrap();
    std::fs::write(dir.path().join("tests/test_a.py"), "").unwrap();
    std::fs::create_dir_all(dir.path().join(".venv")).unwrap();
    std::fs::write(dir.path().join(".venv/test_ignored.py"), "").unwrap();
    let found = discover_test_files(dir.path(), &[".py"], &[".venv"]);
    assert_eq!(found, vec!["tests/test_a.py".to_string()]);
}

#[test]
fn derive_module_test_files_matches_by_stripped_stem() {
    let all = vec!["tests/test_foo.py".to_string(), "tests/test_bar.py".to_string()];
    let owned = vec!["src/foo.py".to_string()];
    assert_eq!(derive_module_test_files(&all, &owned), vec!["tests/test_foo.py".to_string()]);
}

#[test]
fn build_test_env_prepends_first_existing_source_root() {
    let dir = tempdir().unwrap();
    std::fs::create_dir_all(dir.path().join("src")).unwrap();
    let env = build_test_env(dir.path(), &["src", "lib"], "PYTHONPATH");
    let value = env.get("PYTHONPATH").cloned().unwrap_or_default();
    assert!(value.contains("src"));
}

#[test]
fn build_test_env_is_passthrough_without_a_path_env_var() {
    let dir = tempdir().unwrap();
    let env = build_test_env(dir.path(), &["src"], "");
    assert!(!env.is_empty());
}
