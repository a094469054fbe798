// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use forge_core::{Event, EventKind};

fn event(code: &str, timestamp: u64) -> Event {
    Event::new(EventKind::Message, code, timestamp)
}

#[test]
fn garbled_files_are_auto_deleted_and_reported() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("=3.0.0"), b"pip redirect artifact").unwrap();

    let findings = check_garbled_files(dir.path());
    assert_eq!(findings.len(), 1);
    assert_eq!(findings[0].category, "garbled_file");
    assert!(!dir.path().join("=3.0.0").exists());
}

#[test]
fn legit_double_extensions_are_not_flagged() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("button.test.ts"), b"test").unwrap();
    std::fs::write(dir.path().join("weird.foo.bar"), b"x").unwrap();

    let findings = check_corrupted_extensions(dir.path());
    assert_eq!(findings.len(), 1);
    assert_eq!(findings[0].file, "weird.foo.bar");
}

#[test]
fn stub_files_are_detected_by_content_marker() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("widget.rs"), b"// Module: widget\nimplementation required").unwrap();
    std::fs::write(dir.path().join("real.rs"), b"pub fn widget() {}").unwrap();

    let findings = check_stub_files(dir.path());
    assert_eq!(findings.len(), 1);
    assert_eq!(findings[0].file, "widget.rs");
}

#[test]
fn rebuild_signal_round_trips() {
    let dir = tempfile::tempdir().unwrap();
    assert_eq!(check_rebuild_signal(dir.path()), (false, String::new()));

    signal_rebuild(dir.path(), "stalled for 30 minutes");
    let (signaled, reason) = check_rebuild_signal(dir.path());
    assert!(signaled);
    assert_eq!(reason, "stalled for 30 minutes");

    clear_rebuild_signal(dir.path());
    assert_eq!(check_rebuild_signal(dir.path()), (false, String::new()));
}

#[test]
fn jump_exhaustion_rule_escalates_with_ratio() {
    assert!(rule_exhaustion(10, 50).is_empty());
    assert_eq!(rule_exhaustion(31, 50)[0].severity, "warning");
    assert_eq!(rule_exhaustion(41, 50)[0].severity, "error");
}

#[test]
fn load_watchdog_findings_empty_without_report() {
    let dir = tempfile::tempdir().unwrap();
    assert_eq!(load_watchdog_findings(dir.path()), "");
}

#[test]
fn first_word_splits_on_whitespace() {
    assert_eq!(first_word("cargo test --quiet"), Some("cargo"));
    assert_eq!(first_word(""), None);
}

#[test]
fn binary_on_path_finds_a_real_binary_and_rejects_nonsense() {
    assert!(binary_on_path("sh"));
    assert!(!binary_on_path("definitely-not-a-real-binary-xyz"));
}

#[test]
fn rule_tool_availability_flags_missing_binary() {
    let profile = LanguageProfile {
        language: crate::lang::Language::Python,
        extensions: &[".py"],
        test_command: "definitely-not-a-real-binary-xyz -m pytest",
        syntax_check_command: None,
        lint_commands: &[],
        lint_check_commands: &[],
        package_install_prefix: "",
        dev_dependencies: &[],
        skip_dirs: &[],
        manifest_files: &[],
        coverage_command: None,
        security_command: None,
        source_roots: &[],
        path_env_var: "PYTHONPATH",
    };

    let findings = rule_tool_availability(&profile);
    assert_eq!(findings.len(), 1);
    assert_eq!(findings[0].category, "tool_missing");
    assert_eq!(findings[0].file, "definitely-not-a-real-binary-xyz");
}

#[test]
fn rule_tool_availability_dedupes_repeated_binaries() {
    let profile = LanguageProfile {
        language: crate::lang::Language::Python,
        extensions: &[".py"],
        test_command: "sh -c test",
        syntax_check_command: Some("sh -c check"),
        lint_commands: &["sh -c lint"],
        lint_check_commands: &[],
        package_install_prefix: "",
        dev_dependencies: &[],
        skip_dirs: &[],
        manifest_files: &[],
        coverage_command: None,
        security_command: None,
        source_roots: &[],
        path_env_var: "PYTHONPATH",
    };

    assert!(rule_tool_availability(&profile).is_empty());
}

#[test]
fn rule_idle_agent_flags_long_readonly_run() {
    let saturated: Vec<Event> = (0..8).map(|i| event(codes::AGENT_TURN, i)).collect();
    assert_eq!(rule_idle_agent(&saturated).len(), 1);

    let reset: Vec<Event> = std::iter::once(event(codes::WORKFLOW_STAGE_DONE, 0)).chain((0..7).map(|i| event(codes::AGENT_TURN, i))).collect();
    assert!(rule_idle_agent(&reset).is_empty());
}

#[test]
fn rule_regression_needs_an_earlier_pass_before_the_recent_run_of_failures() {
    let all_failed: Vec<Event> = (0..4).map(|i| event(codes::VALIDATE_FAILED, i)).collect();
    assert!(rule_regression(&all_failed).is_empty());

    let regressed = vec![
        event(codes::VALIDATE_PASSED, 0),
        event(codes::VALIDATE_FAILED, 1),
        event(codes::VALIDATE_FAILED, 2),
        event(codes::VALIDATE_FAILED, 3),
    ];
    let findings = rule_regression(&regressed);
    assert_eq!(findings.len(), 1);
    assert_eq!(findings[0].category, "regression");
}

#[test]
fn rule_stall_escalates_from_warning_to_error_with_elapsed_time() {
    let events = vec![event(codes::WORKFLOW_STAGE_DONE, 0)];

    assert!(rule_stall(&events, 1_000).is_empty());

    let warning = rule_stall(&events, STALL_WARN_MS + 1);
    assert_eq!(warning[0].severity, "warning");

    let error = rule_stall(&events, STALL_WARN_MS * 2 + 1);
    assert_eq!(error[0].severity, "error");
}

#[test]
fn drain_bus_events_returns_replayed_and_live_events() {
    let bus = forge_core::EventBus::new();
    bus.publish(event(codes::WORKFLOW_STAGE_DONE, 1));
    bus.publish(event(codes::AGENT_TURN, 2));

    let events = drain_bus_events(&bus);
    assert_eq!(events.len(), 2);
    assert_eq!(events[0].code, codes::WORKFLOW_STAGE_DONE);
    assert_eq!(events[1].code, codes::AGENT_TURN);
}
