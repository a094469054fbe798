// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::quality::{Issue, PrincipleResult};

#[test]
fn failure_summary_lists_only_failed_principles() {
    let report = QualityReport::assemble(
        vec![
            PrincipleResult::new("tested", false, 0.2, vec![Issue::error("tests failed (exit 1)")]),
            PrincipleResult::new("readable", true, 1.0, vec![]),
            PrincipleResult::new("understandable", true, 1.0, vec![]),
            PrincipleResult::new("secured", true, 1.0, vec![]),
            PrincipleResult::new("trackable", true, 1.0, vec![]),
        ],
        PrincipleResult::new("completeness", true, 1.0, vec![]),
        0.70,
        None,
    );
    assert!(!report.passed);

    let summary = report
        .principles
        .iter()
        .filter(|p| !p.passed)
        .map(|p| format!("{}: {}", p.name, p.issues.iter().map(|i| i.message.clone()).collect::<Vec<_>>().join("; ")))
        .collect::<Vec<_>>()
        .join("\n");
    assert!(summary.contains("tested"));
    assert!(!summary.contains("readable"));
}

#[test]
fn partial_accept_retries_when_attempts_and_score_have_room() {
    assert_eq!(partial_accept_reason(0.5, 0, 3, None), None);
    assert_eq!(partial_accept_reason(0.5, 0, 3, Some(0.2)), None);
}

#[test]
fn partial_accept_fires_at_attempt_limit() {
    assert_eq!(partial_accept_reason(0.5, 2, 3, Some(0.2)), Some("quality attempt limit reached"));
}

#[test]
fn partial_accept_fires_on_stagnant_score() {
    assert_eq!(
        partial_accept_reason(0.501, 0, 3, Some(0.5)),
        Some("score stopped improving across repair attempts")
    );
}

#[test]
fn passing_report_needs_no_jump_target() {
    let report = QualityReport::assemble(
        vec![
            PrincipleResult::new("tested", true, 1.0, vec![]),
            PrincipleResult::new("readable", true, 1.0, vec![]),
            PrincipleResult::new("understandable", true, 1.0, vec![]),
            PrincipleResult::new("secured", true, 1.0, vec![]),
            PrincipleResult::new("trackable", true, 1.0, vec![]),
        ],
        PrincipleResult::new("completeness", true, 1.0, vec![]),
        0.70,
        None,
    );
    assert!(report.passed);
}
