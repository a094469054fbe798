// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

fn principle(name: &str, passed: bool, score: f64) -> PrincipleResult {
    PrincipleResult::new(name, passed, score, Vec::new())
}

#[test]
fn assemble_weights_scored_pillars() {
    let scored = vec![
        principle(PRINCIPLE_TESTED, true, 1.0),
        principle(PRINCIPLE_READABLE, true, 1.0),
        principle(PRINCIPLE_UNDERSTANDABLE, true, 1.0),
        principle(PRINCIPLE_SECURED, true, 1.0),
        principle(PRINCIPLE_TRACKABLE, true, 1.0),
    ];
    let completeness = principle(PRINCIPLE_COMPLETENESS, true, 1.0);
    let report = QualityReport::assemble(scored, completeness, PASS_SCORE_THRESHOLD, None);
    assert!((report.score - 1.0).abs() < 1e-9);
    assert!(report.passed);
}

#[test]
fn failing_completeness_fails_the_gate_even_with_a_perfect_score() {
    let scored = vec![
        principle(PRINCIPLE_TESTED, true, 1.0),
        principle(PRINCIPLE_READABLE, true, 1.0),
        principle(PRINCIPLE_UNDERSTANDABLE, true, 1.0),
        principle(PRINCIPLE_SECURED, true, 1.0),
        principle(PRINCIPLE_TRACKABLE, true, 1.0),
    ];
    let mut completeness = principle(PRINCIPLE_COMPLETENESS, false, 0.0);
    completeness.issues.push(Issue::error("missing manifest"));
    let report = QualityReport::assemble(scored, completeness, PASS_SCORE_THRESHOLD, None);
    assert!(!report.passed);
    assert_eq!(report.total_errors, 1);
}

#[test]
fn clamp_threshold_respects_bounds() {
    assert_eq!(clamp_threshold(-1.0), QUALITY_THRESHOLD_MIN);
    assert_eq!(clamp_threshold(5.0), QUALITY_THRESHOLD_MAX);
    assert_eq!(clamp_threshold(0.5), 0.5);
}
