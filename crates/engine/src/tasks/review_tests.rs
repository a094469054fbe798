// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn parses_well_formed_findings_block() {
    let raw = r#"Some preamble text.

<!-- REVIEW_FINDINGS JSON
{"findings": [{"severity": "error", "category": "security", "file": "src/lib.rs", "line": 12, "description": "unchecked index"}],
 "summary_score": 0.4, "total_errors": 1, "total_warnings": 0, "total_info": 0}
-->
"#;
    let report = parse_review_findings(raw);
    assert_eq!(report.findings.len(), 1);
    assert_eq!(report.findings[0].category, "security");
    assert_eq!(report.total_errors, 1);
    assert!((report.summary_score - 0.4).abs() < f64::EPSILON);
}

#[test]
fn missing_findings_block_is_advisory_only() {
    let report = parse_review_findings("the reviewer just rambled with no block");
    assert_eq!(report.findings.len(), 1);
    assert_eq!(report.total_errors, 0);
    assert!((report.summary_score - 0.7).abs() < f64::EPSILON);
}

#[test]
fn malformed_json_block_is_advisory_only() {
    let raw = "<!-- REVIEW_FINDINGS JSON\nnot actually json\n-->";
    let report = parse_review_findings(raw);
    assert_eq!(report.findings.len(), 1);
    assert_eq!(report.findings[0].description, "Review produced malformed JSON — treating as advisory.");
}

#[test]
fn repair_feedback_only_lists_errors() {
    let report = ReviewReport {
        findings: vec![
            ReviewFinding { severity: "error".to_string(), category: "security".to_string(), file: "a.rs".to_string(), line: 3, description: "bad".to_string() },
            ReviewFinding { severity: "warning".to_string(), category: "performance".to_string(), file: "b.rs".to_string(), line: 9, description: "slow".to_string() },
        ],
        summary_score: 0.2,
        total_errors: 1,
        total_warnings: 1,
        total_info: 0,
    };
    let feedback = format_repair_feedback(&report);
    assert!(feedback.contains("bad"));
    assert!(!feedback.contains("slow"));
}
