// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Quality Gate data model: the five scored pillars plus the pass/fail
//! completeness check, and the report QualityTask assembles from them.

use serde::{Deserialize, Serialize};

use forge_core::constants::{QUALITY_THRESHOLD_MAX, QUALITY_THRESHOLD_MIN};

pub const PRINCIPLE_TESTED: &str = "tested";
pub const PRINCIPLE_READABLE: &str = "readable";
pub const PRINCIPLE_UNDERSTANDABLE: &str = "understandable";
pub const PRINCIPLE_SECURED: &str = "secured";
pub const PRINCIPLE_TRACKABLE: &str = "trackable";
pub const PRINCIPLE_COMPLETENESS: &str = "completeness";

/// Weight of each scored pillar in the aggregate score. Completeness is a
/// pass/fail gate, not a scored pillar, so it carries zero weight here.
pub const PRINCIPLE_WEIGHTS: &[(&str, f64)] = &[
    (PRINCIPLE_TESTED, 0.30),
    (PRINCIPLE_READABLE, 0.15),
    (PRINCIPLE_UNDERSTANDABLE, 0.15),
    (PRINCIPLE_SECURED, 0.25),
    (PRINCIPLE_TRACKABLE, 0.15),
];

/// Default score a project must meet or exceed to pass the gate.
pub const PASS_SCORE_THRESHOLD: f64 = 0.70;

/// Clamp a configured quality threshold into the allowed range.
pub fn clamp_threshold(threshold: f64) -> f64 {
    threshold.clamp(QUALITY_THRESHOLD_MIN, QUALITY_THRESHOLD_MAX)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Error,
    Warning,
    Hint,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Issue {
    pub file: Option<String>,
    pub line: Option<u32>,
    pub severity: Severity,
    pub message: String,
    pub rule: Option<String>,
}

impl Issue {
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            file: None,
            line: None,
            severity: Severity::Error,
            message: message.into(),
            rule: None,
        }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            file: None,
            line: None,
            severity: Severity::Warning,
            message: message.into(),
            rule: None,
        }
    }

    pub fn hint(message: impl Into<String>) -> Self {
        Self {
            file: None,
            line: None,
            severity: Severity::Hint,
            message: message.into(),
            rule: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrincipleResult {
    pub name: String,
    pub passed: bool,
    pub score: f64,
    pub issues: Vec<Issue>,
}

impl PrincipleResult {
    pub fn new(name: impl Into<String>, passed: bool, score: f64, issues: Vec<Issue>) -> Self {
        Self {
            name: name.into(),
            passed,
            score: score.clamp(0.0, 1.0),
            issues,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QualityReport {
    pub passed: bool,
    pub score: f64,
    pub principles: Vec<PrincipleResult>,
    pub total_errors: u32,
    pub total_warnings: u32,
    pub coverage_pct: Option<f64>,
}

impl QualityReport {
    /// Assemble a report from the five scored pillars plus the completeness
    /// gate. Aggregate score is the weighted sum of the scored pillars;
    /// `passed` additionally requires completeness to have passed.
    pub fn assemble(
        scored: Vec<PrincipleResult>,
        completeness: PrincipleResult,
        threshold: f64,
        coverage_pct: Option<f64>,
    ) -> Self {
        let threshold = clamp_threshold(threshold);
        let mut score = 0.0;
        let mut total_errors = 0;
        let mut total_warnings = 0;

        for principle in &scored {
            let weight = PRINCIPLE_WEIGHTS
                .iter()
                .find(|(name, _)| *name == principle.name)
                .map(|(_, w)| *w)
                .unwrap_or(0.0);
            score += principle.score * weight;
            for issue in &principle.issues {
                match issue.severity {
                    Severity::Error => total_errors += 1,
                    Severity::Warning => total_warnings += 1,
                    Severity::Hint => {}
                }
            }
        }
        for issue in &completeness.issues {
            match issue.severity {
                Severity::Error => total_errors += 1,
                Severity::Warning => total_warnings += 1,
                Severity::Hint => {}
            }
        }

        let mut principles = scored;
        let completeness_passed = completeness.passed;
        principles.push(completeness);

        Self {
            passed: completeness_passed && score >= threshold,
            score,
            principles,
            total_errors,
            total_warnings,
            coverage_pct,
        }
    }
}

#[cfg(test)]
#[path = "quality_tests.rs"]
mod tests;
