// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Stage: one node in a workflow DAG, plus the documented allow-list table
//! that drives context propagation on a jump.
//!
//! Per the design notes, propagation is a single table-driven copy rather
//! than ad-hoc field assignment at every jump call site: every Task that
//! builds a `jump_to` override dict starts from [`build_jump_overrides`],
//! which copies the allow-listed keys from the source stage's context, and
//! layers caller-supplied overrides *after* that copy so fresh values never
//! get clobbered by stale ones.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Keys copied from the source stage's context into a jump's override dict
/// before destination-specific overrides are layered on top.
///
/// Missing a key here (or applying overrides before this copy) is exactly
/// the bug the design notes call out as causing infinite loops.
pub const PROPAGATED_CONTEXT_KEYS: &[&str] = &[
    "jump_repair_ref",
    "test_files",
    "owned_files",
    "plan_config",
    "project_root",
    "language_profile",
    "_max_jumps",
    "_jump_count",
    "repair_attempt",
    "reimplementation_count",
    "jump_quality_ref",
    "quality_attempt",
    "quality_previous_score",
];

/// A stage's mutable scratch space: an open string-keyed map of arbitrary
/// serializable values.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StageContext(pub BTreeMap<String, Value>);

impl StageContext {
    pub fn new() -> Self {
        Self(BTreeMap::new())
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn get_u32(&self, key: &str) -> Option<u32> {
        self.0.get(key).and_then(Value::as_u64).map(|v| v as u32)
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(Value::as_str)
    }

    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.0.get(key).and_then(Value::as_bool)
    }

    pub fn get_string_vec(&self, key: &str) -> Option<Vec<String>> {
        self.0.get(key).and_then(|v| v.as_array()).map(|arr| {
            arr.iter()
                .filter_map(|item| item.as_str().map(str::to_string))
                .collect()
        })
    }

    /// Merge `overrides` into this context, last-writer-wins.
    pub fn merge(&mut self, overrides: BTreeMap<String, Value>) {
        self.0.extend(overrides);
    }

    /// Insert every entry of `updates` whose key isn't already set. Used to
    /// carry a finished stage's outputs into a dependent's context without
    /// clobbering values the workflow assembler set explicitly.
    pub fn merge_missing(&mut self, updates: &BTreeMap<String, Value>) {
        for (key, value) in updates {
            self.0.entry(key.clone()).or_insert_with(|| value.clone());
        }
    }
}

/// Build a jump's override dict: the allow-listed keys from `source`,
/// followed by `extra` (which always wins over the copied values).
pub fn build_jump_overrides(
    source: &StageContext,
    extra: impl IntoIterator<Item = (String, Value)>,
) -> BTreeMap<String, Value> {
    let mut overrides = BTreeMap::new();
    for key in PROPAGATED_CONTEXT_KEYS {
        if let Some(value) = source.get(key) {
            overrides.insert((*key).to_string(), value.clone());
        }
    }
    for (key, value) in extra {
        overrides.insert(key, value);
    }
    overrides
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageStatus {
    NotStarted,
    Running,
    Succeeded,
    FailedContinue,
    Terminal,
    Skipped,
    Canceled,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Stage {
    /// Unique within its workflow.
    pub ref_id: String,
    /// Selects the Task implementation.
    pub stage_type: String,
    pub name: String,
    pub context: StageContext,
    pub requisite_stage_ref_ids: Vec<String>,
    pub status: StageStatus,
    /// Set on success; never mutated afterward.
    pub outputs: BTreeMap<String, Value>,
}

impl Stage {
    pub fn new(
        ref_id: impl Into<String>,
        stage_type: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            ref_id: ref_id.into(),
            stage_type: stage_type.into(),
            name: name.into(),
            context: StageContext::new(),
            requisite_stage_ref_ids: Vec::new(),
            status: StageStatus::NotStarted,
            outputs: BTreeMap::new(),
        }
    }

    pub fn requires(mut self, ref_ids: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.requisite_stage_ref_ids = ref_ids.into_iter().map(Into::into).collect();
        self
    }

    /// Ready to run once every requisite has succeeded or failed-continue.
    pub fn is_runnable(&self, workflow_stages: &BTreeMap<String, Stage>) -> bool {
        if self.status != StageStatus::NotStarted {
            return false;
        }
        self.requisite_stage_ref_ids.iter().all(|req| {
            workflow_stages
                .get(req)
                .map(|s| matches!(s.status, StageStatus::Succeeded | StageStatus::FailedContinue))
                .unwrap_or(false)
        })
    }
}

#[cfg(test)]
#[path = "stage_tests.rs"]
mod tests;
