// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Full Jitter backoff for `TransientError` retries, and the per-stage
//! attempt counter that caps retries at
//! [`forge_core::EngineConfig::auto_retry_max_cycles`].

use std::collections::HashMap;
use std::time::Duration;

use rand::Rng;

const FACTOR: f64 = 2.0;
const MAX_DELAY_SECS: u64 = 60;

/// Full Jitter backoff: `delay = uniform(0, min(cap, base * factor^attempt))`,
/// layered on top of whatever `retry_after` the Task itself requested.
/// `attempt` is zero-based (the first retry uses `attempt = 0`).
pub fn full_jitter_delay(retry_after: Duration, attempt: u32) -> Duration {
    full_jitter_delay_with_rng(retry_after, attempt, &mut rand::thread_rng())
}

fn full_jitter_delay_with_rng(retry_after: Duration, attempt: u32, rng: &mut impl Rng) -> Duration {
    let base_secs = retry_after.as_secs_f64().max(0.1);
    let scaled = base_secs * FACTOR.powi(attempt as i32);
    let cap = scaled.min(MAX_DELAY_SECS as f64);
    let delay_secs = rng.gen_range(0.0..=cap);
    Duration::from_secs_f64(delay_secs)
}

/// Tracks how many times each stage has been retried this process's
/// lifetime. Reset on recovery — a retry budget does not survive a crash,
/// since the stage itself is re-dispatched fresh.
#[derive(Debug, Default)]
pub struct RetryTracker {
    attempts: HashMap<String, u32>,
}

impl RetryTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a retry and return the attempt number just recorded (1-based).
    pub fn record_attempt(&mut self, stage_ref_id: &str) -> u32 {
        let count = self.attempts.entry(stage_ref_id.to_string()).or_insert(0);
        *count += 1;
        *count
    }

    pub fn attempts(&self, stage_ref_id: &str) -> u32 {
        self.attempts.get(stage_ref_id).copied().unwrap_or(0)
    }

    pub fn exhausted(&self, stage_ref_id: &str, max_cycles: u32) -> bool {
        self.attempts(stage_ref_id) >= max_cycles
    }

    pub fn clear(&mut self, stage_ref_id: &str) {
        self.attempts.remove(stage_ref_id);
    }
}

#[cfg(test)]
#[path = "retry_tests.rs"]
mod tests;
