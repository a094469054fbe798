// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The retry policy table and Full Jitter backoff.

use std::time::Duration;

use forge_core::ErrorClass;
use rand::Rng;

/// Per-class retry parameters.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub retryable: bool,
    pub budget_secs: u64,
    pub base_delay_secs: u64,
}

const FACTOR: f64 = 2.0;
const MAX_DELAY_SECS: u64 = 300;

/// The retry policy table, one row per [`ErrorClass`].
pub fn policy_for(class: ErrorClass) -> RetryPolicy {
    match class {
        ErrorClass::Connection => RetryPolicy {
            retryable: true,
            budget_secs: 300,
            base_delay_secs: 5,
        },
        ErrorClass::Server => RetryPolicy {
            retryable: true,
            budget_secs: 180,
            base_delay_secs: 10,
        },
        ErrorClass::RateLimit => RetryPolicy {
            retryable: true,
            budget_secs: 300,
            base_delay_secs: 10,
        },
        ErrorClass::Auth => RetryPolicy {
            retryable: false,
            budget_secs: 0,
            base_delay_secs: 0,
        },
        ErrorClass::Permanent => RetryPolicy {
            retryable: false,
            budget_secs: 0,
            base_delay_secs: 0,
        },
    }
}

/// Full Jitter backoff: `delay = uniform(0, min(cap, base * factor^attempt))`.
/// `attempt` is zero-based (the first retry uses `attempt = 0`).
pub fn full_jitter_delay(base_secs: u64, attempt: u32) -> Duration {
    full_jitter_delay_with_rng(base_secs, attempt, &mut rand::thread_rng())
}

fn full_jitter_delay_with_rng(base_secs: u64, attempt: u32, rng: &mut impl Rng) -> Duration {
    let scaled = base_secs as f64 * FACTOR.powi(attempt as i32);
    let cap = scaled.min(MAX_DELAY_SECS as f64).max(0.0);
    if cap <= 0.0 {
        return Duration::from_secs(0);
    }
    let delay_secs = rng.gen_range(0.0..=cap);
    Duration::from_secs_f64(delay_secs)
}

/// `Retry-After` wins over the class's base delay for rate-limit errors, with
/// a floor of 10s per the retry policy table.
pub fn rate_limit_delay(retry_after_secs: Option<u64>) -> Duration {
    Duration::from_secs(retry_after_secs.unwrap_or(10).max(10))
}

#[cfg(test)]
#[path = "retry_tests.rs"]
mod tests;
