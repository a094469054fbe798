// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn full_jitter_delay_never_exceeds_the_scaled_cap() {
    let mut rng = rand::rngs::mock::StepRng::new(u64::MAX / 2, 1);
    let delay = full_jitter_delay_with_rng(Duration::from_secs(2), 3, &mut rng);
    assert!(delay <= Duration::from_secs(60));
}

#[test]
fn full_jitter_delay_grows_with_attempt_cap() {
    let mut rng_low = rand::rngs::mock::StepRng::new(0, 1);
    let first = full_jitter_delay_with_rng(Duration::from_secs(1), 0, &mut rng_low);
    assert_eq!(first, Duration::from_secs(0));
}

#[test]
fn retry_tracker_counts_and_exhausts() {
    let mut tracker = RetryTracker::new();
    assert_eq!(tracker.attempts("implement"), 0);
    assert_eq!(tracker.record_attempt("implement"), 1);
    assert_eq!(tracker.record_attempt("implement"), 2);
    assert!(!tracker.exhausted("implement", 3));
    assert_eq!(tracker.record_attempt("implement"), 3);
    assert!(tracker.exhausted("implement", 3));

    tracker.clear("implement");
    assert_eq!(tracker.attempts("implement"), 0);
}
