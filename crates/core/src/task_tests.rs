// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn success_defaults_to_empty_outputs() {
    match TaskResult::success() {
        TaskResult::Success { outputs } => assert!(outputs.is_empty()),
        other => panic!("unexpected variant: {other:?}"),
    }
}

#[test]
fn jump_to_carries_target_and_overrides() {
    let mut overrides = BTreeMap::new();
    overrides.insert("repair_attempt".to_string(), Value::from(1));
    let result = TaskResult::jump_to("repair", overrides.clone());
    match result {
        TaskResult::JumpTo {
            target_ref,
            context_overrides,
        } => {
            assert_eq!(target_ref, "repair");
            assert_eq!(context_overrides, overrides);
        }
        other => panic!("unexpected variant: {other:?}"),
    }
}

#[test]
fn transient_error_carries_delay_and_message() {
    let err = TransientError::new(Duration::from_secs(5), "rate limited");
    assert_eq!(err.retry_after, Duration::from_secs(5));
    assert_eq!(err.message, "rate limited");
}
