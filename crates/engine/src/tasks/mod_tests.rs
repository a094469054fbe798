// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn jump_limit_holds_when_counter_is_below_max() {
    let mut ctx = StageContext::new();
    ctx.set("_jump_count", 3u64);
    assert!(check_jump_limit(&ctx, 5));
}

#[test]
fn jump_limit_trips_once_counter_reaches_max() {
    let mut ctx = StageContext::new();
    ctx.set("_jump_count", 5u64);
    assert!(!check_jump_limit(&ctx, 5));
}

#[test]
fn jump_limit_defaults_absent_counter_to_zero() {
    let ctx = StageContext::new();
    assert!(check_jump_limit(&ctx, 1));
}

#[test]
fn increment_jump_count_bumps_from_current_context_value() {
    let mut ctx = StageContext::new();
    ctx.set("_jump_count", 4u64);
    let mut overrides = BTreeMap::new();
    let next = increment_jump_count(&mut overrides, &ctx);
    assert_eq!(next, 5);
    assert_eq!(overrides.get("_jump_count").and_then(Value::as_u64), Some(5));
}
