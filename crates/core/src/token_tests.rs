// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn needs_refresh_below_margin() {
    let token = TokenData::new("abc", 1_000);
    assert!(token.needs_refresh(950, 300));
    assert!(!token.needs_refresh(500, 300));
}

#[test]
fn serde_round_trip_is_byte_equal_in_meaning() {
    let mut token = TokenData::new("abc", 1_000);
    token.refresh_token = Some("refresh".to_string());
    let json = serde_json::to_string(&token).expect("serialize");
    let back: TokenData = serde_json::from_str(&json).expect("deserialize");
    assert_eq!(token, back);
}
