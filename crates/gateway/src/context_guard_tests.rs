// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

fn msg(role_system: bool, content: &str) -> Message {
    if role_system {
        Message::system(content)
    } else {
        Message::user(content)
    }
}

#[test]
fn small_conversation_does_not_exceed_guard() {
    let messages = vec![msg(true, "system"), msg(false, "hello")];
    assert!(!exceeds_guard(&messages, 1_000_000));
}

#[test]
fn guard_triggers_above_ninety_percent_of_window() {
    let big = "x".repeat(400);
    let messages = vec![msg(true, "sys"), msg(false, &big)];
    // context_window of 100 tokens => threshold 90 tokens => 400 bytes / 4 = 100 tokens, over.
    assert!(exceeds_guard(&messages, 100));
}

#[test]
fn unknown_window_of_zero_never_triggers_meaningfully_small_content() {
    let messages = vec![msg(true, "sys"), msg(false, "hi")];
    assert!(!exceeds_guard(&messages, 1_000));
}

#[test]
fn trim_preserves_system_and_last_message() {
    let mut messages = vec![
        msg(true, "system"),
        msg(false, &"a".repeat(4000)),
        msg(false, &"b".repeat(4000)),
        msg(false, "final"),
    ];
    let trimmed = trim_to_guard(&mut messages, 100);
    assert!(trimmed);
    assert_eq!(messages.first().unwrap().content, "system");
    assert_eq!(messages.last().unwrap().content, "final");
}

#[test]
fn trim_is_a_no_op_with_two_or_fewer_messages() {
    let mut messages = vec![msg(true, "system"), msg(false, &"a".repeat(10_000))];
    let trimmed = trim_to_guard(&mut messages, 1);
    assert!(!trimmed);
    assert_eq!(messages.len(), 2);
}
