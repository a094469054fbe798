// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn first_message_is_always_system() {
    let history = AgentHistory::new("be helpful");
    assert_eq!(history.messages()[0].role, Role::System);
}

#[test]
fn exactly_at_limit_is_not_trimmed() {
    let mut history = AgentHistory::with_limit("sys", 3);
    for i in 0..3 {
        history.push(Message::user(format!("msg {i}")));
    }
    assert_eq!(history.len(), 4); // system + 3
}

#[test]
fn one_over_limit_is_trimmed() {
    let mut history = AgentHistory::with_limit("sys", 3);
    for i in 0..4 {
        history.push(Message::user(format!("msg {i}")));
    }
    assert_eq!(history.len(), 4); // system + 3, oldest user message dropped
    assert_eq!(history.messages()[0].role, Role::System);
    assert_eq!(history.messages()[1].content, "msg 1");
}

#[test]
fn trimming_never_removes_system_message() {
    let mut history = AgentHistory::with_limit("sys", 1);
    for i in 0..20 {
        history.push(Message::user(format!("msg {i}")));
    }
    assert_eq!(history.messages()[0].role, Role::System);
    assert_eq!(history.len(), 2);
}

#[test]
fn pop_if_empty_assistant_removes_trailing_empty_message() {
    let mut history = AgentHistory::new("sys");
    history.push(Message::assistant(""));
    history.pop_if_empty_assistant();
    assert_eq!(history.len(), 1);
}

#[test]
fn pop_if_empty_assistant_leaves_non_empty_message() {
    let mut history = AgentHistory::new("sys");
    history.push(Message::assistant("done"));
    history.pop_if_empty_assistant();
    assert_eq!(history.len(), 2);
}
