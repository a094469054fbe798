// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use serde_json::json;

#[test]
fn build_request_splits_out_system_message() {
    let messages = vec![Message::system("be terse"), Message::user("hi")];
    let body = build_request("claude-3", &messages, &[]);
    assert_eq!(body["system"], "be terse");
    assert_eq!(body["messages"].as_array().unwrap().len(), 1);
    assert_eq!(body["messages"][0]["role"], "user");
}

#[test]
fn build_request_maps_tool_results_to_user_turns() {
    let messages = vec![Message::tool_result("call-1", "file contents")];
    let body = build_request("claude-3", &messages, &[]);
    assert_eq!(body["messages"][0]["role"], "user");
    assert_eq!(body["messages"][0]["content"][0]["type"], "tool_result");
    assert_eq!(body["messages"][0]["content"][0]["tool_use_id"], "call-1");
}

#[test]
fn build_request_includes_tool_definitions() {
    let tools = vec![ToolSpec {
        name: "read_file".into(),
        description: "read a file".into(),
        parameters: json!({"type": "object"}),
    }];
    let body = build_request("claude-3", &[Message::user("hi")], &tools);
    assert_eq!(body["tools"][0]["name"], "read_file");
}
