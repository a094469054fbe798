// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use serde_json::json;

#[test]
fn build_request_maps_roles_and_streams() {
    let messages = vec![Message::system("be terse"), Message::user("hi")];
    let body = build_request("llama3", &messages, &[]);
    assert_eq!(body["model"], "llama3");
    assert_eq!(body["stream"], true);
    assert_eq!(body["messages"][0]["role"], "system");
    assert_eq!(body["messages"][1]["content"], "hi");
    assert!(body.get("tools").is_none());
}

#[test]
fn build_request_includes_tools_when_present() {
    let tools = vec![ToolSpec {
        name: "read_file".into(),
        description: "read a file".into(),
        parameters: json!({"type": "object"}),
    }];
    let body = build_request("llama3", &[Message::user("hi")], &tools);
    assert_eq!(body["tools"][0]["function"]["name"], "read_file");
}
