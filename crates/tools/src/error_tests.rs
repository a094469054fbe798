// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn renders_as_an_error_prefixed_string() {
    let err = ToolError::NotFound("src/main.rs".to_string());
    assert_eq!(err.to_tool_result(), "Error: not found: src/main.rs");
}

#[test]
fn access_denied_carries_its_reason() {
    let err = ToolError::AccessDenied("not in owned_files".to_string());
    assert_eq!(err.to_tool_result(), "Error: access denied: not in owned_files");
}
