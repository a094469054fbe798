// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Dispatch a single tool call through the built-in Tools API, falling
//! back to the configured MCP clients when the name isn't a built-in.
//! Factored out of the turn loop so it can be exercised without a live
//! LLM gateway.

use serde_json::Value;

use forge_core::ToolCall;
use forge_tools::mcp::McpClient;
use forge_tools::{mcp, Dispatch, Tools};

pub async fn dispatch_tool_call(tools: &Tools, mcp_clients: &mut [McpClient], tool_call: &ToolCall) -> String {
    match tools.dispatch(&tool_call.name, &tool_call.arguments_json).await {
        Dispatch::Handled(result) => result,
        Dispatch::UnknownTool => {
            let args: Value = serde_json::from_str(&tool_call.arguments_json).unwrap_or(Value::Null);
            match mcp::dispatch(mcp_clients, &tool_call.name, args).await {
                Some(Ok(value)) => value.to_string(),
                Some(Err(err)) => err.to_tool_result(),
                None => format!("Unknown tool: {}", tool_call.name),
            }
        }
    }
}

#[cfg(test)]
#[path = "tool_dispatch_tests.rs"]
mod tests;
