// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! A minimal JSON-RPC 2.0 stdio client for Model Context Protocol servers,
//! used as the fallback dispatch path when a tool call names something
//! outside the built-in Tools API. One client per configured MCP server;
//! the registry tries them in declaration order.

use std::collections::HashMap;
use std::process::Stdio;

use serde_json::{json, Value};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};

use crate::error::ToolError;

#[derive(Debug, Clone)]
pub struct McpServerConfig {
    pub name: String,
    pub command: String,
    pub args: Vec<String>,
    pub env: HashMap<String, String>,
}

/// A started stdio connection to one MCP server.
pub struct McpClient {
    name: String,
    child: Child,
    stdin: ChildStdin,
    stdout: BufReader<ChildStdout>,
    next_id: u64,
    tool_names: Vec<String>,
}

impl McpClient {
    /// Spawn the server process and perform the `initialize` handshake.
    pub async fn start(config: &McpServerConfig) -> Result<Self, ToolError> {
        let mut command = Command::new(&config.command);
        command
            .args(&config.args)
            .envs(&config.env)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        let mut child = command
            .spawn()
            .map_err(|e| ToolError::Io(format!("mcp server '{}' failed to start: {e}", config.name)))?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| ToolError::Io(format!("mcp server '{}' has no stdin", config.name)))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| ToolError::Io(format!("mcp server '{}' has no stdout", config.name)))?;

        let mut client = Self {
            name: config.name.clone(),
            child,
            stdin,
            stdout: BufReader::new(stdout),
            next_id: 0,
            tool_names: Vec::new(),
        };

        client
            .send_request(
                "initialize",
                Some(json!({
                    "protocolVersion": "2024-11-05",
                    "capabilities": {},
                    "clientInfo": {"name": "forge", "version": "0.1.0"},
                })),
            )
            .await?;
        client.send_notification("notifications/initialized").await?;

        let tools = client.list_tools().await?;
        client.tool_names = tools
            .iter()
            .filter_map(|t| t.get("name").and_then(Value::as_str).map(str::to_string))
            .collect();

        Ok(client)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn provides(&self, tool_name: &str) -> bool {
        self.tool_names.iter().any(|n| n == tool_name)
    }

    pub async fn list_tools(&mut self) -> Result<Vec<Value>, ToolError> {
        let resp = self.send_request("tools/list", None).await?;
        Ok(resp
            .get("result")
            .and_then(|r| r.get("tools"))
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default())
    }

    pub async fn call_tool(&mut self, tool_name: &str, arguments: Value) -> Result<Value, ToolError> {
        let resp = self
            .send_request(
                "tools/call",
                Some(json!({"name": tool_name, "arguments": arguments})),
            )
            .await?;
        Ok(resp.get("result").cloned().unwrap_or(Value::Null))
    }

    async fn send_request(&mut self, method: &str, params: Option<Value>) -> Result<Value, ToolError> {
        self.next_id += 1;
        let mut request = json!({"jsonrpc": "2.0", "id": self.next_id, "method": method});
        if let Some(p) = params {
            request["params"] = p;
        }
        self.write_line(&request).await?;
        self.read_response().await
    }

    async fn send_notification(&mut self, method: &str) -> Result<(), ToolError> {
        let notification = json!({"jsonrpc": "2.0", "method": method});
        self.write_line(&notification).await
    }

    async fn write_line(&mut self, value: &Value) -> Result<(), ToolError> {
        let mut line = serde_json::to_string(value).map_err(|e| ToolError::Io(e.to_string()))?;
        line.push('\n');
        self.stdin
            .write_all(line.as_bytes())
            .await
            .map_err(|e| ToolError::Io(format!("mcp server '{}': {e}", self.name)))?;
        self.stdin
            .flush()
            .await
            .map_err(|e| ToolError::Io(format!("mcp server '{}': {e}", self.name)))
    }

    async fn read_response(&mut self) -> Result<Value, ToolError> {
        let mut line = String::new();
        let n = self
            .stdout
            .read_line(&mut line)
            .await
            .map_err(|e| ToolError::Io(format!("mcp server '{}': {e}", self.name)))?;
        if n == 0 {
            return Err(ToolError::Io(format!("mcp server '{}' closed connection", self.name)));
        }
        serde_json::from_str(&line).map_err(|e| ToolError::Io(format!("mcp server '{}' bad response: {e}", self.name)))
    }

    pub async fn stop(&mut self) {
        let _ = self.child.kill().await;
    }
}

/// Try each client in order, dispatching to the first that advertises
/// `tool_name`. Returns `None` if no client provides it.
pub async fn dispatch(clients: &mut [McpClient], tool_name: &str, arguments: Value) -> Option<Result<Value, ToolError>> {
    for client in clients.iter_mut() {
        if client.provides(tool_name) {
            return Some(client.call_tool(tool_name, arguments).await);
        }
    }
    None
}

#[cfg(test)]
#[path = "mcp_tests.rs"]
mod tests;
