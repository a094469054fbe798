// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use forge_core::{EventBus, FakeClock};
use forge_tools::mcp::McpServerConfig;
use serde_json::json;
use tempfile::tempdir;

const FAKE_SERVER_SCRIPT: &str = r#"
while IFS= read -r line; do
  case "$line" in
    *'"method":"initialize"'*)
      printf '%s\n' '{"jsonrpc":"2.0","id":1,"result":{"capabilities":{}}}'
      ;;
    *'"method":"tools/list"'*)
      printf '%s\n' '{"jsonrpc":"2.0","id":2,"result":{"tools":[{"name":"search_docs","description":"search the docs","inputSchema":{"type":"object"}}]}}'
      ;;
    *'"method":"tools/call"'*)
      printf '%s\n' '{"jsonrpc":"2.0","id":3,"result":{"content":"found it"}}'
      ;;
  esac
done
"#;

fn fake_server_config(name: &str) -> McpServerConfig {
    McpServerConfig {
        name: name.to_string(),
        command: "bash".to_string(),
        args: vec!["-c".to_string(), FAKE_SERVER_SCRIPT.to_string()],
        env: std::collections::HashMap::new(),
    }
}

fn test_gateway() -> (Gateway, tempfile::TempDir) {
    let home = tempdir().unwrap();
    let gateway = Gateway::new(home.path(), EventBus::new(), FakeClock::new(0)).unwrap();
    (gateway, home)
}

#[test]
fn mcp_tool_spec_reads_name_description_and_schema() {
    let raw = json!({"name": "search_docs", "description": "search", "inputSchema": {"type": "object"}});
    let spec = mcp_tool_spec(&raw).unwrap();
    assert_eq!(spec.name, "search_docs");
    assert_eq!(spec.description, "search");
    assert_eq!(spec.parameters["type"], "object");
}

#[test]
fn mcp_tool_spec_defaults_missing_description_and_schema() {
    let raw = json!({"name": "bare_tool"});
    let spec = mcp_tool_spec(&raw).unwrap();
    assert_eq!(spec.description, "");
    assert!(spec.parameters.is_object());
}

#[test]
fn mcp_tool_spec_requires_a_name() {
    let raw = json!({"description": "no name"});
    assert!(mcp_tool_spec(&raw).is_none());
}

#[tokio::test]
async fn new_excludes_ask_user_question_when_not_interactive() {
    let (gateway, home) = test_gateway();
    let config = AgentConfig::new("planner", "you plan things", "primary");
    let agent = Agent::new(config, std::sync::Arc::new(gateway), EventBus::new(), home.path().to_path_buf(), Vec::new()).await;
    assert!(!agent.tool_definitions.iter().any(|t| t.name == "AskUserQuestion"));
}

#[tokio::test]
async fn new_includes_ask_user_question_when_interactive() {
    let (gateway, home) = test_gateway();
    let config = AgentConfig::new("planner", "you plan things", "primary").with_interactive(true);
    let agent = Agent::new(config, std::sync::Arc::new(gateway), EventBus::new(), home.path().to_path_buf(), Vec::new()).await;
    assert!(agent.tool_definitions.iter().any(|t| t.name == "AskUserQuestion"));
}

#[tokio::test]
async fn new_restricts_tool_definitions_to_allowed_tools() {
    let (gateway, home) = test_gateway();
    let config = AgentConfig::new("reader", "read only", "primary").with_allowed_tools(vec!["Read".to_string()]);
    let agent = Agent::new(config, std::sync::Arc::new(gateway), EventBus::new(), home.path().to_path_buf(), Vec::new()).await;
    assert_eq!(agent.tool_definitions.len(), 1);
    assert_eq!(agent.tool_definitions[0].name, "Read");
}

#[tokio::test]
async fn new_merges_mcp_tool_definitions_with_built_ins() {
    let (gateway, home) = test_gateway();
    let client = McpClient::start(&fake_server_config("docs")).await.unwrap();
    let config = AgentConfig::new("researcher", "you research", "primary");
    let mut agent = Agent::new(config, std::sync::Arc::new(gateway), EventBus::new(), home.path().to_path_buf(), vec![client]).await;
    assert!(agent.tool_definitions.iter().any(|t| t.name == "search_docs"));
    for client in &mut agent.mcp_clients {
        client.stop().await;
    }
}
