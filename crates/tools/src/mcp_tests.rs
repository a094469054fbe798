// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

/// A tiny stdio JSON-RPC server, implemented as a shell script, that
/// understands exactly the handshake + `tools/list` + `tools/call` this
/// client drives. Good enough to exercise the framing without a real MCP
/// server binary.
const FAKE_SERVER_SCRIPT: &str = r#"
while IFS= read -r line; do
  case "$line" in
    *'"method":"initialize"'*)
      printf '%s\n' '{"jsonrpc":"2.0","id":1,"result":{"capabilities":{}}}'
      ;;
    *'"method":"tools/list"'*)
      printf '%s\n' '{"jsonrpc":"2.0","id":2,"result":{"tools":[{"name":"search_docs"}]}}'
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

#[tokio::test]
async fn start_performs_handshake_and_caches_tool_names() {
    let mut client = McpClient::start(&fake_server_config("docs")).await.unwrap();
    assert_eq!(client.name(), "docs");
    assert!(client.provides("search_docs"));
    assert!(!client.provides("search_web"));
    client.stop().await;
}

#[tokio::test]
async fn call_tool_returns_the_server_result() {
    let mut client = McpClient::start(&fake_server_config("docs")).await.unwrap();
    let result = client.call_tool("search_docs", json!({"q": "forge"})).await.unwrap();
    assert_eq!(result["content"], "found it");
    client.stop().await;
}

#[tokio::test]
async fn dispatch_tries_clients_in_order_and_skips_non_providers() {
    let mut clients = vec![
        McpClient::start(&fake_server_config("docs")).await.unwrap(),
    ];

    let result = dispatch(&mut clients, "search_docs", json!({})).await;
    assert!(result.is_some());
    assert!(result.unwrap().is_ok());

    let missing = dispatch(&mut clients, "does_not_exist", json!({})).await;
    assert!(missing.is_none());

    for client in clients.iter_mut() {
        client.stop().await;
    }
}
