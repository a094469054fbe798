// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The Agent Loop: turns a user prompt plus a tool-calling LLM into a
//! final text response, dispatching tool calls through the Tools API with
//! an MCP fallback, watchdogging each turn, and retrying empty responses
//! before giving up.

use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde_json::Value;
use tokio::sync::oneshot;

use forge_core::{codes, AgentHistory, Event, EventBus, EventKind, Message, ToolCall};
use forge_gateway::{AbortFlag, AggregatedMessage, Gateway, GatewayError, ToolSpec};
use forge_tools::{mcp::McpClient, Tools};

use crate::config::AgentConfig;
use crate::error::AgentError;
use crate::tool_defs;
use crate::tool_dispatch::dispatch_tool_call;

/// Tool names whose invocation counts as "making progress" for idle detection.
const WRITE_TOOLS: &[&str] = &["Write", "Edit", "Bash"];

pub struct Agent {
    name: String,
    history: AgentHistory,
    gateway: Arc<Gateway>,
    bus: EventBus,
    tools: Tools,
    mcp_clients: Vec<McpClient>,
    tool_definitions: Vec<ToolSpec>,
    model: String,
    max_turns: u32,
    per_turn_timeout: Duration,
    timeout: Option<Duration>,
}

impl Agent {
    /// Build an agent, loading each MCP client's tool list so their
    /// definitions can be offered to the LLM alongside the built-ins. A
    /// client that fails to list its tools is kept for dispatch but
    /// contributes no definitions, matching the degrade-not-fail posture
    /// of the built-in Tools API.
    pub async fn new(
        config: AgentConfig,
        gateway: Arc<Gateway>,
        bus: EventBus,
        workdir: PathBuf,
        mut mcp_clients: Vec<McpClient>,
    ) -> Self {
        let mut tools = Tools::new(workdir).with_access(config.access);
        if let Some(allowed) = config.allowed_tools {
            tools = tools.with_allowed_tools(allowed.into_iter().collect::<HashSet<_>>());
        }

        let mut tool_definitions = tool_defs::build_definitions(&tools.exposed_tool_names(), config.interactive);
        for client in &mut mcp_clients {
            match client.list_tools().await {
                Ok(raw_tools) => {
                    for raw in raw_tools {
                        if let Some(spec) = mcp_tool_spec(&raw) {
                            tool_definitions.push(spec);
                        }
                    }
                }
                Err(err) => {
                    tracing::warn!(agent = %config.name, mcp_server = client.name(), error = %err, "failed to load MCP tools");
                }
            }
        }

        Self {
            name: config.name,
            history: AgentHistory::new(config.system_prompt),
            gateway,
            bus,
            tools,
            mcp_clients,
            tool_definitions,
            model: config.model,
            max_turns: config.max_turns,
            per_turn_timeout: config.per_turn_timeout,
            timeout: config.timeout,
        }
    }

    /// Run the turn loop to completion, returning the final response text.
    pub async fn run(&mut self, user_input: &str) -> Result<String, AgentError> {
        self.history.push(Message::user(user_input));

        let has_write_tools = self
            .tool_definitions
            .iter()
            .any(|t| WRITE_TOOLS.contains(&t.name.as_str()));
        let mut consecutive_read_only: u32 = 0;
        let mut last_content = String::new();
        let mut empty_response_retries: u32 = 0;

        let start = Instant::now();

        for turn in 0..self.max_turns {
            if let Some(timeout) = self.timeout {
                if start.elapsed() > timeout {
                    tracing::warn!(agent = %self.name, turn, "wall-clock timeout reached, returning last response");
                    break;
                }
            }

            self.bus.publish(Event::new(
                EventKind::Message,
                codes::AGENT_TURN,
                self.gateway_now_ms(),
            ).with_label(self.name.clone()));

            let remaining = self.timeout.map(|t| t.saturating_sub(start.elapsed()));
            let per_turn = match remaining {
                Some(r) => std::cmp::min(r / 2, self.per_turn_timeout),
                None => self.per_turn_timeout,
            };

            let messages = self.history.messages().to_vec();
            let aggregated = match self.call_with_watchdog(messages, per_turn).await {
                Ok(msg) => msg,
                Err(err) => {
                    tracing::error!(agent = %self.name, turn, error = %err, "llm call failed");
                    if !last_content.is_empty() {
                        return Ok(last_content);
                    }
                    return Err(AgentError::from(err));
                }
            };

            if !aggregated.content.is_empty() {
                last_content = aggregated.content.clone();
            }

            self.history.push(if aggregated.tool_calls.is_empty() {
                Message::assistant(aggregated.content.clone())
            } else {
                Message::assistant_with_tool_calls(aggregated.content.clone(), aggregated.tool_calls.clone())
            });

            if aggregated.tool_calls.is_empty() {
                if aggregated.content.is_empty() && empty_response_retries < forge_core::constants::EMPTY_RESPONSE_MAX_RETRIES {
                    empty_response_retries += 1;
                    tracing::warn!(
                        agent = %self.name,
                        retry = empty_response_retries,
                        "empty response with no tool calls, retrying"
                    );
                    self.bus.publish(Event::new(EventKind::Message, codes::AGENT_EMPTY_RESPONSE, self.gateway_now_ms()).with_label(self.name.clone()));
                    self.history.pop_if_empty_assistant();
                    continue;
                }
                if aggregated.content.is_empty() && !last_content.is_empty() {
                    tracing::warn!(agent = %self.name, "empty final response, returning last non-empty response");
                    return Ok(last_content);
                }
                return Ok(aggregated.content);
            }

            for tc in &aggregated.tool_calls {
                let result = self.handle_tool_call(tc).await;
                let truncated = forge_core::truncate_tool_result_default(&result);
                self.history.push(Message::tool_result(tc.id.clone(), truncated));
            }

            if has_write_tools {
                let turn_wrote = aggregated.tool_calls.iter().any(|tc| WRITE_TOOLS.contains(&tc.name.as_str()));
                if turn_wrote {
                    consecutive_read_only = 0;
                } else {
                    consecutive_read_only += 1;
                    if consecutive_read_only == forge_core::constants::IDLE_WARN_THRESHOLD {
                        tracing::warn!(agent = %self.name, turns = consecutive_read_only, "no file changes for consecutive turns");
                        self.bus.publish(Event::new(EventKind::Message, codes::AGENT_IDLE_WARN, self.gateway_now_ms()).with_label(self.name.clone()));
                    }
                    if consecutive_read_only >= forge_core::constants::IDLE_HARD_THRESHOLD {
                        tracing::warn!(agent = %self.name, turns = consecutive_read_only, "idle abort, no file changes");
                        self.bus.publish(Event::new(EventKind::Message, codes::AGENT_IDLE_ABORT, self.gateway_now_ms()).with_label(self.name.clone()));
                        break;
                    }
                }
            }
        }

        if !last_content.is_empty() {
            Ok(last_content)
        } else {
            Ok("Agent completed all turns without final response.".to_string())
        }
    }

    /// Race a single `chat` call against a per-turn watchdog: if the turn
    /// runs past `per_turn`, the watchdog sets the abort flag the stream
    /// consumer checks between chunks rather than waiting on the socket.
    async fn call_with_watchdog(&self, messages: Vec<Message>, per_turn: Duration) -> Result<AggregatedMessage, GatewayError> {
        let abort = AbortFlag::new();
        let (cancel_tx, cancel_rx) = oneshot::channel::<()>();
        let watchdog_abort = abort.clone();
        let watchdog = tokio::spawn(async move {
            tokio::select! {
                _ = tokio::time::sleep(per_turn) => watchdog_abort.abort(),
                _ = cancel_rx => {}
            }
        });

        let result = self
            .gateway
            .chat(&self.model, messages, self.tool_definitions.clone(), &abort)
            .await;

        let _ = cancel_tx.send(());
        let _ = watchdog.await;
        result
    }

    async fn handle_tool_call(&mut self, tool_call: &ToolCall) -> String {
        tracing::info!(agent = %self.name, tool = %tool_call.name, "dispatching tool call");
        let result = dispatch_tool_call(&self.tools, &mut self.mcp_clients, tool_call).await;
        if result.starts_with("Unknown tool:") {
            tracing::warn!(agent = %self.name, tool = %tool_call.name, "unknown tool");
        }
        result
    }

    fn gateway_now_ms(&self) -> u64 {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as u64
    }
}

/// Convert a raw `tools/list` entry (`{name, description, inputSchema}`)
/// into a [`ToolSpec`], skipping entries with no name.
fn mcp_tool_spec(raw: &Value) -> Option<ToolSpec> {
    let name = raw.get("name").and_then(Value::as_str)?.to_string();
    let description = raw
        .get("description")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();
    let parameters = raw.get("inputSchema").cloned().unwrap_or_else(|| Value::Object(Default::default()));
    Some(ToolSpec { name, description, parameters })
}

#[cfg(test)]
#[path = "agent_tests.rs"]
mod tests;
