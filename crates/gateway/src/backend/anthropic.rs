// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Anthropic backend: Messages API, streamed as Server-Sent Events.

use eventsource_stream::Eventsource;
use forge_core::{Message, Role, ToolCall};
use reqwest::Response;
use serde_json::{json, Value};
use tokio_stream::StreamExt;

use crate::backend::{AbortFlag, AggregatedMessage, StreamDelta, ToolSpec};
use crate::error::{classify_status, GatewayError};

pub fn build_request(model: &str, messages: &[Message], tools: &[ToolSpec]) -> Value {
    let system = messages
        .iter()
        .find(|m| m.role == Role::System)
        .map(|m| m.content.clone());

    let turns: Vec<Value> = messages
        .iter()
        .filter(|m| m.role != Role::System)
        .map(|m| match m.role {
            Role::Tool => json!({
                "role": "user",
                "content": [{
                    "type": "tool_result",
                    "tool_use_id": m.tool_call_id,
                    "content": m.content,
                }],
            }),
            Role::Assistant if !m.tool_calls.is_empty() => json!({
                "role": "assistant",
                "content": m.tool_calls.iter().map(|c| json!({
                    "type": "tool_use",
                    "id": c.id,
                    "name": c.name,
                    "input": serde_json::from_str::<Value>(&c.arguments_json).unwrap_or(Value::Null),
                })).collect::<Vec<_>>(),
            }),
            _ => json!({"role": role_str(m.role), "content": m.content}),
        })
        .collect();

    let mut body = json!({
        "model": model,
        "messages": turns,
        "max_tokens": 4096,
        "stream": true,
    });
    if let Some(system) = system {
        body["system"] = json!(system);
    }
    if !tools.is_empty() {
        body["tools"] = json!(tools
            .iter()
            .map(|t| json!({
                "name": t.name,
                "description": t.description,
                "input_schema": t.parameters,
            }))
            .collect::<Vec<_>>());
    }
    body
}

fn role_str(role: Role) -> &'static str {
    match role {
        Role::System => "system",
        Role::User => "user",
        Role::Assistant => "assistant",
        Role::Tool => "user",
    }
}

struct PendingToolUse {
    id: String,
    name: String,
    partial_json: String,
}

pub async fn consume_stream(
    response: Response,
    abort: &AbortFlag,
    mut on_event: impl FnMut(StreamDelta),
) -> Result<AggregatedMessage, GatewayError> {
    let mut events = response.bytes_stream().eventsource();
    let mut aggregated = AggregatedMessage::default();
    let mut pending_tool: Option<PendingToolUse> = None;

    while let Some(event) = events.next().await {
        if abort.is_aborted() {
            return Err(GatewayError::Aborted);
        }
        let event = event.map_err(|e| GatewayError::Stream(e.to_string()))?;
        if event.data.is_empty() {
            continue;
        }
        let payload: Value = serde_json::from_str(&event.data)?;
        match payload.get("type").and_then(Value::as_str) {
            Some("content_block_start") => {
                if let Some(block) = payload.get("content_block") {
                    if block.get("type").and_then(Value::as_str) == Some("tool_use") {
                        pending_tool = Some(PendingToolUse {
                            id: block.get("id").and_then(Value::as_str).unwrap_or_default().to_string(),
                            name: block.get("name").and_then(Value::as_str).unwrap_or_default().to_string(),
                            partial_json: String::new(),
                        });
                    }
                }
            }
            Some("content_block_delta") => {
                if let Some(delta) = payload.get("delta") {
                    match delta.get("type").and_then(Value::as_str) {
                        Some("text_delta") => {
                            if let Some(text) = delta.get("text").and_then(Value::as_str) {
                                aggregated.content.push_str(text);
                                on_event(StreamDelta::Content(text.to_string()));
                            }
                        }
                        Some("input_json_delta") => {
                            if let (Some(tool), Some(partial)) =
                                (pending_tool.as_mut(), delta.get("partial_json").and_then(Value::as_str))
                            {
                                tool.partial_json.push_str(partial);
                            }
                        }
                        Some("thinking_delta") => {
                            if let Some(text) = delta.get("thinking").and_then(Value::as_str) {
                                on_event(StreamDelta::Thinking(text.to_string()));
                            }
                        }
                        _ => {}
                    }
                }
            }
            Some("content_block_stop") => {
                if let Some(tool) = pending_tool.take() {
                    let call = ToolCall {
                        id: tool.id,
                        name: tool.name,
                        arguments_json: if tool.partial_json.is_empty() {
                            "{}".to_string()
                        } else {
                            tool.partial_json
                        },
                    };
                    on_event(StreamDelta::ToolCall(call.clone()));
                    aggregated.tool_calls.push(call);
                }
            }
            Some("message_stop") => break,
            _ => {}
        }
    }
    Ok(aggregated)
}

pub fn classify_error(status: u16, _retry_after_secs: Option<u64>) -> forge_core::ErrorClass {
    classify_status(status)
}

#[cfg(test)]
#[path = "anthropic_tests.rs"]
mod tests;
