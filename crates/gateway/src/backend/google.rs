// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Google (Gemini) backend: `generateContent?alt=sse` streams Server-Sent
//! Events, each a JSON `GenerateContentResponse` fragment.

use eventsource_stream::Eventsource;
use forge_core::{Message, Role, ToolCall};
use reqwest::Response;
use serde_json::{json, Value};
use tokio_stream::StreamExt;

use crate::backend::{AbortFlag, AggregatedMessage, StreamDelta, ToolSpec};
use crate::error::{classify_status, GatewayError};

pub fn build_request(messages: &[Message], tools: &[ToolSpec]) -> Value {
    let system = messages
        .iter()
        .find(|m| m.role == Role::System)
        .map(|m| json!({"parts": [{"text": m.content}]}));

    let contents: Vec<Value> = messages
        .iter()
        .filter(|m| m.role != Role::System)
        .map(|m| {
            json!({
                "role": gemini_role(m.role),
                "parts": [{"text": m.content}],
            })
        })
        .collect();

    let mut body = json!({ "contents": contents });
    if let Some(system) = system {
        body["systemInstruction"] = system;
    }
    if !tools.is_empty() {
        body["tools"] = json!([{
            "functionDeclarations": tools.iter().map(|t| json!({
                "name": t.name,
                "description": t.description,
                "parameters": t.parameters,
            })).collect::<Vec<_>>(),
        }]);
    }
    body
}

fn gemini_role(role: Role) -> &'static str {
    match role {
        Role::User | Role::Tool => "user",
        Role::Assistant => "model",
        Role::System => "user",
    }
}

pub async fn consume_stream(
    response: Response,
    abort: &AbortFlag,
    mut on_event: impl FnMut(StreamDelta),
) -> Result<AggregatedMessage, GatewayError> {
    let mut events = response.bytes_stream().eventsource();
    let mut aggregated = AggregatedMessage::default();

    while let Some(event) = events.next().await {
        if abort.is_aborted() {
            return Err(GatewayError::Aborted);
        }
        let event = event.map_err(|e| GatewayError::Stream(e.to_string()))?;
        if event.data.is_empty() {
            continue;
        }
        let payload: Value = serde_json::from_str(&event.data)?;
        let parts = payload
            .pointer("/candidates/0/content/parts")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();

        for part in parts {
            if let Some(text) = part.get("text").and_then(Value::as_str) {
                aggregated.content.push_str(text);
                on_event(StreamDelta::Content(text.to_string()));
            }
            if let Some(call) = part.get("functionCall") {
                let name = call.get("name").and_then(Value::as_str).unwrap_or_default().to_string();
                let args = call.get("args").cloned().unwrap_or(Value::Null);
                let tool_call = ToolCall {
                    id: format!("call-{name}"),
                    name,
                    arguments_json: args.to_string(),
                };
                on_event(StreamDelta::ToolCall(tool_call.clone()));
                aggregated.tool_calls.push(tool_call);
            }
        }
    }
    Ok(aggregated)
}

pub fn classify_error(status: u16, _retry_after_secs: Option<u64>) -> forge_core::ErrorClass {
    classify_status(status)
}

#[cfg(test)]
#[path = "google_tests.rs"]
mod tests;
