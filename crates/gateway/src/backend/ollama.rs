// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Ollama backend: `/api/chat` streams newline-delimited JSON objects (not
//! SSE), one per token/tool-call delta, with a final `{"done": true}` line.

use forge_core::{Message, Role};
use reqwest::Response;
use serde_json::{json, Value};
use tokio_stream::StreamExt;

use crate::backend::{AbortFlag, AggregatedMessage, StreamDelta, ToolSpec};
use crate::error::{classify_status, GatewayError};

pub fn build_request(model: &str, messages: &[Message], tools: &[ToolSpec]) -> Value {
    let messages: Vec<Value> = messages
        .iter()
        .map(|m| {
            json!({
                "role": role_str(m.role),
                "content": m.content,
            })
        })
        .collect();

    let mut body = json!({
        "model": model,
        "messages": messages,
        "stream": true,
    });
    if !tools.is_empty() {
        body["tools"] = json!(tools
            .iter()
            .map(|t| json!({
                "type": "function",
                "function": {
                    "name": t.name,
                    "description": t.description,
                    "parameters": t.parameters,
                }
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
        Role::Tool => "tool",
    }
}

pub async fn consume_stream(
    response: Response,
    abort: &AbortFlag,
    mut on_event: impl FnMut(StreamDelta),
) -> Result<AggregatedMessage, GatewayError> {
    let mut stream = response.bytes_stream();
    let mut buf = String::new();
    let mut aggregated = AggregatedMessage::default();

    while let Some(chunk) = stream.next().await {
        if abort.is_aborted() {
            return Err(GatewayError::Aborted);
        }
        let chunk = chunk?;
        buf.push_str(&String::from_utf8_lossy(&chunk));

        while let Some(pos) = buf.find('\n') {
            let line = buf[..pos].trim().to_string();
            buf.drain(..=pos);
            if line.is_empty() {
                continue;
            }
            let value: Value = serde_json::from_str(&line)?;
            if let Some(content) = value.pointer("/message/content").and_then(Value::as_str) {
                if !content.is_empty() {
                    aggregated.content.push_str(content);
                    on_event(StreamDelta::Content(content.to_string()));
                }
            }
            if value.get("done").and_then(Value::as_bool) == Some(true) {
                return Ok(aggregated);
            }
        }
    }
    Ok(aggregated)
}

pub fn classify_error(status: u16, _retry_after_secs: Option<u64>) -> forge_core::ErrorClass {
    classify_status(status)
}

#[cfg(test)]
#[path = "ollama_tests.rs"]
mod tests;
