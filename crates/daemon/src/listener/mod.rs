// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Listener task for handling socket I/O.
//!
//! The Listener runs in a spawned task, accepting connections and handling
//! each without blocking the others. Most requests are one-shot
//! request/response; `Subscribe` promotes the connection to a write-only
//! feed of [`forge_core::Event`]s, one newline-delimited JSON object per
//! line, until the client disconnects.

use std::sync::Arc;
use std::time::Instant;

use forge_engine::{workflow::WorkflowRuntime, EngineServices};
use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tokio::net::{UnixListener, UnixStream};
use tokio::sync::Notify;
use tracing::{debug, error, warn};

use crate::protocol::{self, Request, Response, DEFAULT_TIMEOUT, PROTOCOL_VERSION};

/// Shared daemon context for all request handlers.
pub(crate) struct ListenCtx {
    pub services: EngineServices,
    pub start_time: Instant,
    pub shutdown: Arc<Notify>,
}

/// Listener task for accepting socket connections.
pub(crate) struct Listener {
    socket: UnixListener,
    ctx: Arc<ListenCtx>,
}

/// Errors from connection handling.
#[derive(Debug, Error)]
pub(crate) enum ConnectionError {
    #[error("protocol error: {0}")]
    Protocol(#[from] protocol::ProtocolError),

    #[error("engine error: {0}")]
    Engine(#[from] forge_engine::EngineError),

    #[error("storage error: {0}")]
    Storage(#[from] forge_storage::StorageError),
}

impl Listener {
    pub fn new(socket: UnixListener, ctx: Arc<ListenCtx>) -> Self {
        Self { socket, ctx }
    }

    /// Run the listener loop until shutdown, spawning tasks for each connection.
    pub async fn run(self) {
        loop {
            match self.socket.accept().await {
                Ok((stream, _)) => {
                    let ctx = Arc::clone(&self.ctx);
                    tokio::spawn(async move {
                        if let Err(e) = handle_connection(stream, &ctx).await {
                            match e {
                                ConnectionError::Protocol(protocol::ProtocolError::ConnectionClosed) => {
                                    debug!("client disconnected");
                                }
                                ConnectionError::Protocol(protocol::ProtocolError::Timeout) => {
                                    warn!("connection timeout");
                                }
                                _ => error!(error = %e, "connection error"),
                            }
                        }
                    });
                }
                Err(e) => error!(error = %e, "accept error"),
            }
        }
    }
}

/// Handle a single client connection: one request, one response, unless
/// the request is `Subscribe`, in which case the connection is promoted to
/// a broadcast feed for its remaining lifetime.
async fn handle_connection(stream: UnixStream, ctx: &ListenCtx) -> Result<(), ConnectionError> {
    let (mut reader, mut writer) = stream.into_split();

    let request = protocol::read_request(&mut reader, DEFAULT_TIMEOUT).await?;
    tracing::info!(request = ?request, "received request");

    if matches!(request, Request::Subscribe) {
        protocol::write_response(&mut writer, &Response::Ok, DEFAULT_TIMEOUT).await?;
        return run_broadcast_feed(writer, ctx).await;
    }

    let response = handle_request(request, ctx).await?;
    debug!(response = ?response, "sending response");
    protocol::write_response(&mut writer, &response, DEFAULT_TIMEOUT).await?;

    Ok(())
}

/// Drain this connection's subscription into the socket as newline-delimited
/// JSON until the subscriber queue closes or the write side fails (client
/// hung up). Either way the subscription is dropped and the bus reaps it
/// lazily on its next publish.
async fn run_broadcast_feed(
    mut writer: tokio::net::unix::OwnedWriteHalf,
    ctx: &ListenCtx,
) -> Result<(), ConnectionError> {
    let mut sub = ctx.services.bus.subscribe();
    while let Some(event) = sub.rx.recv().await {
        let mut line = event.to_wire_json().to_string();
        line.push('\n');
        if writer.write_all(line.as_bytes()).await.is_err() {
            break;
        }
    }
    ctx.services.bus.unsubscribe(sub.id);
    Ok(())
}

/// Handle a single request and return a response.
async fn handle_request(request: Request, ctx: &ListenCtx) -> Result<Response, ConnectionError> {
    match request {
        Request::Ping => Ok(Response::Pong),

        Request::Hello { version: _ } => Ok(Response::Hello {
            version: PROTOCOL_VERSION.to_string(),
        }),

        Request::SubmitWorkflow { workflow } => {
            let workflow: forge_core::Workflow = serde_json::from_value(workflow)
                .map_err(protocol::ProtocolError::from)?;
            ctx.services.store.save_workflow(&workflow, ctx.services.now_ms())?;
            Ok(Response::Ok)
        }

        Request::RunWorkflow { workflow_id } => {
            let id = forge_core::WorkflowId::new(workflow_id);
            let mut workflow = ctx.services.store.require_workflow(&id)?;
            let mut runtime = WorkflowRuntime::new(ctx.services.clone());
            runtime.drive(&mut workflow).await?;
            Ok(Response::WorkflowState {
                workflow: serde_json::to_value(&workflow).unwrap_or_default(),
            })
        }

        Request::GetWorkflow { workflow_id } => {
            let id = forge_core::WorkflowId::new(workflow_id);
            match ctx.services.store.load_workflow(&id)? {
                Some(workflow) => Ok(Response::WorkflowState {
                    workflow: serde_json::to_value(&workflow).unwrap_or_default(),
                }),
                None => Ok(Response::Error {
                    message: format!("unknown workflow: {}", id.as_str()),
                }),
            }
        }

        Request::ListWorkflows => {
            let workflow_ids = ctx.services.store.list_workflow_ids()?;
            Ok(Response::WorkflowList { workflow_ids })
        }

        Request::Subscribe => unreachable!("Subscribe is handled in handle_connection before dispatch"),

        Request::Shutdown => {
            ctx.shutdown.notify_one();
            Ok(Response::Ok)
        }
    }
}

#[cfg(test)]
#[path = "../listener_tests.rs"]
mod tests;
