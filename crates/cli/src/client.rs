// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon client for CLI commands

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use forge_core::Workflow;
use forge_daemon::protocol::{self, ProtocolError, Request, Response};
use thiserror::Error;
use tokio::net::UnixStream;

use crate::client_lifecycle::log_connection_error;
use crate::daemon_process::{
    cleanup_stale_socket, daemon_socket, probe_socket, read_startup_error,
    start_daemon_background, wrap_with_startup_error,
};

/// Timeout for IPC requests (hello, run, get, list, shutdown)
pub fn timeout_ipc() -> Duration {
    crate::env::timeout_ipc_ms().unwrap_or(Duration::from_secs(5))
}

/// Timeout for waiting for daemon to start
pub fn timeout_connect() -> Duration {
    crate::env::timeout_connect_ms().unwrap_or(Duration::from_secs(5))
}

/// Timeout for waiting for process to exit
pub fn timeout_exit() -> Duration {
    crate::env::timeout_exit_ms().unwrap_or(Duration::from_secs(2))
}

/// Polling interval for connection retries
pub fn poll_interval() -> Duration {
    crate::env::connect_poll_ms().unwrap_or(Duration::from_millis(50))
}

/// Client errors
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Daemon not running")]
    DaemonNotRunning,

    #[error("Failed to start daemon: {0}")]
    DaemonStartFailed(String),

    #[error("Connection timeout waiting for daemon to start")]
    DaemonStartTimeout,

    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    #[error("Workflow rejected: {0}")]
    Rejected(String),

    #[error("Unexpected response from daemon")]
    UnexpectedResponse,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Workflow state did not decode: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Daemon client, scoped to a single project's `forged`.
pub struct DaemonClient {
    project_root: PathBuf,
    socket_path: PathBuf,
}

impl DaemonClient {
    /// For action commands (`develop`, `run`, `loop`, `resume`) - auto-start
    /// the daemon if it isn't running, restarting a stale one at most once.
    /// `provider` selects the backend a freshly-spawned `forged` registers
    /// as `"primary"`; it has no effect on an already-running daemon.
    pub async fn for_action(project_root: &Path, provider: &str) -> Result<Self, ClientError> {
        Self::connect_or_start(project_root, provider).await
    }

    /// For query commands (`watch`, `auth-status`) - connect only, no
    /// auto-start. Nothing useful to query from a daemon that isn't there.
    pub fn for_query(project_root: &Path) -> Result<Self, ClientError> {
        Self::connect(project_root)
    }

    /// Connect to daemon, auto-starting it in the background if not running
    /// or if its socket is stale (process died without cleaning up).
    pub async fn connect_or_start(project_root: &Path, provider: &str) -> Result<Self, ClientError> {
        match Self::connect(project_root) {
            Ok(client) => {
                if probe_socket(&client.socket_path) {
                    Ok(client)
                } else {
                    cleanup_stale_socket(project_root);
                    let child = start_daemon_background(project_root, provider)?;
                    Self::connect_with_retry(project_root, timeout_connect(), child).await
                }
            }
            Err(ClientError::DaemonNotRunning) => {
                let child = start_daemon_background(project_root, provider)?;
                Self::connect_with_retry(project_root, timeout_connect(), child).await
            }
            Err(e) => Err(wrap_with_startup_error(project_root, e)),
        }
    }

    /// Connect to an existing daemon (no auto-start).
    pub fn connect(project_root: &Path) -> Result<Self, ClientError> {
        let socket_path = daemon_socket(project_root);

        if !socket_path.exists() {
            let err = ClientError::DaemonNotRunning;
            log_connection_error(project_root, &err);
            return Err(err);
        }

        Ok(Self {
            project_root: project_root.to_path_buf(),
            socket_path,
        })
    }

    async fn connect_with_retry(
        project_root: &Path,
        timeout: Duration,
        mut child: std::process::Child,
    ) -> Result<Self, ClientError> {
        let start = Instant::now();
        while start.elapsed() < timeout {
            match child.try_wait() {
                Ok(Some(status)) => {
                    let poll_start = Instant::now();
                    while poll_start.elapsed() < timeout_exit() {
                        if let Some(err) = read_startup_error(project_root) {
                            return Err(ClientError::DaemonStartFailed(err));
                        }
                        tokio::time::sleep(poll_interval()).await;
                    }
                    return Err(ClientError::DaemonStartFailed(format!("exited with {status}")));
                }
                Ok(None) => {}
                Err(_) => {}
            }

            match Self::connect(project_root) {
                Ok(client) => return Ok(client),
                Err(ClientError::DaemonNotRunning) => {
                    tokio::time::sleep(poll_interval()).await;
                }
                Err(e) => return Err(wrap_with_startup_error(project_root, e)),
            }
        }

        Err(wrap_with_startup_error(project_root, ClientError::DaemonStartTimeout))
    }

    /// Send a request and receive a response with specific timeouts.
    async fn send_with_timeout(
        &self,
        request: &Request,
        read_timeout: Duration,
        write_timeout: Duration,
    ) -> Result<Response, ClientError> {
        let stream = UnixStream::connect(&self.socket_path).await?;
        let (mut reader, mut writer) = stream.into_split();

        let data = protocol::encode(request)?;
        tokio::time::timeout(write_timeout, protocol::write_message(&mut writer, &data))
            .await
            .map_err(|_| ProtocolError::Timeout)??;

        let response_bytes = tokio::time::timeout(read_timeout, protocol::read_message(&mut reader))
            .await
            .map_err(|_| ProtocolError::Timeout)??;

        let response: Response = protocol::decode(&response_bytes)?;
        Ok(response)
    }

    /// Send a request and receive a response, with the default IPC timeout.
    pub async fn send(&self, request: &Request) -> Result<Response, ClientError> {
        match self.send_with_timeout(request, timeout_ipc(), timeout_ipc()).await {
            Ok(response) => Ok(response),
            Err(e) => {
                log_connection_error(&self.project_root, &e);
                Err(e)
            }
        }
    }

    /// Helper for requests that expect `Ok` or `Error`.
    async fn send_simple(&self, request: &Request) -> Result<(), ClientError> {
        match self.send(request).await? {
            Response::Ok => Ok(()),
            Response::Error { message } => Err(ClientError::Rejected(message)),
            _ => Err(ClientError::UnexpectedResponse),
        }
    }

    /// Health check.
    pub async fn ping(&self) -> Result<(), ClientError> {
        match self.send(&Request::Ping).await? {
            Response::Pong => Ok(()),
            other => Self::reject(other),
        }
    }

    /// Version handshake.
    pub async fn hello(&self) -> Result<String, ClientError> {
        let request = Request::Hello {
            version: protocol::PROTOCOL_VERSION.to_string(),
        };
        match self.send(&request).await? {
            Response::Hello { version } => Ok(version),
            other => Self::reject(other),
        }
    }

    /// Persist a freshly-built workflow for later (or immediate) driving.
    pub async fn submit_workflow(&self, workflow: &Workflow) -> Result<(), ClientError> {
        let request = Request::SubmitWorkflow {
            workflow: serde_json::to_value(workflow)?,
        };
        self.send_simple(&request).await
    }

    /// Drive a submitted workflow to completion (or until a retry is due).
    pub async fn run_workflow(&self, workflow_id: &str) -> Result<Workflow, ClientError> {
        let request = Request::RunWorkflow {
            workflow_id: workflow_id.to_string(),
        };
        match self.send(&request).await? {
            Response::WorkflowState { workflow } => Ok(serde_json::from_value(workflow)?),
            other => Self::reject(other),
        }
    }

    /// Fetch a workflow's current stored state.
    pub async fn get_workflow(&self, workflow_id: &str) -> Result<Workflow, ClientError> {
        let request = Request::GetWorkflow {
            workflow_id: workflow_id.to_string(),
        };
        match self.send(&request).await? {
            Response::WorkflowState { workflow } => Ok(serde_json::from_value(workflow)?),
            other => Self::reject(other),
        }
    }

    /// List every known workflow id for this project.
    pub async fn list_workflows(&self) -> Result<Vec<String>, ClientError> {
        match self.send(&Request::ListWorkflows).await? {
            Response::WorkflowList { workflow_ids } => Ok(workflow_ids),
            other => Self::reject(other),
        }
    }

    /// Request daemon shutdown.
    pub async fn shutdown(&self) -> Result<(), ClientError> {
        self.send_simple(&Request::Shutdown).await
    }

    /// Promote this connection into a subscribed event feed: send
    /// `Subscribe`, confirm the `Ok` response, and return a line reader so
    /// the caller can pull newline-delimited event JSON off the wire for as
    /// long as it likes.
    pub async fn subscribe(
        &self,
    ) -> Result<tokio::io::Lines<tokio::io::BufReader<tokio::net::unix::OwnedReadHalf>>, ClientError> {
        use tokio::io::AsyncBufReadExt;

        let stream = UnixStream::connect(&self.socket_path).await?;
        let (mut reader, mut writer) = stream.into_split();

        let data = protocol::encode(&Request::Subscribe)?;
        protocol::write_message(&mut writer, &data).await?;

        let response_bytes = protocol::read_message(&mut reader).await?;
        match protocol::decode(&response_bytes)? {
            Response::Ok => Ok(tokio::io::BufReader::new(reader).lines()),
            other => Self::reject(other),
        }
    }

    fn reject<T>(resp: Response) -> Result<T, ClientError> {
        match resp {
            Response::Error { message } => Err(ClientError::Rejected(message)),
            _ => Err(ClientError::UnexpectedResponse),
        }
    }
}

#[cfg(test)]
#[path = "client_tests.rs"]
mod tests;
