// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Errors raised while starting or running the daemon.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DaemonError {
    #[error("another daemon is already running for this project")]
    LockFailed,
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("storage error: {0}")]
    Storage(#[from] forge_storage::StorageError),
    #[error("gateway error: {0}")]
    Gateway(#[from] forge_gateway::GatewayError),
    #[error("engine error: {0}")]
    Engine(#[from] forge_engine::EngineError),
    #[error("no home directory could be determined")]
    NoHomeDir,
}
