// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon lifecycle management: startup, shutdown, crash recovery.

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use fs2::FileExt;
use forge_core::{EngineConfig, EventBus, SystemClock};
use forge_engine::workflow::recovery;
use forge_engine::EngineServices;
use forge_gateway::Gateway;
use forge_storage::Store;
use tokio::net::UnixListener;
use tracing::{info, warn};

use crate::error::DaemonError;

/// Per-project daemon configuration. Everything lives under
/// `<project_root>/.forge/`.
#[derive(Debug, Clone)]
pub struct Config {
    pub project_root: PathBuf,
    pub forge_dir: PathBuf,
    pub socket_path: PathBuf,
    pub lock_path: PathBuf,
    pub db_path: PathBuf,
    pub log_path: PathBuf,
}

impl Config {
    pub fn load(project_root: &Path) -> Self {
        let forge_dir = project_root.join(".forge");
        Self {
            project_root: project_root.to_path_buf(),
            socket_path: forge_dir.join("events.sock"),
            lock_path: forge_dir.join("daemon.lock"),
            db_path: forge_dir.join("forge.db"),
            log_path: forge_dir.join("daemon.log"),
            forge_dir,
        }
    }
}

/// Running daemon state, held for the life of the process.
pub struct DaemonState {
    pub config: Config,
    #[allow(dead_code)]
    lock_file: File,
    pub services: EngineServices,
    pub start_time: Instant,
}

pub struct StartupResult {
    pub daemon: DaemonState,
    pub listener: UnixListener,
}

/// Acquire the project lock, open storage, recover any workflows left
/// mid-flight by a previous crash, and bind the event socket.
pub async fn startup(config: &Config) -> Result<StartupResult, DaemonError> {
    match startup_inner(config).await {
        Ok(result) => Ok(result),
        Err(e) => {
            if !matches!(e, DaemonError::LockFailed) {
                cleanup_on_failure(config);
            }
            Err(e)
        }
    }
}

async fn startup_inner(config: &Config) -> Result<StartupResult, DaemonError> {
    std::fs::create_dir_all(&config.forge_dir)?;

    let lock_file = std::fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(false)
        .open(&config.lock_path)?;
    lock_file.try_lock_exclusive().map_err(|_| DaemonError::LockFailed)?;
    lock_file.set_len(0)?;
    let mut lock_file = lock_file;
    writeln!(lock_file, "{}", std::process::id())?;

    let store = Store::open(&config.db_path)?;
    let engine_config = EngineConfig::load(&config.project_root);
    let bus = EventBus::new();
    let home = resolve_home_dir()?;
    let mut gateway = Gateway::new(&home, bus.clone(), SystemClock)?;
    gateway.register_default_model(&resolve_provider())?;

    let services = EngineServices::new(
        Arc::new(gateway),
        bus,
        Arc::new(store),
        engine_config,
        config.project_root.clone(),
        SystemClock,
    );

    let recovered = recovery::recover(&services.store)?;
    if !recovered.is_empty() {
        info!(count = recovered.len(), "recovering workflows left mid-flight by a crash");
    }
    for workflow in recovered {
        services.store.save_workflow(&workflow, services.now_ms())?;
    }

    if config.socket_path.exists() {
        std::fs::remove_file(&config.socket_path)?;
    }
    let listener = UnixListener::bind(&config.socket_path)?;
    set_socket_mode(&config.socket_path)?;

    info!(socket = %config.socket_path.display(), "daemon started");

    Ok(StartupResult {
        daemon: DaemonState { config: config.clone(), lock_file, services, start_time: Instant::now() },
        listener,
    })
}

#[cfg(unix)]
fn set_socket_mode(path: &Path) -> Result<(), DaemonError> {
    use std::os::unix::fs::PermissionsExt;
    let perms = std::fs::Permissions::from_mode(0o600);
    std::fs::set_permissions(path, perms)?;
    Ok(())
}

#[cfg(not(unix))]
fn set_socket_mode(_path: &Path) -> Result<(), DaemonError> {
    Ok(())
}

impl DaemonState {
    pub fn shutdown(&self) -> Result<(), DaemonError> {
        info!("shutting down daemon");
        if self.config.socket_path.exists() {
            if let Err(e) = std::fs::remove_file(&self.config.socket_path) {
                warn!(error = %e, "failed to remove socket file");
            }
        }
        if self.config.lock_path.exists() {
            if let Err(e) = std::fs::remove_file(&self.config.lock_path) {
                warn!(error = %e, "failed to remove lock file");
            }
        }
        Ok(())
    }
}

/// Directory `Gateway` uses to store provider credentials. `FORGE_HOME`
/// overrides it, mainly so tests don't touch the real user home.
fn resolve_home_dir() -> Result<PathBuf, DaemonError> {
    if let Ok(dir) = std::env::var("FORGE_HOME") {
        return Ok(PathBuf::from(dir));
    }
    dirs::home_dir().ok_or(DaemonError::NoHomeDir)
}

/// Which provider's `"primary"` model to register at startup. Set by the
/// CLI when it spawns `forged`, from `--provider` or its own default.
fn resolve_provider() -> String {
    std::env::var("FORGE_PROVIDER").unwrap_or_else(|_| "claude".to_string())
}

fn cleanup_on_failure(config: &Config) {
    if config.socket_path.exists() {
        let _ = std::fs::remove_file(&config.socket_path);
    }
    if config.lock_path.exists() {
        let _ = std::fs::remove_file(&config.lock_path);
    }
}

#[cfg(test)]
#[path = "lifecycle_tests.rs"]
mod tests;
