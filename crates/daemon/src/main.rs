// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `forged` — per-project daemon.
//!
//! Background process that owns the UDS event broadcast socket and drives
//! due stage retries.
//!
//! Architecture:
//! - Listener Task: spawned task handling socket I/O (requests, and the
//!   promoted `Subscribe` broadcast feed)
//! - Retry Loop: main task ticking `forge_engine::workflow::process_due_retries`

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

mod error;
mod lifecycle;
mod listener;
mod protocol;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use forge_engine::workflow::process_due_retries;
use tokio::signal::unix::{signal, SignalKind};
use tokio::sync::Notify;
use tracing::{error, info};

use crate::error::DaemonError;
use crate::lifecycle::{Config, StartupResult};
use crate::listener::{ListenCtx, Listener};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    if let Some(arg) = std::env::args().nth(1) {
        match arg.as_str() {
            "--version" | "-V" | "-v" => {
                println!("forged {}", env!("CARGO_PKG_VERSION"));
                return Ok(());
            }
            "--help" | "-h" | "help" => {
                print_help();
                return Ok(());
            }
            _ => {}
        }
    }

    let project_root = std::env::args()
        .nth(1)
        .filter(|a| !a.starts_with('-'))
        .map(PathBuf::from)
        .unwrap_or(std::env::current_dir()?);

    let config = Config::load(&project_root);

    rotate_log_if_needed(&config.log_path);
    write_startup_marker(&config)?;
    let log_guard = setup_logging(&config)?;

    info!(project_root = %project_root.display(), "starting forged");

    let StartupResult { daemon, listener: unix_listener } = match lifecycle::startup(&config).await {
        Ok(r) => r,
        Err(DaemonError::LockFailed) => {
            eprintln!("forged is already running for {}", project_root.display());
            std::process::exit(1);
        }
        Err(e) => {
            write_startup_error(&config, &e);
            error!("failed to start daemon: {}", e);
            drop(log_guard);
            return Err(e.into());
        }
    };

    let shutdown_notify = Arc::new(Notify::new());
    let ctx = Arc::new(ListenCtx {
        services: daemon.services.clone(),
        start_time: daemon.start_time,
        shutdown: Arc::clone(&shutdown_notify),
    });
    tokio::spawn(Listener::new(unix_listener, ctx).run());

    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigint = signal(SignalKind::interrupt())?;
    let mut retry_tick = tokio::time::interval(retry_check_interval());

    info!(socket = %config.socket_path.display(), "daemon ready");
    println!("READY");

    loop {
        tokio::select! {
            _ = shutdown_notify.notified() => {
                info!("shutdown requested via command");
                break;
            }
            _ = sigterm.recv() => {
                info!("received SIGTERM, shutting down");
                break;
            }
            _ = sigint.recv() => {
                info!("received SIGINT, shutting down");
                break;
            }
            _ = retry_tick.tick() => {
                match process_due_retries(&daemon.services).await {
                    Ok(0) => {}
                    Ok(n) => info!(count = n, "processed due stage retries"),
                    Err(e) => error!(error = %e, "error processing due stage retries"),
                }
            }
        }
    }

    daemon.shutdown()?;
    info!("daemon stopped");
    Ok(())
}

fn print_help() {
    println!("forged {}", env!("CARGO_PKG_VERSION"));
    println!("Per-project background process for the workflow engine's event socket");
    println!();
    println!("USAGE:");
    println!("    forged [project_root]");
    println!();
    println!("forged is typically started by the `forge` CLI and should not be");
    println!("invoked directly. It listens on a Unix socket under <project_root>/.forge");
    println!("for workflow commands and broadcasts engine events to subscribers.");
    println!();
    println!("OPTIONS:");
    println!("    -h, --help       Print help information");
    println!("    -v, --version    Print version information");
}

/// Retry check interval, configurable via `FORGE_RETRY_CHECK_MS` (default: 1000ms).
fn retry_check_interval() -> Duration {
    std::env::var("FORGE_RETRY_CHECK_MS")
        .ok()
        .and_then(|v| v.parse().ok())
        .map(Duration::from_millis)
        .unwrap_or(Duration::from_secs(1))
}

/// Maximum log file size before rotation (10 MB).
const MAX_LOG_SIZE: u64 = 10 * 1024 * 1024;

/// Number of rotated log files to keep (daemon.log.1, .2, .3).
const MAX_ROTATED_LOGS: u32 = 3;

/// Rotate the daemon log file if it exceeds [`MAX_LOG_SIZE`].
///
/// Shifts `daemon.log` -> `daemon.log.1` -> `daemon.log.2` -> `daemon.log.3`,
/// deleting the oldest. Best-effort: rotation failures are silently ignored
/// so the daemon still starts.
fn rotate_log_if_needed(log_path: &std::path::Path) {
    let size = match std::fs::metadata(log_path) {
        Ok(m) => m.len(),
        Err(_) => return,
    };

    if size < MAX_LOG_SIZE {
        return;
    }

    let log_str = log_path.display().to_string();

    for i in (1..MAX_ROTATED_LOGS).rev() {
        let from = format!("{log_str}.{i}");
        let to = format!("{log_str}.{}", i + 1);
        let _ = std::fs::rename(&from, &to);
    }

    let _ = std::fs::rename(log_path, format!("{log_str}.1"));
}

/// Startup marker prefix written to the log before anything else. The CLI
/// uses this to find where the current startup attempt begins.
const STARTUP_MARKER_PREFIX: &str = "--- forged: starting (pid: ";

fn write_startup_marker(config: &Config) -> Result<(), DaemonError> {
    use std::io::Write;

    if let Some(parent) = config.log_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let mut file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&config.log_path)?;
    writeln!(file, "{}{}) ---\n", STARTUP_MARKER_PREFIX, std::process::id())?;

    Ok(())
}

/// Write a startup error synchronously to the log file, so it is visible to
/// the CLI even if the process exits quickly (tracing's non-blocking writer
/// may not flush in time).
fn write_startup_error(config: &Config, error: &DaemonError) {
    use std::io::Write;

    let Ok(mut file) = std::fs::OpenOptions::new().create(true).append(true).open(&config.log_path) else {
        return;
    };
    let _ = writeln!(file, "ERROR failed to start daemon: {}", error);
}

fn setup_logging(config: &Config) -> Result<tracing_appender::non_blocking::WorkerGuard, DaemonError> {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    if let Some(parent) = config.log_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let log_dir = config.log_path.parent().unwrap_or(&config.forge_dir);
    let log_file_name = config
        .log_path
        .file_name()
        .unwrap_or_else(|| std::ffi::OsStr::new("daemon.log"));
    let file_appender = tracing_appender::rolling::never(log_dir, log_file_name);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(non_blocking))
        .init();

    Ok(guard)
}

#[cfg(test)]
#[path = "main_tests.rs"]
mod tests;
