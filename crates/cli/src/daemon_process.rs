// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon process management utilities.
//!
//! Functions for starting, stopping, and monitoring the per-project `forged`
//! process. Everything here is scoped to a `project_root`; there is no
//! global, user-level daemon.

use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::{Duration, Instant};

use forge_daemon::Config;

use crate::client::ClientError;

/// Start the daemon in the background, returning the child process handle.
/// `provider` is passed down via `FORGE_PROVIDER`, which `forged` reads at
/// startup to pick which backend to register as its `"primary"` model.
pub fn start_daemon_background(project_root: &Path, provider: &str) -> Result<std::process::Child, ClientError> {
    let forged_path = find_forged_binary()?;

    Command::new(&forged_path)
        .arg(project_root)
        .env("FORGE_PROVIDER", provider)
        .stdin(std::process::Stdio::null())
        .stdout(std::process::Stdio::null())
        .stderr(std::process::Stdio::null())
        .spawn()
        .map_err(|e| ClientError::DaemonStartFailed(e.to_string()))
}

/// Stop the daemon synchronously using SIGTERM + polling.
pub fn stop_daemon_sync(project_root: &Path) {
    if let Some(pid) = read_daemon_pid(project_root) {
        kill_signal("-15", pid);

        let start = Instant::now();
        let timeout = super::client::timeout_exit();
        while start.elapsed() < timeout {
            if !process_exists(pid) {
                break;
            }
            std::thread::sleep(Duration::from_millis(50));
        }

        if process_exists(pid) {
            force_kill_daemon(pid);
            let start = Instant::now();
            while start.elapsed() < timeout {
                if !process_exists(pid) {
                    break;
                }
                std::thread::sleep(Duration::from_millis(50));
            }
        }
    }

    cleanup_stale_files(project_root);
}

/// Wait for a process to exit.
pub async fn wait_for_exit(pid: u32, timeout: Duration) -> bool {
    let start = Instant::now();
    while start.elapsed() < timeout {
        if !process_exists(pid) {
            return true;
        }
        tokio::time::sleep(super::client::poll_interval()).await;
    }
    false
}

/// Find the `forged` binary.
fn find_forged_binary() -> Result<PathBuf, ClientError> {
    if let Some(path) = crate::env::daemon_binary() {
        return Ok(PathBuf::from(path));
    }

    let current_exe = std::env::current_exe().ok();

    // Only use CARGO_MANIFEST_DIR if the CLI itself is a debug build, so a
    // release `forge` never picks up a stale dev sibling.
    let is_debug_build = current_exe
        .as_ref()
        .and_then(|p| p.to_str())
        .map(|s| s.contains("target/debug"))
        .unwrap_or(false);

    if is_debug_build {
        if let Some(manifest_dir) = crate::env::cargo_manifest_dir() {
            let dev_path = PathBuf::from(manifest_dir)
                .parent()
                .and_then(|p| p.parent())
                .map(|p| p.join("target/debug/forged"));
            if let Some(path) = dev_path {
                if path.exists() {
                    return Ok(path);
                }
            }
        }
    }

    if let Some(ref exe) = current_exe {
        if let Some(dir) = exe.parent() {
            let sibling = dir.join("forged");
            if sibling.exists() {
                return Ok(sibling);
            }
        }
    }

    Ok(PathBuf::from("forged"))
}

/// Socket path for `project_root`'s daemon.
pub fn daemon_socket(project_root: &Path) -> PathBuf {
    Config::load(project_root).socket_path
}

/// Lock file path, which also holds the daemon's pid (one line, written at
/// startup — there is no separate pid file).
fn daemon_lock_path(project_root: &Path) -> PathBuf {
    Config::load(project_root).lock_path
}

fn daemon_log_path(project_root: &Path) -> PathBuf {
    Config::load(project_root).log_path
}

/// Remove the socket and lock files left behind by a dead daemon.
pub fn cleanup_stale_files(project_root: &Path) {
    let config = Config::load(project_root);
    if config.socket_path.exists() {
        let _ = std::fs::remove_file(&config.socket_path);
    }
    if config.lock_path.exists() {
        let _ = std::fs::remove_file(&config.lock_path);
    }
}

/// Read the daemon's pid out of its lock file, if present and running.
pub fn read_daemon_pid(project_root: &Path) -> Option<u32> {
    let content = std::fs::read_to_string(daemon_lock_path(project_root)).ok()?;
    content.trim().parse::<u32>().ok()
}

fn kill_signal(signal: &str, pid: u32) -> bool {
    Command::new("kill")
        .args([signal, &pid.to_string()])
        .stdin(std::process::Stdio::null())
        .stdout(std::process::Stdio::null())
        .stderr(std::process::Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

pub fn process_exists(pid: u32) -> bool {
    kill_signal("-0", pid)
}

pub fn force_kill_daemon(pid: u32) -> bool {
    kill_signal("-9", pid)
}

/// Marker `forged` writes to its log before anything else.
const STARTUP_MARKER_PREFIX: &str = "--- forged: starting (pid: ";

/// Read daemon log from the most recent startup marker, looking for errors.
pub fn read_startup_error(project_root: &Path) -> Option<String> {
    let content = std::fs::read_to_string(daemon_log_path(project_root)).ok()?;
    parse_startup_error(&content)
}

fn parse_startup_error(content: &str) -> Option<String> {
    let start_pos = content.rfind(STARTUP_MARKER_PREFIX)?;
    let startup_log = &content[start_pos..];

    let errors: Vec<&str> = startup_log
        .lines()
        .filter(|line| line.contains(" ERROR ") || line.contains("Failed to start"))
        .collect();

    if errors.is_empty() {
        return None;
    }

    let error_messages: Vec<String> = errors
        .iter()
        .filter_map(|line| line.split_once(": ").map(|(_, msg)| msg.to_string()))
        .collect();

    if error_messages.is_empty() {
        Some(errors.join("\n"))
    } else {
        Some(error_messages.join("\n"))
    }
}

/// Wrap an error with startup log info if available.
pub fn wrap_with_startup_error(project_root: &Path, err: ClientError) -> ClientError {
    if matches!(err, ClientError::DaemonStartFailed(_)) {
        return err;
    }

    match read_startup_error(project_root) {
        Some(startup_error) => ClientError::DaemonStartFailed(startup_error),
        None => err,
    }
}

/// Probe whether a Unix socket is accepting connections.
pub fn probe_socket(socket_path: &Path) -> bool {
    std::os::unix::net::UnixStream::connect(socket_path).is_ok()
}

/// Remove stale socket/lock files when the daemon is not actually running.
pub fn cleanup_stale_socket(project_root: &Path) {
    match read_daemon_pid(project_root) {
        Some(pid) if process_exists(pid) => {}
        _ => cleanup_stale_files(project_root),
    }
}

#[cfg(test)]
#[path = "daemon_process_tests.rs"]
mod tests;
