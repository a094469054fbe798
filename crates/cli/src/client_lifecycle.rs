// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon lifecycle and diagnostic logging for the CLI client.

use std::path::Path;

use crate::client::{timeout_exit, ClientError, DaemonClient};
use crate::daemon_process::{
    cleanup_stale_files, daemon_socket, force_kill_daemon, process_exists, read_daemon_pid,
    wait_for_exit,
};

/// Stop the daemon for `project_root` (graceful first, then forceful).
/// Returns true if a daemon was stopped, false if it wasn't running.
pub async fn daemon_stop(project_root: &Path, kill: bool) -> Result<bool, ClientError> {
    let client = match DaemonClient::connect(project_root) {
        Ok(c) => c,
        Err(ClientError::DaemonNotRunning) => {
            cleanup_stale_files(project_root);
            return Ok(false);
        }
        Err(e) => return Err(e),
    };

    let shutdown_result = if kill { None } else { Some(client.shutdown().await) };

    if let Some(pid) = read_daemon_pid(project_root) {
        if matches!(shutdown_result, Some(Ok(()))) {
            wait_for_exit(pid, timeout_exit()).await;
        }
        if process_exists(pid) {
            force_kill_daemon(pid);
            wait_for_exit(pid, timeout_exit()).await;
        }
    }

    cleanup_stale_files(project_root);
    Ok(true)
}

/// Write a diagnostic message to `<project_root>/.forge/cli.log`.
fn write_cli_log(project_root: &Path, message: String) {
    use std::io::Write;
    use std::time::SystemTime;

    let log_path = project_root.join(".forge").join("cli.log");
    if let Some(parent) = log_path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }

    if let Ok(mut file) = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
    {
        let timestamp = SystemTime::now()
            .duration_since(SystemTime::UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);
        let pid = std::process::id();

        let _ = writeln!(file, "[ts={}] pid={} {}", timestamp, pid, message);
    }
}

/// Log a connection error for debugging.
pub fn log_connection_error(project_root: &Path, error: &ClientError) {
    let socket_path = daemon_socket(project_root).display().to_string();
    write_cli_log(project_root, format!("socket={} error={}", socket_path, error));
}
