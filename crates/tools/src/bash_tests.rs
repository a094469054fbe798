// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[tokio::test]
async fn captures_stdout_and_exit_code() {
    let result = run("echo hello", None, Duration::from_secs(5)).await.unwrap();
    assert_eq!(result.stdout.trim(), "hello");
    assert_eq!(result.exit_code, 0);
}

#[tokio::test]
async fn non_zero_exit_is_not_an_error() {
    let result = run("exit 7", None, Duration::from_secs(5)).await.unwrap();
    assert_eq!(result.exit_code, 7);
}

#[tokio::test]
async fn respects_workdir() {
    let dir = tempfile::tempdir().unwrap();
    tokio::fs::write(dir.path().join("marker.txt"), "").await.unwrap();
    let result = run("ls", Some(dir.path()), Duration::from_secs(5)).await.unwrap();
    assert!(result.stdout.contains("marker.txt"));
}

#[tokio::test]
async fn times_out_long_running_commands() {
    let err = run("sleep 5", None, Duration::from_millis(50)).await.unwrap_err();
    assert!(matches!(err, ToolError::Timeout(_)));
}

#[test]
fn render_includes_exit_code_and_stderr_label() {
    let result = BashResult {
        stdout: "ok".to_string(),
        stderr: "warn".to_string(),
        exit_code: 0,
    };
    let rendered = result.render();
    assert!(rendered.contains("ok"));
    assert!(rendered.contains("stderr:\nwarn"));
    assert!(rendered.contains("[exit code: 0]"));
}
