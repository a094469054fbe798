// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use forge_core::{Stage, StageContext};
use tempfile::tempdir;

fn stage_with(project_root: &std::path::Path, commands: Vec<&str>) -> Stage {
    let mut stage = Stage::new("setup", "setup", "Setup");
    let mut ctx = StageContext::new();
    ctx.set("project_root", project_root.display().to_string());
    ctx.set("setup_commands", commands.into_iter().map(|c| c.to_string()).collect::<Vec<_>>());
    stage.context = ctx;
    stage
}

#[tokio::test]
async fn run_setup_command_captures_nonzero_exit() {
    let dir = tempdir().unwrap();
    let (code, output) = run_setup_command("exit 3", dir.path()).await;
    assert_eq!(code, 3);
    assert!(output.contains("exit code: 3"));
}

#[tokio::test]
async fn run_setup_command_captures_stdout() {
    let dir = tempdir().unwrap();
    let (code, output) = run_setup_command("echo hi", dir.path()).await;
    assert_eq!(code, 0);
    assert!(output.contains("hi"));
}
