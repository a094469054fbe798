// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `forge init` — prepare `.forge/` in the current directory.
//!
//! This is deliberately minimal: it creates the state directory `forged`
//! expects and nothing else. There is no interactive project scaffolding —
//! that is the domain of editors and generators outside this tool.

use std::path::Path;

use anyhow::Result;

pub async fn handle(project_root: &Path) -> Result<()> {
    let forge_dir = project_root.join(".forge");
    if forge_dir.is_dir() {
        println!("{} already initialized", project_root.display());
        return Ok(());
    }

    std::fs::create_dir_all(&forge_dir)
        .map_err(|e| anyhow::anyhow!("failed to create {}: {}", forge_dir.display(), e))?;

    println!("initialized {}", forge_dir.display());
    Ok(())
}
