// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `forge run <spec>` — submit and run a pre-built workflow spec file.
//!
//! Unlike `plan`/`develop`, which construct a workflow from a free-form
//! request, `run` takes a JSON-serialized [`forge_core::Workflow`] straight
//! from disk. This is the escape hatch for workflows assembled by tooling
//! other than this CLI's own planner.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use forge_core::Workflow;

use crate::client::DaemonClient;

use super::Ctx;

#[derive(clap::Args)]
pub struct RunArgs {
    /// Path to a JSON-serialized workflow spec
    pub spec: PathBuf,
}

pub async fn handle(args: RunArgs, ctx: &Ctx, project_root: &Path) -> Result<()> {
    let raw = std::fs::read_to_string(&args.spec)
        .with_context(|| format!("failed to read {}", args.spec.display()))?;
    let workflow: Workflow = serde_json::from_str(&raw)
        .with_context(|| format!("failed to parse {} as a workflow spec", args.spec.display()))?;

    let client = DaemonClient::for_action(project_root, ctx.provider.as_str()).await?;
    client.submit_workflow(&workflow).await?;
    let workflow = client.run_workflow(workflow.id.as_str()).await?;

    println!("workflow {}: {:?}", workflow.id.as_str(), workflow.status);
    for stage in workflow.stages.values() {
        println!("  {:<12} {:?}", stage.ref_id, stage.status);
    }
    Ok(())
}
