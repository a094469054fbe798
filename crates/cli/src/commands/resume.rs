// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `forge resume [workflow_id]` — re-drive one unsettled workflow after a
//! crash or restart. Defaults to the most recently created unsettled
//! workflow for this project when no id is given.

use std::path::Path;

use anyhow::Result;
use forge_core::WorkflowStatus;

use crate::client::DaemonClient;

#[derive(clap::Args)]
pub struct ResumeArgs {
    /// Workflow to resume (defaults to the most recent unsettled one)
    pub workflow_id: Option<String>,
}

pub async fn handle(args: ResumeArgs, project_root: &Path) -> Result<()> {
    let client = DaemonClient::for_action(project_root, &crate::env::default_provider()).await?;

    let workflow_id = match args.workflow_id {
        Some(id) => id,
        None => {
            let mut ids = client.list_workflows().await?;
            // Workflow ids are UUIDs with no inherent order; fall back to
            // checking each one's state and taking the last unsettled match.
            ids.reverse();
            let mut found = None;
            for id in ids {
                let workflow = client.get_workflow(&id).await?;
                if matches!(workflow.status, WorkflowStatus::Running | WorkflowStatus::FailedContinue) {
                    found = Some(id);
                    break;
                }
            }
            found.ok_or_else(|| anyhow::anyhow!("no unsettled workflow found for this project"))?
        }
    };

    let workflow = client.run_workflow(&workflow_id).await?;
    println!("workflow {}: {:?}", workflow.id.as_str(), workflow.status);
    for stage in workflow.stages.values() {
        println!("  {:<12} {:?}", stage.ref_id, stage.status);
    }
    Ok(())
}
