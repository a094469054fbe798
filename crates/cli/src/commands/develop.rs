// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `forge develop <request>` — run the full plan-through-review pipeline.

use std::path::Path;
use std::time::Duration;

use anyhow::Result;
use forge_core::{IdGen, UuidIdGen, Workflow, WorkflowId, WorkflowStatus};
use forge_engine::workflow::pipeline::standard_workflow;

use crate::client::DaemonClient;
use crate::poll::{Poller, Tick};

use super::Ctx;

#[derive(clap::Args)]
pub struct DevelopArgs {
    /// What to build
    pub request: String,
}

pub async fn handle(args: DevelopArgs, ctx: &Ctx, project_root: &Path) -> Result<()> {
    let id = WorkflowId::new(UuidIdGen.next());
    let workflow = standard_workflow(id.clone(), &args.request, project_root);

    let client = DaemonClient::for_action(project_root, ctx.provider.as_str()).await?;
    client.submit_workflow(&workflow).await?;

    let mut workflow = client.run_workflow(id.as_str()).await?;
    let mut poller = Poller::new(Duration::from_secs(2), None);

    while !is_settled(&workflow) {
        if !ctx.headless {
            eprintln!("{}: awaiting retry", workflow.id.as_str());
        }
        match poller.tick().await {
            Tick::Ready => {}
            Tick::Timeout => break,
            Tick::Interrupted => {
                println!("interrupted; resume later with `forge resume`");
                return Ok(());
            }
        }
        workflow = client.run_workflow(id.as_str()).await?;
    }

    print_summary(&workflow);
    if matches!(workflow.status, WorkflowStatus::Terminal | WorkflowStatus::Canceled) {
        anyhow::bail!(super::CliError::Config(format!(
            "workflow {} did not complete successfully",
            workflow.id.as_str()
        )));
    }
    Ok(())
}

fn is_settled(workflow: &Workflow) -> bool {
    !matches!(workflow.status, WorkflowStatus::Running | WorkflowStatus::NotStarted)
}

fn print_summary(workflow: &Workflow) {
    println!("workflow {}: {:?}", workflow.id.as_str(), workflow.status);
    for stage in workflow.stages.values() {
        println!("  {:<12} {:?}", stage.ref_id, stage.status);
    }
}
