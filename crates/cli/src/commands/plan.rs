// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `forge plan <request>` — run only the planner stage and print its plan,
//! without writing tests or touching the project tree.

use std::path::Path;

use anyhow::Result;
use forge_core::{IdGen, UuidIdGen, WorkflowId};
use forge_engine::workflow::pipeline::plan_only_workflow;

use crate::client::DaemonClient;

use super::Ctx;

#[derive(clap::Args)]
pub struct PlanArgs {
    /// What to plan for
    pub request: String,
}

pub async fn handle(args: PlanArgs, ctx: &Ctx, project_root: &Path) -> Result<()> {
    let id = WorkflowId::new(UuidIdGen.next());
    let workflow = plan_only_workflow(id.clone(), &args.request, project_root);

    let client = DaemonClient::for_action(project_root, ctx.provider.as_str()).await?;
    client.submit_workflow(&workflow).await?;
    let workflow = client.run_workflow(id.as_str()).await?;

    let plan = workflow
        .stage("plan")
        .ok_or_else(|| anyhow::anyhow!("daemon returned a workflow with no plan stage"))?;

    if let Some(raw_plan) = plan.outputs.get("raw_plan").and_then(|v| v.as_str()) {
        println!("{raw_plan}");
    }

    if let Some(criteria) = plan.outputs.get("acceptance_criteria").and_then(|v| v.as_array()) {
        println!("\nAcceptance criteria:");
        for item in criteria {
            if let Some(s) = item.as_str() {
                println!("  - {s}");
            }
        }
    }

    if let Some(modules) = plan.outputs.get("modules").and_then(|v| v.as_array()) {
        if !modules.is_empty() {
            println!("\nModules: {}", modules.len());
        }
    }

    Ok(())
}
