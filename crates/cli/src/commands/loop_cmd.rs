// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `forge loop` — keep driving this project's workflows until all are
//! settled, or until interrupted.

use std::path::Path;
use std::time::Duration;

use anyhow::Result;
use forge_core::{Workflow, WorkflowStatus};

use crate::client::DaemonClient;
use crate::poll::{Poller, Tick};

#[derive(clap::Args)]
pub struct LoopArgs {
    /// Seconds between drive passes
    #[arg(long, default_value_t = 2)]
    pub interval_secs: u64,
}

pub async fn handle(args: LoopArgs, project_root: &Path) -> Result<()> {
    let client = DaemonClient::for_action(project_root, &crate::env::default_provider()).await?;
    let mut poller = Poller::new(Duration::from_secs(args.interval_secs), None);

    loop {
        let ids = client.list_workflows().await?;
        let mut unsettled = 0;

        for id in ids {
            let workflow = client.run_workflow(&id).await?;
            if !is_settled(&workflow) {
                unsettled += 1;
            }
            println!("workflow {}: {:?}", workflow.id.as_str(), workflow.status);
        }

        if unsettled == 0 {
            println!("all workflows settled");
            return Ok(());
        }

        match poller.tick().await {
            Tick::Ready => {}
            Tick::Timeout => return Ok(()),
            Tick::Interrupted => {
                println!("interrupted");
                return Ok(());
            }
        }
    }
}

fn is_settled(workflow: &Workflow) -> bool {
    !matches!(workflow.status, WorkflowStatus::Running | WorkflowStatus::NotStarted)
}
