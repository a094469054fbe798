// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `forge watch [path]` — stream live events from a project's daemon.

use std::path::{Path, PathBuf};

use anyhow::Result;
use tokio::io::AsyncBufReadExt;

use crate::client::DaemonClient;
use crate::color;

#[derive(clap::Args)]
pub struct WatchArgs {
    /// Project directory to watch (defaults to the current directory)
    pub path: Option<PathBuf>,
}

pub async fn handle(args: WatchArgs, project_root: &Path) -> Result<()> {
    let target = args.path.unwrap_or_else(|| project_root.to_path_buf());
    let client = DaemonClient::for_query(&target)?;
    let mut lines = client.subscribe().await?;

    loop {
        tokio::select! {
            line = lines.next_line() => {
                match line? {
                    Some(line) => print_event(&line),
                    None => return Ok(()),
                }
            }
            _ = tokio::signal::ctrl_c() => return Ok(()),
        }
    }
}

fn print_event(line: &str) {
    let Ok(value) = serde_json::from_str::<serde_json::Value>(line) else {
        return;
    };

    let kind = value.get("k").and_then(|v| v.as_str()).unwrap_or("?");
    let code = value.get("c").and_then(|v| v.as_str()).unwrap_or("????");
    let label = value.get("l").and_then(|v| v.as_str());
    let message = value.get("m").and_then(|v| v.as_str());

    let header = color::header(&format!("[{code}]"));
    match (label, message) {
        (Some(l), Some(m)) => println!("{header} {}: {}", l, m),
        (Some(l), None) => println!("{header} {}", l),
        (None, Some(m)) => println!("{header} {}", m),
        (None, None) => println!("{header} {kind}"),
    }
}
