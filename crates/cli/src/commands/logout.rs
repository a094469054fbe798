// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `forge logout [provider]` — remove a stored token, or every token.

use anyhow::Result;
use forge_gateway::TokenStore;

use super::{parse_provider_name, Ctx};

#[derive(clap::Args)]
pub struct LogoutArgs {
    /// Provider to remove (omit to remove every stored token)
    #[arg(value_parser = parse_provider_name)]
    pub provider: Option<String>,
}

pub async fn handle(args: LogoutArgs, _ctx: &Ctx) -> Result<()> {
    let home = super::home_dir()?;
    let store = TokenStore::open(&home).map_err(|e| anyhow::anyhow!(e))?;

    match args.provider {
        Some(provider) => {
            store.delete(&provider).map_err(|e| anyhow::anyhow!(e))?;
            println!("removed token for {provider}");
        }
        None => {
            for provider in store.list_providers().map_err(|e| anyhow::anyhow!(e))? {
                store.delete(&provider).map_err(|e| anyhow::anyhow!(e))?;
            }
            println!("removed all stored tokens");
        }
    }

    Ok(())
}
