// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `forge auth-status` — which providers have a stored token, and whether
//! it looks expired.

use anyhow::Result;
use forge_gateway::provider::PROVIDERS;
use forge_gateway::TokenStore;

use crate::table::{Column, Table};

use super::Ctx;

pub async fn handle(_ctx: &Ctx) -> Result<()> {
    let home = super::home_dir()?;
    let store = TokenStore::open(&home).map_err(|e| anyhow::anyhow!(e))?;
    let stored = store.list_providers().map_err(|e| anyhow::anyhow!(e))?;

    let now_secs = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs();

    let mut table = Table::new(vec![
        Column::left("PROVIDER"),
        Column::status("STATUS"),
    ]);

    for provider in PROVIDERS {
        let status = match store.load(provider).map_err(|e| anyhow::anyhow!(e))? {
            Some(token) if token.time_to_expiry_secs(now_secs) > 0 => "ready".to_string(),
            Some(_) => "expired".to_string(),
            None => "not logged in".to_string(),
        };
        table.row(vec![provider.to_string(), status]);
    }

    for provider in stored.iter().filter(|p| !PROVIDERS.contains(&p.as_str())) {
        table.row(vec![provider.clone(), "ready".to_string()]);
    }

    table.render(&mut std::io::stdout());
    Ok(())
}
