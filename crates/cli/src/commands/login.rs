// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `forge login <provider>` — store an access token read from stdin.
//!
//! There is no browser-based OAuth flow here (out of scope — this crate
//! only consumes whatever credential the caller already has). The token is
//! read as a single line from stdin, which also makes `login` scriptable in
//! headless/CI use: `echo "$API_KEY" | forge login claude --headless`.

use std::io::BufRead;

use anyhow::{Context, Result};
use forge_core::TokenData;
use forge_gateway::TokenStore;

use super::{parse_provider_name, Ctx};

#[derive(clap::Args)]
pub struct LoginArgs {
    /// Provider to store a token for (claude, google, ollama)
    #[arg(value_parser = parse_provider_name)]
    pub provider: String,
}

pub async fn handle(args: LoginArgs, ctx: &Ctx) -> Result<()> {
    if !ctx.headless {
        eprint!("Paste access token for {}: ", args.provider);
    }

    let mut line = String::new();
    std::io::stdin()
        .lock()
        .read_line(&mut line)
        .context("failed to read token from stdin")?;
    let token = line.trim();
    if token.is_empty() {
        anyhow::bail!(super::CliError::Auth("no token provided on stdin".to_string()));
    }

    let home = super::home_dir()?;
    let store = TokenStore::open(&home).map_err(|e| anyhow::anyhow!(e))?;
    // No expiry is known for a pasted credential; treat it as never-expiring
    // until a 401 proves otherwise and the gateway's refresh path kicks in.
    store
        .save(&args.provider, &TokenData::new(token, u64::MAX))
        .map_err(|e| anyhow::anyhow!(e))?;

    println!("stored token for {}", args.provider);
    Ok(())
}
