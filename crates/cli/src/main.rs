// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! forge - autonomous code-generation pipeline CLI

mod client;
mod client_lifecycle;
mod color;
mod commands;
mod daemon_process;
mod env;
mod help;
mod poll;
mod table;

use anyhow::Result;
use clap::{CommandFactory, FromArgMatches, Parser, Subcommand};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(
    name = "forge",
    version,
    disable_version_flag = true,
    about = "An autonomous code-generation pipeline"
)]
struct Cli {
    /// Change to <dir> before doing anything
    #[arg(short = 'C', global = true, value_name = "DIR")]
    directory: Option<PathBuf>,

    /// LLM backend to use
    #[arg(long, global = true, value_enum)]
    provider: Option<commands::Provider>,

    /// Suppress interactive prompts and live terminal rendering
    #[arg(long, global = true)]
    headless: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Prepare `.forge/` in the current project
    Init,
    /// Store an access token for a provider
    Login(commands::login::LoginArgs),
    /// Remove a stored provider token (or every token)
    Logout(commands::logout::LogoutArgs),
    /// Show which providers have a stored token
    AuthStatus,
    /// Produce a plan for a request without implementing it
    Plan(commands::plan::PlanArgs),
    /// Run the full plan-through-review pipeline for a request
    Develop(commands::develop::DevelopArgs),
    /// Submit and run a pre-built workflow spec file
    Run(commands::run::RunArgs),
    /// Keep driving this project's workflows until all are settled
    Loop(commands::loop_cmd::LoopArgs),
    /// Re-drive the most recent unsettled workflow (after a crash or restart)
    Resume(commands::resume::ResumeArgs),
    /// Stream live events from the daemon
    Watch(commands::watch::WatchArgs),
}

#[tokio::main]
async fn main() {
    let code = tokio::select! {
        result = run() => {
            match result {
                Ok(()) => 0,
                Err(e) => {
                    let code = e.downcast_ref::<commands::CliError>().map_or(1, |c| c.exit_code());
                    let msg = format_error(&e);
                    if !msg.is_empty() {
                        eprintln!("Error: {}", msg);
                    }
                    code
                }
            }
        }
        _ = tokio::signal::ctrl_c() => 130,
    };
    std::process::exit(code);
}

/// Format an anyhow error, deduplicating the chain.
///
/// If the top-level Display already contains the source error text, we skip
/// the "Caused by" chain to avoid noisy duplicate output (common when
/// thiserror variants use `#[error("... {0}")]` with `#[from]`).
/// Otherwise we render the full chain so context isn't lost.
fn format_error(err: &anyhow::Error) -> String {
    let top = err.to_string();

    let chain_redundant = err.chain().skip(1).all(|cause| top.contains(&cause.to_string()));

    if chain_redundant {
        return top;
    }

    let mut buf = top;
    for (i, cause) in err.chain().skip(1).enumerate() {
        buf.push_str(&format!("\n\nCaused by:\n    {}: {}", i, cause));
    }
    buf
}

fn cli_command() -> clap::Command {
    Cli::command()
        .help_template(help::template())
        .before_help(help::commands())
        .after_help(help::after_help())
        .styles(help::styles())
        .arg(
            clap::Arg::new("version")
                .short('v')
                .short_alias('V')
                .long("version")
                .action(clap::ArgAction::Version)
                .help("Print version"),
        )
}

async fn run() -> Result<()> {
    let matches = match cli_command().try_get_matches() {
        Ok(m) => m,
        Err(e) => {
            if e.kind() == clap::error::ErrorKind::DisplayHelp {
                let args: Vec<String> = std::env::args().collect();
                let args = strip_global_flags(&args);
                print_formatted_help(&args);
                return Ok(());
            }
            e.exit();
        }
    };
    let cli = Cli::from_arg_matches(&matches)?;

    if let Some(ref dir) = cli.directory {
        let canonical = std::fs::canonicalize(dir)
            .map_err(|e| anyhow::anyhow!("cannot change to directory '{}': {}", dir.display(), e))?;
        std::env::set_current_dir(&canonical)
            .map_err(|e| anyhow::anyhow!("cannot change to directory '{}': {}", canonical.display(), e))?;
    }

    let command = match cli.command {
        Some(cmd) => cmd,
        None => {
            help::print_help(cli_command());
            return Ok(());
        }
    };

    let provider = cli.provider.unwrap_or_default();
    let ctx = commands::Ctx {
        provider,
        headless: cli.headless,
    };
    let project_root = find_project_root();

    match command {
        Commands::Init => commands::init::handle(&project_root).await,
        Commands::Login(args) => commands::login::handle(args, &ctx).await,
        Commands::Logout(args) => commands::logout::handle(args, &ctx).await,
        Commands::AuthStatus => commands::auth_status::handle(&ctx).await,
        Commands::Plan(args) => commands::plan::handle(args, &ctx, &project_root).await,
        Commands::Develop(args) => commands::develop::handle(args, &ctx, &project_root).await,
        Commands::Run(args) => commands::run::handle(args, &ctx, &project_root).await,
        Commands::Loop(args) => commands::loop_cmd::handle(args, &project_root).await,
        Commands::Resume(args) => commands::resume::handle(args, &project_root).await,
        Commands::Watch(args) => commands::watch::handle(args, &project_root).await,
    }
}

/// Find the project root by walking up from current directory, looking for
/// a `.forge` directory. Falls back to the current directory if none exists
/// (e.g. for `init`, which creates one).
fn find_project_root() -> PathBuf {
    let start = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    find_project_root_from(start)
}

fn find_project_root_from(start: PathBuf) -> PathBuf {
    let mut current = start.clone();
    loop {
        if current.join(".forge").is_dir() {
            return current;
        }
        if !current.pop() {
            return start;
        }
    }
}

/// Print help with post-hoc colorization, resolving the correct subcommand from args.
fn print_formatted_help(args: &[String]) {
    let cmd = cli_command();

    let non_flags: Vec<&String> = args.iter().skip(1).filter(|arg| !arg.starts_with('-')).collect();

    let subcommand_names: Vec<&str> = if non_flags.first().map(|s| s.as_str()) == Some("help") {
        non_flags.iter().skip(1).map(|s| s.as_str()).collect()
    } else {
        non_flags.iter().map(|s| s.as_str()).collect()
    };

    let target_cmd = find_subcommand(cmd, &subcommand_names);
    help::print_help(target_cmd);
}

/// Strip `-C <value>` from args to avoid mistaking its value for a subcommand name.
fn strip_global_flags(args: &[String]) -> Vec<String> {
    let mut result = Vec::with_capacity(args.len());
    let mut skip_next = false;
    for arg in args {
        if skip_next {
            skip_next = false;
            continue;
        }
        if arg == "-C" {
            skip_next = true;
            continue;
        }
        if arg.starts_with("-C") && arg.len() > 2 {
            continue;
        }
        result.push(arg.clone());
    }
    result
}

/// Recursively find a nested subcommand by name path.
pub(crate) fn find_subcommand(mut cmd: clap::Command, names: &[&str]) -> clap::Command {
    for name in names {
        let mut found_sub = None;
        for sub in cmd.get_subcommands() {
            if sub.get_name() == *name || sub.get_all_aliases().any(|a| a == *name) {
                found_sub = Some(sub.get_name().to_string());
                break;
            }
        }
        if let Some(sub_name) = found_sub {
            if let Some(sub) = cmd.find_subcommand_mut(&sub_name) {
                cmd = sub.clone();
            } else {
                break;
            }
        } else {
            break;
        }
    }
    cmd
}

#[cfg(test)]
#[path = "main_tests.rs"]
mod tests;
