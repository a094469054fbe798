// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use clap::error::ErrorKind;

use super::cli_command;

// -- Version flag -----------------------------------------------------------

#[test]
fn version_short_lowercase_v() {
    let err = cli_command().try_get_matches_from(["forge", "-v"]).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::DisplayVersion);
}

#[test]
fn version_short_uppercase_v() {
    let err = cli_command().try_get_matches_from(["forge", "-V"]).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::DisplayVersion);
}

#[test]
fn version_long() {
    let err = cli_command().try_get_matches_from(["forge", "--version"]).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::DisplayVersion);
}

#[test]
fn version_uppercase_v_hidden_in_help() {
    let mut buf = Vec::new();
    cli_command().write_help(&mut buf).unwrap();
    let help = String::from_utf8(buf).unwrap();
    assert!(help.contains("-v, --version"), "help should show -v, --version");
    assert!(!help.contains("-V,"), "help should not show -V as a visible flag");
}

// -- Subcommand parsing -------------------------------------------------------

#[test]
fn develop_requires_a_request() {
    let err = cli_command().try_get_matches_from(["forge", "develop"]).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::MissingRequiredArgument);
}

#[test]
fn develop_accepts_a_request() {
    let matches = cli_command()
        .try_get_matches_from(["forge", "develop", "add a login page"])
        .unwrap();
    let (name, sub) = matches.subcommand().unwrap();
    assert_eq!(name, "develop");
    assert_eq!(sub.get_one::<String>("request").map(String::as_str), Some("add a login page"));
}

#[test]
fn run_accepts_a_spec_path() {
    let matches = cli_command()
        .try_get_matches_from(["forge", "run", "workflow.json"])
        .unwrap();
    let (name, sub) = matches.subcommand().unwrap();
    assert_eq!(name, "run");
    assert!(sub.get_one::<std::path::PathBuf>("spec").is_some());
}

#[test]
fn login_rejects_unknown_provider() {
    let err = cli_command()
        .try_get_matches_from(["forge", "login", "not-a-provider"])
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ValueValidation);
}

#[test]
fn login_accepts_known_provider() {
    let matches = cli_command().try_get_matches_from(["forge", "login", "claude"]).unwrap();
    let (name, _) = matches.subcommand().unwrap();
    assert_eq!(name, "login");
}

#[test]
fn global_provider_flag_is_accepted_before_subcommand() {
    let matches = cli_command()
        .try_get_matches_from(["forge", "--provider", "google", "auth-status"])
        .unwrap();
    assert_eq!(
        matches.get_one::<crate::commands::Provider>("provider"),
        Some(&crate::commands::Provider::Google)
    );
}

#[test]
fn headless_flag_is_global() {
    let matches = cli_command()
        .try_get_matches_from(["forge", "--headless", "watch"])
        .unwrap();
    assert!(matches.get_flag("headless"));
}

// -- Help ---------------------------------------------------------------------

#[test]
fn top_level_help_lists_pipeline_section() {
    let err = cli_command().try_get_matches_from(["forge", "--help"]).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::DisplayHelp);
}
