//! Help output.

use crate::prelude::cli;

#[test]
fn no_args_prints_help() {
    cli().passes().stdout_has("Setup:").stdout_has("Pipeline:");
}

#[test]
fn help_flag_lists_every_command() {
    cli()
        .args(&["--help"])
        .passes()
        .stdout_has("init")
        .stdout_has("login")
        .stdout_has("develop")
        .stdout_has("watch");
}

#[test]
fn version_flag_prints_a_version() {
    let out = cli().args(&["--version"]).passes();
    assert!(!out.stdout().trim().is_empty());
}

#[test]
fn subcommand_help_does_not_crash() {
    cli().args(&["develop", "--help"]).passes().stdout_has("Usage:");
}
