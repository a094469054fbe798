//! CLI-level argument errors.

use crate::prelude::cli;

#[test]
fn unknown_subcommand_fails() {
    cli().args(&["frobnicate"]).fails().stderr_has("error");
}

#[test]
fn develop_without_a_request_fails() {
    cli().args(&["develop"]).fails();
}

#[test]
fn login_without_a_provider_fails() {
    cli().args(&["login"]).fails();
}

#[test]
fn login_rejects_an_unknown_provider() {
    cli().args(&["login", "not-a-real-provider"]).fails();
}

#[test]
fn run_rejects_a_missing_spec_file() {
    let project = crate::prelude::Project::empty();
    project
        .forge()
        .args(&["run", "nonexistent-workflow.json"])
        .fails()
        .stderr_has("nonexistent-workflow.json");
}
