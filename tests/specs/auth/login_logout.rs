//! `forge login` / `forge logout` / `forge auth-status`.

use crate::prelude::cli;

#[test]
fn auth_status_with_nothing_stored_shows_not_logged_in() {
    let home = tempfile::tempdir().unwrap();
    cli()
        .home(home.path())
        .args(&["auth-status"])
        .passes()
        .stdout_has("not logged in");
}

#[test]
fn login_then_auth_status_shows_ready() {
    let home = tempfile::tempdir().unwrap();

    cli()
        .home(home.path())
        .args(&["login", "claude", "--headless"])
        .stdin("sk-test-token\n")
        .passes();

    cli()
        .home(home.path())
        .args(&["auth-status"])
        .passes()
        .stdout_has("claude")
        .stdout_has("ready");

    assert!(home.path().join(".forge").join("tokens.enc").exists());
    assert!(home.path().join(".forge").join("auth.key").exists());
}

#[test]
fn logout_removes_a_stored_token() {
    let home = tempfile::tempdir().unwrap();

    cli()
        .home(home.path())
        .args(&["login", "claude", "--headless"])
        .stdin("sk-test-token\n")
        .passes();

    cli().home(home.path()).args(&["logout", "claude"]).passes();

    cli()
        .home(home.path())
        .args(&["auth-status"])
        .passes()
        .stdout_has("not logged in");
}

#[test]
fn login_rejects_an_empty_token() {
    let home = tempfile::tempdir().unwrap();
    cli()
        .home(home.path())
        .args(&["login", "claude", "--headless"])
        .stdin("\n")
        .fails();
}

#[test]
fn logout_with_no_provider_removes_every_token() {
    let home = tempfile::tempdir().unwrap();

    cli()
        .home(home.path())
        .args(&["login", "claude", "--headless"])
        .stdin("sk-test-token\n")
        .passes();
    cli()
        .home(home.path())
        .args(&["login", "google", "--headless"])
        .stdin("ya29-test-token\n")
        .passes();

    cli().home(home.path()).args(&["logout"]).passes().stdout_has("removed all stored tokens");

    cli()
        .home(home.path())
        .args(&["auth-status"])
        .passes()
        .stdout_has("not logged in");
}
