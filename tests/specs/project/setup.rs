//! `forge init` behavior.

use crate::prelude::Project;

#[test]
fn init_creates_the_forge_directory() {
    let project = Project::empty();
    project.forge().args(&["init"]).passes().stdout_has("initialized");
    assert!(project.path().join(".forge").is_dir());
}

#[test]
fn init_is_idempotent() {
    let project = Project::empty();
    project.forge().args(&["init"]).passes();
    project.forge().args(&["init"]).passes().stdout_has("already initialized");
}

#[test]
fn init_from_a_subdirectory_still_targets_the_cwd() {
    let project = Project::empty();
    project.file("src/placeholder.txt", "");
    project
        .forge()
        .args(&["-C", &project.path().join("src").to_string_lossy(), "init"])
        .passes();
    assert!(project.path().join("src").join(".forge").is_dir());
}
