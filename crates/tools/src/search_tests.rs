// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use tempfile::tempdir;

#[tokio::test]
async fn glob_finds_matching_files_sorted() {
    let dir = tempdir().unwrap();
    tokio::fs::write(dir.path().join("b.rs"), "").await.unwrap();
    tokio::fs::write(dir.path().join("a.rs"), "").await.unwrap();
    tokio::fs::write(dir.path().join("c.txt"), "").await.unwrap();

    let found = glob("*.rs", Some(dir.path())).unwrap();
    assert_eq!(found.len(), 2);
    assert!(found[0].ends_with("a.rs"));
    assert!(found[1].ends_with("b.rs"));
}

#[tokio::test]
async fn glob_with_no_matches_is_empty_not_an_error() {
    let dir = tempdir().unwrap();
    let found = glob("*.nonexistent", Some(dir.path())).unwrap();
    assert!(found.is_empty());
}

#[tokio::test]
async fn grep_finds_substring_matches_with_line_numbers() {
    let dir = tempdir().unwrap();
    tokio::fs::write(dir.path().join("a.rs"), "fn main() {}\nfn helper() {}\n")
        .await
        .unwrap();

    let matches = grep("fn helper", Some(dir.path()), None).await.unwrap();
    assert_eq!(matches.len(), 1);
    assert_eq!(matches[0].line_number, 2);
}

#[tokio::test]
async fn grep_respects_include_filter() {
    let dir = tempdir().unwrap();
    tokio::fs::write(dir.path().join("a.rs"), "needle").await.unwrap();
    tokio::fs::write(dir.path().join("b.txt"), "needle").await.unwrap();

    let matches = grep("needle", Some(dir.path()), Some("*.rs")).await.unwrap();
    assert_eq!(matches.len(), 1);
    assert!(matches[0].path.ends_with("a.rs"));
}

#[tokio::test]
async fn grep_render_includes_path_line_and_text() {
    let m = GrepMatch {
        path: "src/lib.rs".to_string(),
        line_number: 3,
        text: "    let x = 1;".to_string(),
    };
    assert_eq!(m.render(), "src/lib.rs:3:    let x = 1;");
}
