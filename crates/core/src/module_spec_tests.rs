// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

fn module(id: &str, owned: &[&str], deps: &[&str]) -> ModuleSpec {
    ModuleSpec {
        id: id.to_string(),
        name: id.to_string(),
        owned_files: owned.iter().map(|s| s.to_string()).collect(),
        test_files: Vec::new(),
        deps: deps.iter().map(|s| s.to_string()).collect(),
    }
}

#[test]
fn disjoint_ownership_passes() {
    let modules = vec![module("a", &["a.rs"], &[]), module("b", &["b.rs"], &["a"])];
    assert!(validate_module_graph(&modules).is_ok());
}

#[test]
fn duplicate_ownership_is_rejected() {
    let modules = vec![module("a", &["shared.rs"], &[]), module("b", &["shared.rs"], &[])];
    let err = validate_module_graph(&modules).unwrap_err();
    assert!(matches!(err, ModuleGraphError::DuplicateOwnership { .. }));
}

#[test]
fn acyclic_graph_passes() {
    let modules = vec![
        module("a", &["a.rs"], &[]),
        module("b", &["b.rs"], &["a"]),
        module("c", &["c.rs"], &["a", "b"]),
    ];
    assert!(validate_module_graph(&modules).is_ok());
}

#[test]
fn direct_cycle_is_rejected() {
    let modules = vec![module("a", &["a.rs"], &["b"]), module("b", &["b.rs"], &["a"])];
    let err = validate_module_graph(&modules).unwrap_err();
    assert!(matches!(err, ModuleGraphError::Cycle(_)));
}

#[test]
fn self_cycle_is_rejected() {
    let modules = vec![module("a", &["a.rs"], &["a"])];
    let err = validate_module_graph(&modules).unwrap_err();
    assert!(matches!(err, ModuleGraphError::Cycle(_)));
}

#[test]
fn unknown_dependency_is_rejected() {
    let modules = vec![module("a", &["a.rs"], &["ghost"])];
    let err = validate_module_graph(&modules).unwrap_err();
    assert!(matches!(err, ModuleGraphError::UnknownDependency(_, _)));
}

#[test]
fn all_owned_files_unions_without_duplicates() {
    let modules = vec![module("a", &["a.rs"], &[]), module("b", &["b.rs"], &[])];
    let files = all_owned_files(&modules);
    assert_eq!(files.len(), 2);
    assert!(files.contains("a.rs"));
    assert!(files.contains("b.rs"));
}
