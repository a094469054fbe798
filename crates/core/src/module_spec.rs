// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! ModuleSpec: the unit of ownership in a parallel pipeline, plus the
//! upfront validation that makes concurrent module execution safe.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModuleSpec {
    pub id: String,
    pub name: String,
    pub owned_files: Vec<String>,
    pub test_files: Vec<String>,
    pub deps: Vec<String>,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ModuleGraphError {
    #[error("file {file:?} is owned by more than one module ({modules:?})")]
    DuplicateOwnership { file: String, modules: Vec<String> },
    #[error("module dependency graph has a cycle involving {0:?}")]
    Cycle(Vec<String>),
    #[error("module {0:?} depends on unknown module {1:?}")]
    UnknownDependency(String, String),
}

/// Validate a planner-produced module graph before workflow construction:
/// owned-file disjointness (testable property 5) and acyclicity (testable
/// property 6), via iterative DFS with three colors per the design notes —
/// cycles are a planner bug, so this fails loudly rather than silently
/// breaking ties.
pub fn validate_module_graph(modules: &[ModuleSpec]) -> Result<(), ModuleGraphError> {
    check_disjoint_ownership(modules)?;
    check_acyclic(modules)?;
    Ok(())
}

fn check_disjoint_ownership(modules: &[ModuleSpec]) -> Result<(), ModuleGraphError> {
    let mut owner: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
    for module in modules {
        for file in &module.owned_files {
            owner.entry(file.as_str()).or_default().push(&module.id);
        }
    }
    for (file, owners) in owner {
        if owners.len() > 1 {
            return Err(ModuleGraphError::DuplicateOwnership {
                file: file.to_string(),
                modules: owners.into_iter().map(str::to_string).collect(),
            });
        }
    }
    Ok(())
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Color {
    White,
    Gray,
    Black,
}

fn check_acyclic(modules: &[ModuleSpec]) -> Result<(), ModuleGraphError> {
    let by_id: BTreeMap<&str, &ModuleSpec> = modules.iter().map(|m| (m.id.as_str(), m)).collect();
    for module in modules {
        for dep in &module.deps {
            if !by_id.contains_key(dep.as_str()) {
                return Err(ModuleGraphError::UnknownDependency(
                    module.id.clone(),
                    dep.clone(),
                ));
            }
        }
    }

    let mut colors: BTreeMap<&str, Color> = modules.iter().map(|m| (m.id.as_str(), Color::White)).collect();

    for start in modules.iter().map(|m| m.id.as_str()) {
        if colors[start] != Color::White {
            continue;
        }
        // Iterative DFS: stack of (node, next-dep-index-to-visit).
        let mut stack: Vec<(&str, usize)> = vec![(start, 0)];
        colors.insert(start, Color::Gray);

        while let Some((node, idx)) = stack.pop() {
            let deps = &by_id[node].deps;
            if idx < deps.len() {
                let next = deps[idx].as_str();
                stack.push((node, idx + 1));
                match colors.get(next).copied().unwrap_or(Color::White) {
                    Color::White => {
                        colors.insert(next, Color::Gray);
                        stack.push((next, 0));
                    }
                    Color::Gray => {
                        let cycle: Vec<String> =
                            stack.iter().map(|(n, _)| (*n).to_string()).collect();
                        return Err(ModuleGraphError::Cycle(cycle));
                    }
                    Color::Black => {}
                }
            } else {
                colors.insert(node, Color::Black);
            }
        }
    }
    Ok(())
}

/// The union of `owned_files` across all modules, for downstream tooling
/// that needs the flattened set.
pub fn all_owned_files(modules: &[ModuleSpec]) -> BTreeSet<String> {
    modules
        .iter()
        .flat_map(|m| m.owned_files.iter().cloned())
        .collect()
}

#[cfg(test)]
#[path = "module_spec_tests.rs"]
mod tests;
