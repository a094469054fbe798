// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use serde_json::json;

struct BumpVersion;

impl Migration for BumpVersion {
    fn source_version(&self) -> u32 {
        1
    }
    fn target_version(&self) -> u32 {
        2
    }
    fn migrate(&self, snapshot: &mut Value) -> Result<(), MigrationError> {
        if let Some(obj) = snapshot.as_object_mut() {
            obj.insert("added_in_v2".to_string(), json!(true));
        }
        Ok(())
    }
}

#[test]
fn same_version_is_a_no_op() {
    let registry = MigrationRegistry::new();
    let snapshot = json!({"v": 1, "x": 1});
    let migrated = registry.migrate_to(snapshot.clone(), 1).expect("migrate");
    assert_eq!(migrated, snapshot);
}

#[test]
fn newer_than_target_is_rejected() {
    let registry = MigrationRegistry::new();
    let snapshot = json!({"v": 3});
    let err = registry.migrate_to(snapshot, 1).unwrap_err();
    assert!(matches!(err, MigrationError::TooNew(3, 1)));
}

#[test]
fn missing_migration_path_errors() {
    let registry = MigrationRegistry::new();
    let snapshot = json!({"v": 1});
    let err = registry.migrate_to(snapshot, 2).unwrap_err();
    assert!(matches!(err, MigrationError::NoPath(1, 2)));
}
