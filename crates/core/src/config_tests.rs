// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use serial_test::serial;
use tempfile::tempdir;

#[test]
fn defaults_match_constants() {
    let cfg = EngineConfig::default();
    assert_eq!(cfg.max_jumps, constants::MAX_JUMPS);
    assert_eq!(cfg.max_repair_attempts, constants::MAX_REPAIR_ATTEMPTS);
}

#[test]
fn file_layer_overrides_defaults() {
    let dir = tempdir().expect("tempdir");
    let forge_dir = dir.path().join(".forge");
    std::fs::create_dir_all(&forge_dir).expect("mkdir");
    std::fs::write(forge_dir.join("config.toml"), "max_jumps = 7\n").expect("write");

    let cfg = EngineConfig::load(dir.path());
    assert_eq!(cfg.max_jumps, 7);
    assert_eq!(cfg.max_repair_attempts, constants::MAX_REPAIR_ATTEMPTS);
}

#[test]
#[serial]
fn env_layer_overrides_file_layer() {
    let dir = tempdir().expect("tempdir");
    let forge_dir = dir.path().join(".forge");
    std::fs::create_dir_all(&forge_dir).expect("mkdir");
    std::fs::write(forge_dir.join("config.toml"), "max_jumps = 7\n").expect("write");

    std::env::set_var("FORGE_MAX_JUMPS", "99");
    let cfg = EngineConfig::load(dir.path());
    std::env::remove_var("FORGE_MAX_JUMPS");

    assert_eq!(cfg.max_jumps, 99);
}

#[test]
fn missing_file_falls_back_to_defaults() {
    let dir = tempdir().expect("tempdir");
    let cfg = EngineConfig::load(dir.path());
    assert_eq!(cfg, EngineConfig::default());
}
