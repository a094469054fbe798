// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use tempfile::tempdir;

use super::*;

fn isolated_config() -> (tempfile::TempDir, tempfile::TempDir, Config) {
    let project = tempdir().unwrap();
    let home = tempdir().unwrap();
    std::env::set_var("FORGE_HOME", home.path());
    let config = Config::load(project.path());
    (project, home, config)
}

#[tokio::test]
async fn startup_binds_the_socket_and_creates_the_forge_dir() {
    let (_project, _home, config) = isolated_config();
    let result = startup(&config).await.unwrap();
    assert!(config.socket_path.exists());
    assert!(config.forge_dir.is_dir());
    result.daemon.shutdown().unwrap();
    assert!(!config.socket_path.exists());
}

#[tokio::test]
async fn a_second_startup_against_the_same_project_fails_the_lock() {
    let (_project, _home, config) = isolated_config();
    let first = startup(&config).await.unwrap();

    let err = startup(&config).await.unwrap_err();
    assert!(matches!(err, DaemonError::LockFailed));

    first.daemon.shutdown().unwrap();
}

#[tokio::test]
async fn startup_recovers_a_workflow_left_running_by_a_crash() {
    let (_project, _home, config) = isolated_config();
    {
        let store = Store::open(&config.db_path).unwrap();
        let mut wf = forge_core::Workflow::new(forge_core::WorkflowId::new("wf-crash"));
        wf.status = forge_core::WorkflowStatus::Running;
        let mut stage = forge_core::Stage::new("implement", "implement", "Implement");
        stage.status = forge_core::StageStatus::Running;
        wf.add_stage(stage);
        store.save_workflow(&wf, 1_000).unwrap();
    }

    let result = startup(&config).await.unwrap();
    let wf = result
        .daemon
        .services
        .store
        .require_workflow(&forge_core::WorkflowId::new("wf-crash"))
        .unwrap();
    assert_eq!(wf.stage("implement").unwrap().status, forge_core::StageStatus::NotStarted);

    result.daemon.shutdown().unwrap();
}
