// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::sync::Arc;
use std::time::Instant;

use forge_core::{EngineConfig, Event, EventKind, EventBus, SystemClock};
use forge_gateway::Gateway;
use forge_storage::Store;
use tempfile::tempdir;
use tokio::net::{UnixListener, UnixStream};
use tokio::sync::Notify;

use super::*;

struct Harness {
    _dir: tempfile::TempDir,
    socket_path: std::path::PathBuf,
    ctx: Arc<ListenCtx>,
}

fn build_ctx(dir: &std::path::Path) -> ListenCtx {
    let store = Store::open_in_memory().unwrap();
    let bus = EventBus::new();
    let gateway = Gateway::new(dir, bus.clone(), SystemClock).unwrap();
    let services = EngineServices::new(
        Arc::new(gateway),
        bus,
        Arc::new(store),
        EngineConfig::load(dir),
        dir.to_path_buf(),
        SystemClock,
    );
    ListenCtx {
        services,
        start_time: Instant::now(),
        shutdown: Arc::new(Notify::new()),
    }
}

async fn harness() -> Harness {
    let dir = tempdir().unwrap();
    let socket_path = dir.path().join("events.sock");
    let ctx = Arc::new(build_ctx(dir.path()));
    let listener = UnixListener::bind(&socket_path).unwrap();
    let run_ctx = Arc::clone(&ctx);
    tokio::spawn(async move {
        Listener::new(listener, run_ctx).run().await;
    });
    Harness { _dir: dir, socket_path, ctx }
}

async fn roundtrip(socket_path: &std::path::Path, request: &Request) -> Response {
    let mut stream = UnixStream::connect(socket_path).await.unwrap();
    let bytes = protocol::encode(request).unwrap();
    protocol::write_message(&mut stream, &bytes).await.unwrap();
    let reply = protocol::read_message(&mut stream).await.unwrap();
    protocol::decode(&reply).unwrap()
}

#[tokio::test]
async fn ping_returns_pong() {
    let h = harness().await;
    let response = roundtrip(&h.socket_path, &Request::Ping).await;
    assert_eq!(response, Response::Pong);
}

#[tokio::test]
async fn hello_echoes_the_protocol_version() {
    let h = harness().await;
    let response = roundtrip(&h.socket_path, &Request::Hello { version: "anything".into() }).await;
    assert_eq!(response, Response::Hello { version: PROTOCOL_VERSION.to_string() });
}

#[tokio::test]
async fn get_workflow_reports_unknown_ids_as_an_error_response() {
    let h = harness().await;
    let response = roundtrip(&h.socket_path, &Request::GetWorkflow { workflow_id: "missing".into() }).await;
    assert!(matches!(response, Response::Error { .. }));
}

#[tokio::test]
async fn list_workflows_reflects_the_store() {
    let h = harness().await;
    let wf = forge_core::Workflow::new(forge_core::WorkflowId::new("wf-1"));
    h.ctx.services.store.save_workflow(&wf, h.ctx.services.now_ms()).unwrap();

    let response = roundtrip(&h.socket_path, &Request::ListWorkflows).await;
    match response {
        Response::WorkflowList { workflow_ids } => assert_eq!(workflow_ids, vec!["wf-1".to_string()]),
        other => panic!("unexpected response: {other:?}"),
    }
}

#[tokio::test]
async fn submit_workflow_persists_it_for_later_retrieval() {
    let h = harness().await;
    let wf = forge_core::Workflow::new(forge_core::WorkflowId::new("wf-submitted"));
    let payload = serde_json::to_value(&wf).unwrap();

    let response = roundtrip(&h.socket_path, &Request::SubmitWorkflow { workflow: payload }).await;
    assert_eq!(response, Response::Ok);

    let loaded = h
        .ctx
        .services
        .store
        .load_workflow(&forge_core::WorkflowId::new("wf-submitted"))
        .unwrap();
    assert!(loaded.is_some());
}

#[tokio::test]
async fn shutdown_notifies_the_shutdown_handle() {
    let h = harness().await;
    let response = roundtrip(&h.socket_path, &Request::Shutdown).await;
    assert_eq!(response, Response::Ok);
    h.ctx.shutdown.notified().await;
}

#[tokio::test]
async fn subscribe_promotes_the_connection_to_a_broadcast_feed() {
    let h = harness().await;
    let mut stream = UnixStream::connect(&h.socket_path).await.unwrap();
    let bytes = protocol::encode(&Request::Subscribe).unwrap();
    protocol::write_message(&mut stream, &bytes).await.unwrap();
    let ack = protocol::read_message(&mut stream).await.unwrap();
    assert_eq!(protocol::decode::<Response>(&ack).unwrap(), Response::Ok);

    h.ctx.services.bus.publish(Event::new(EventKind::Message, "TEST", 1).with_message("hi"));

    use tokio::io::AsyncReadExt;
    let mut buf = [0u8; 256];
    let n = tokio::time::timeout(DEFAULT_TIMEOUT, stream.read(&mut buf)).await.unwrap().unwrap();
    let line = String::from_utf8_lossy(&buf[..n]);
    assert!(line.contains("\"c\":\"TEST\""));
    assert!(line.contains("\"m\":\"hi\""));
}
