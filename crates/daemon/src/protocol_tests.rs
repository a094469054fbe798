// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[tokio::test]
async fn write_then_read_message_roundtrips_over_a_duplex_pipe() {
    let (mut client, mut server) = tokio::io::duplex(4096);

    let req = Request::RunWorkflow { workflow_id: "wf-1".to_string() };
    let bytes = encode(&req).unwrap();
    write_message(&mut client, &bytes).await.unwrap();

    let read_back = read_message(&mut server).await.unwrap();
    let decoded: Request = decode(&read_back).unwrap();
    assert_eq!(req, decoded);
}

#[tokio::test]
async fn read_request_times_out_when_nothing_arrives() {
    let (_client, mut server) = tokio::io::duplex(4096);
    let result = read_request(&mut server, std::time::Duration::from_millis(20)).await;
    assert!(matches!(result, Err(ProtocolError::Timeout)));
}

#[test]
fn encode_rejects_a_message_over_the_size_cap() {
    #[derive(serde::Serialize)]
    struct Oversized {
        data: Vec<u8>,
    }
    let oversized = Oversized { data: vec![0u8; MAX_MESSAGE_SIZE + 1] };
    let err = encode(&oversized).unwrap_err();
    assert!(matches!(err, ProtocolError::MessageTooLarge { .. }));
}
