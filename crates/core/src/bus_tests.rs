// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::event::{codes, EventKind};

fn sample(code: &str, ts: u64) -> Event {
    Event::new(EventKind::Message, code, ts)
}

#[tokio::test]
async fn subscriber_receives_published_event() {
    let bus = EventBus::new();
    let mut sub = bus.subscribe();
    bus.publish(sample(codes::WORKFLOW_STAGE_START, 1));
    let event = sub.rx.recv().await.expect("event");
    assert_eq!(event.code, codes::WORKFLOW_STAGE_START);
}

#[tokio::test]
async fn late_subscriber_sees_replay_buffer() {
    let bus = EventBus::new();
    bus.publish(sample(codes::WORKFLOW_STAGE_START, 1));
    bus.publish(sample(codes::WORKFLOW_STAGE_DONE, 2));

    let mut sub = bus.subscribe();
    let first = sub.rx.recv().await.expect("first replayed event");
    let second = sub.rx.recv().await.expect("second replayed event");
    assert_eq!(first.code, codes::WORKFLOW_STAGE_START);
    assert_eq!(second.code, codes::WORKFLOW_STAGE_DONE);
}

#[test]
fn replay_buffer_is_bounded() {
    let bus = EventBus::new();
    for i in 0..(REPLAY_BUFFER_SIZE as u64 + 10) {
        bus.publish(sample(codes::QUALITY_SCORE, i));
    }
    assert_eq!(bus.replay_len(), REPLAY_BUFFER_SIZE);
}

#[test]
fn unsubscribe_is_idempotent() {
    let bus = EventBus::new();
    let sub = bus.subscribe();
    assert_eq!(bus.subscriber_count(), 1);
    bus.unsubscribe(sub.id);
    bus.unsubscribe(sub.id);
    assert_eq!(bus.subscriber_count(), 0);
}

#[test]
fn publish_never_blocks_on_full_subscriber_queue() {
    let bus = EventBus::new();
    let sub = bus.subscribe();
    // Flood well past the per-subscriber queue capacity; publish must return.
    for i in 0..(SUBSCRIBER_QUEUE_CAPACITY as u64 + 50) {
        bus.publish(sample(codes::AGENT_THINKING, i));
    }
    assert_eq!(bus.subscriber_count(), 1);
    drop(sub);
}
