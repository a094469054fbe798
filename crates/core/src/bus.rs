// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-process event bus: bounded fan-out with a replay buffer for late
//! subscribers.
//!
//! Publish never blocks and never fails: a full subscriber queue silently
//! drops the oldest send attempt (`try_send`), exactly like the WAL-backed
//! bus's non-blocking wake signal, generalized here to carry the event
//! itself rather than just a wake tick.

use std::collections::VecDeque;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::mpsc;

use crate::constants::{REPLAY_BUFFER_SIZE, SUBSCRIBER_QUEUE_CAPACITY};
use crate::event::Event;

struct Subscriber {
    id: u64,
    tx: mpsc::Sender<Event>,
}

struct Inner {
    subscribers: Vec<Subscriber>,
    replay: VecDeque<Event>,
    next_id: u64,
}

/// Process-wide fan-out of [`Event`]s to in-process subscribers.
///
/// Cloning an `EventBus` shares the same underlying subscriber table and
/// replay buffer (it is a handle, like the teacher's WAL-backed bus).
#[derive(Clone)]
pub struct EventBus {
    inner: Arc<Mutex<Inner>>,
}

/// A subscriber's handle to the bus. Dropping it does not immediately
/// unsubscribe; call [`EventBus::unsubscribe`] explicitly, or let the next
/// publish lazily reap it once the receiver is dropped.
pub struct Subscription {
    pub id: u64,
    pub rx: mpsc::Receiver<Event>,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl EventBus {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                subscribers: Vec::new(),
                replay: VecDeque::with_capacity(REPLAY_BUFFER_SIZE),
                next_id: 1,
            })),
        }
    }

    /// Publish an event. Never blocks, never fails.
    pub fn publish(&self, event: Event) {
        let mut inner = self.inner.lock();
        if inner.replay.len() == REPLAY_BUFFER_SIZE {
            inner.replay.pop_front();
        }
        inner.replay.push_back(event.clone());
        inner
            .subscribers
            .retain(|sub| sub.tx.try_send(event.clone()).is_ok() || !sub.tx.is_closed());
    }

    /// Subscribe, seeding the new queue with everything still in the replay
    /// buffer so a late subscriber sees recent history.
    pub fn subscribe(&self) -> Subscription {
        let (tx, rx) = mpsc::channel(SUBSCRIBER_QUEUE_CAPACITY);
        let mut inner = self.inner.lock();
        for event in inner.replay.iter() {
            let _ = tx.try_send(event.clone());
        }
        let id = inner.next_id;
        inner.next_id += 1;
        inner.subscribers.push(Subscriber { id, tx });
        Subscription { id, rx }
    }

    /// Idempotent removal of a subscriber by id.
    pub fn unsubscribe(&self, id: u64) {
        let mut inner = self.inner.lock();
        inner.subscribers.retain(|sub| sub.id != id);
    }

    pub fn subscriber_count(&self) -> usize {
        self.inner.lock().subscribers.len()
    }

    pub fn replay_len(&self) -> usize {
        self.inner.lock().replay.len()
    }
}

#[cfg(test)]
#[path = "bus_tests.rs"]
mod tests;
