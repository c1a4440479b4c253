//! Bounded FIFO of recipients waiting for the dispatch gate.

use alloy::primitives::Address;
use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tokio::sync::Notify;

use crate::observability::metrics;

#[derive(Debug)]
pub struct ClaimQueue {
    entries: Mutex<VecDeque<Address>>,
    capacity: usize,
    ready: Notify,
}

impl ClaimQueue {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: Mutex::new(VecDeque::with_capacity(capacity)),
            capacity,
            ready: Notify::new(),
        }
    }

    /// Append without waiting. Returns the 1-based position, or `None` when full.
    pub fn try_enqueue(&self, recipient: Address) -> Option<usize> {
        let position = {
            let mut entries = self.entries();
            if entries.len() >= self.capacity {
                return None;
            }
            entries.push_back(recipient);
            entries.len()
        };
        metrics::record_queue_depth(position);
        self.ready.notify_one();
        Some(position)
    }

    /// Take the oldest entry.
    pub fn pop(&self) -> Option<Address> {
        let mut entries = self.entries();
        let next = entries.pop_front();
        metrics::record_queue_depth(entries.len());
        next
    }

    /// Resolves after an enqueue, including one that happened before the call.
    pub async fn wait_ready(&self) {
        self.ready.notified().await
    }

    pub fn len(&self) -> usize {
        self.entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    // Entries are plain addresses; a panic mid-update cannot leave them inconsistent.
    fn entries(&self) -> MutexGuard<'_, VecDeque<Address>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
