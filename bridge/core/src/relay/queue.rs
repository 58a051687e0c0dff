//! Relay Queue
//!
//! Hand-off between a feed loop and a display loop. Pushing never blocks;
//! popping waits until an item is available. An item the display failed to
//! deliver goes back to the front so frames reach the display in the order
//! they were produced.

use std::collections::VecDeque;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::Notify;

/// Backlog length past which pushes are logged
pub const BACKLOG_THRESHOLD: usize = 16;

struct Inner<T> {
    items: Mutex<VecDeque<T>>,
    available: Notify,
}

/// Unbounded FIFO shared by one producer and one consumer
pub struct RelayQueue<T> {
    inner: Arc<Inner<T>>,
}

impl<T> Clone for RelayQueue<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> Default for RelayQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> std::fmt::Debug for RelayQueue<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RelayQueue").field("len", &self.len()).finish()
    }
}

impl<T> RelayQueue<T> {
    /// Create an empty queue
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Inner {
                items: Mutex::new(VecDeque::new()),
                available: Notify::new(),
            }),
        }
    }

    /// Append a new item
    pub fn push(&self, item: T) {
        let len = {
            let mut items = self.inner.items.lock();
            items.push_back(item);
            items.len()
        };
        if len > BACKLOG_THRESHOLD {
            tracing::debug!(len, "Relay backlog growing");
        }
        self.inner.available.notify_one();
    }

    /// Put an undelivered item back ahead of everything newer
    pub fn requeue(&self, item: T) {
        self.inner.items.lock().push_front(item);
        self.inner.available.notify_one();
    }

    /// Take the oldest item without waiting
    pub fn try_pop(&self) -> Option<T> {
        self.inner.items.lock().pop_front()
    }

    /// Wait for and take the oldest item
    ///
    /// Cancel safe: dropping the future never loses an item.
    pub async fn pop(&self) -> T {
        loop {
            if let Some(item) = self.try_pop() {
                return item;
            }
            self.inner.available.notified().await;
        }
    }

    /// Items waiting
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.items.lock().len()
    }

    /// Whether nothing is waiting
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether the consumer has fallen behind
    #[must_use]
    pub fn is_backlogged(&self) -> bool {
        self.len() > BACKLOG_THRESHOLD
    }
}
