//! Shared FIFO of pending pages
//!
//! The queue sits between the producer side, which appends pages from its
//! own thread of control, and the scheduling tick, which dequeues from the
//! head and may put a page that did not fit back at the head. One lock
//! acquisition spans each dequeue-or-requeue pass so messages are never
//! lost or duplicated between the two sides.

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard};

use crate::core::{Error, Message, Result};

/// Largest batch footprint a single message may have: the capacity of a
/// full 16-slot window with no timing correction.
pub const MAX_MESSAGE_BATCHES: usize = 224;

/// FIFO of pending messages shared between a producer and the scheduler
#[derive(Debug)]
pub struct MessageQueue {
    inner: Mutex<VecDeque<Message>>,
    max_batches: usize,
}

impl MessageQueue {
    /// Creates a queue with the default message size cap
    pub fn new() -> Self {
        Self::with_max_batches(MAX_MESSAGE_BATCHES)
    }

    /// Creates a queue rejecting messages that need more than `limit` batches
    pub fn with_max_batches(limit: usize) -> Self {
        MessageQueue {
            inner: Mutex::new(VecDeque::new()),
            max_batches: limit,
        }
    }

    /// Appends a message at the tail.
    ///
    /// A message whose batch footprint exceeds the configured cap could
    /// never leave the queue head and is rejected here instead.
    pub fn push(&self, message: Message) -> Result<()> {
        let required = message.batches_required();
        if required > self.max_batches {
            return Err(Error::MessageTooLarge {
                required,
                limit: self.max_batches,
            });
        }
        self.lock().push_back(message);
        Ok(())
    }

    /// Number of pending messages
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Whether no messages are pending
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Locks the underlying deque for one dequeue-or-requeue pass. A
    /// poisoned lock is recovered rather than propagated; the periodic
    /// scheduling path has to keep running.
    pub(crate) fn lock(&self) -> MutexGuard<'_, VecDeque<Message>> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Default for MessageQueue {
    fn default() -> Self {
        Self::new()
    }
}
