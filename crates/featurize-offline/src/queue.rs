//! A bounded FIFO queue with blocking producers and consumers.
//!
//! The backpressure primitive of the batch engine: `push` blocks while the
//! queue is at capacity, so a fast producer can never read further ahead of
//! the consumers than the configured capacity.

use parking_lot::{Condvar, Mutex};
use std::collections::VecDeque;
use std::sync::Arc;

use crate::error::{OfflineError, Result};

#[derive(Debug)]
struct Inner<T> {
    buf: VecDeque<T>,
    capacity: usize,
    closed: bool,
}

#[derive(Debug)]
struct Shared<T> {
    inner: Mutex<Inner<T>>,
    not_empty: Condvar,
    not_full: Condvar,
}

/// A bounded multi-producer multi-consumer FIFO queue.
///
/// Cloning shares the same underlying queue.
#[derive(Debug)]
pub struct BoundedQueue<T> {
    shared: Arc<Shared<T>>,
}

impl<T> Clone for BoundedQueue<T> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<T> BoundedQueue<T> {
    /// Creates a queue holding at most `capacity` items (minimum 1).
    pub fn new(capacity: usize) -> Self {
        let inner = Inner {
            buf: VecDeque::new(),
            capacity: capacity.max(1),
            closed: false,
        };
        Self {
            shared: Arc::new(Shared {
                inner: Mutex::new(inner),
                not_empty: Condvar::new(),
                not_full: Condvar::new(),
            }),
        }
    }

    /// Appends an item, blocking while the queue is full.
    ///
    /// # Errors
    ///
    /// Returns [`OfflineError::QueueClosed`] if the queue is closed before
    /// the item could be appended.
    pub fn push(&self, item: T) -> Result<()> {
        let mut g = self.shared.inner.lock();
        while !g.closed && g.buf.len() >= g.capacity {
            self.shared.not_full.wait(&mut g);
        }
        if g.closed {
            return Err(OfflineError::QueueClosed);
        }
        g.buf.push_back(item);
        self.shared.not_empty.notify_one();
        Ok(())
    }

    /// Removes the oldest item, blocking while the queue is empty.
    ///
    /// Returns `None` once the queue is closed and drained.
    pub fn pop(&self) -> Option<T> {
        let mut g = self.shared.inner.lock();
        while !g.closed && g.buf.is_empty() {
            self.shared.not_empty.wait(&mut g);
        }
        let item = g.buf.pop_front();
        if item.is_some() {
            self.shared.not_full.notify_one();
        }
        item
    }

    /// Removes the oldest item without blocking.
    pub fn try_pop(&self) -> Option<T> {
        let mut g = self.shared.inner.lock();
        let item = g.buf.pop_front();
        if item.is_some() {
            self.shared.not_full.notify_one();
        }
        item
    }

    /// Returns the current number of queued items.
    pub fn len(&self) -> usize {
        self.shared.inner.lock().buf.len()
    }

    /// Returns whether the queue currently holds no items.
    pub fn is_empty(&self) -> bool {
        self.shared.inner.lock().buf.is_empty()
    }

    /// Closes the queue and wakes every blocked producer and consumer.
    ///
    /// Queued items remain poppable; further pushes fail.
    pub fn close(&self) {
        let mut g = self.shared.inner.lock();
        g.closed = true;
        self.shared.not_empty.notify_all();
        self.shared.not_full.notify_all();
    }
}
