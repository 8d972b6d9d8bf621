//! Bounded transport queues.
//!
//! Every transport owns a response queue (capacity 50) and an event queue
//! (capacity 100). Both drop the oldest entry on overflow: responses that
//! nobody claimed within 50 messages are abandoned anyway, and under event
//! pressure the newest state is the one worth keeping.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::Notify;

/// Response queue capacity per transport.
pub const RESPONSE_QUEUE_CAPACITY: usize = 50;

/// Event queue capacity per transport.
pub const EVENT_QUEUE_CAPACITY: usize = 100;

/// A capacity-bounded FIFO shared between a transport's reader task and the
/// consumers on the main task. Overflow drops the oldest entry.
#[derive(Debug)]
pub struct BoundedQueue<T> {
    capacity: usize,
    inner: Mutex<VecDeque<T>>,
    notify: Notify,
    dropped: AtomicU64,
}

impl<T> BoundedQueue<T> {
    /// Create a queue holding at most `capacity` entries.
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "queue capacity must be non-zero");
        Self {
            capacity,
            inner: Mutex::new(VecDeque::with_capacity(capacity)),
            notify: Notify::new(),
            dropped: AtomicU64::new(0),
        }
    }

    /// Append an entry, evicting the oldest one when full, and wake any
    /// waiters.
    pub fn push(&self, item: T) {
        {
            let mut queue = self.inner.lock();
            if queue.len() == self.capacity {
                queue.pop_front();
                self.dropped.fetch_add(1, Ordering::Relaxed);
            }
            queue.push_back(item);
        }
        self.notify.notify_waiters();
    }

    /// Pop the oldest entry, if any.
    pub fn try_pop(&self) -> Option<T> {
        self.inner.lock().pop_front()
    }

    /// Remove and return the first entry matching `pred`, preserving the
    /// order of the rest.
    pub fn take_where(&self, mut pred: impl FnMut(&T) -> bool) -> Option<T> {
        let mut queue = self.inner.lock();
        let index = queue.iter().position(|item| pred(item))?;
        queue.remove(index)
    }

    /// Wait up to `timeout` for an entry matching `pred`.
    ///
    /// Entries pushed while waiting are observed without polling: the queue
    /// wakes all waiters on every push and each re-scans for its own match.
    pub async fn take_where_timeout(
        &self,
        timeout: Duration,
        mut pred: impl FnMut(&T) -> bool,
    ) -> Option<T> {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            let notified = self.notify.notified();
            tokio::pin!(notified);
            // Register before checking so a push between the check and the
            // await cannot be lost.
            notified.as_mut().enable();
            if let Some(item) = self.take_where(&mut pred) {
                return Some(item);
            }
            if tokio::time::timeout_at(deadline, notified).await.is_err() {
                return self.take_where(&mut pred);
            }
        }
    }

    /// Current number of queued entries.
    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    /// Whether the queue is empty.
    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }

    /// Number of entries evicted by overflow since creation.
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    /// Drop all queued entries (shutdown path).
    pub fn clear(&self) {
        self.inner.lock().clear();
    }
}
