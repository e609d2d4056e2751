//! Memory

use crate::queue::WorkQueue;
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::{Mutex, Notify};
use tracing::{debug, trace};

/// In-memory FIFO queue, optionally bounded.
///
/// When bounded, `enqueue` waits for room; `try_enqueue` fails fast instead.
pub struct MemoryQueue<T> {
    items: Mutex<VecDeque<T>>,
    capacity: Option<usize>,
    closed: AtomicBool,
    not_empty: Notify,
    not_full: Notify,
}

impl<T> MemoryQueue<T> {
    /// Create a new unbounded queue
    pub fn new() -> Self {
        Self {
            items: Mutex::new(VecDeque::new()),
            capacity: None,
            closed: AtomicBool::new(false),
            not_empty: Notify::new(),
            not_full: Notify::new(),
        }
    }

    /// Create a new queue holding at most `capacity` tasks.
    ///
    /// Storage grows with the tasks actually queued; the bound is not reserved.
    pub fn bounded(capacity: usize) -> Self {
        Self {
            items: Mutex::new(VecDeque::new()),
            capacity: Some(capacity.max(1)),
            closed: AtomicBool::new(false),
            not_empty: Notify::new(),
            not_full: Notify::new(),
        }
    }

    /// Get the capacity of the queue, `None` when unbounded
    pub fn capacity(&self) -> Option<usize> {
        self.capacity
    }

    fn is_full(&self, len: usize) -> bool {
        self.capacity.is_some_and(|cap| len >= cap)
    }

    /// Add a task without waiting, failing if the queue is full
    pub async fn try_enqueue(&self, task: T) -> crate::Result<()> {
        if self.closed.load(Ordering::Acquire) {
            return Err(crate::ConsumerError::QueueClosed);
        }

        let mut items = self.items.lock().await;
        if self.is_full(items.len()) {
            return Err(crate::ConsumerError::QueueFull(items.len()));
        }
        items.push_back(task);
        drop(items);

        self.not_empty.notify_one();
        Ok(())
    }
}

impl<T> Default for MemoryQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<T: Send> WorkQueue<T> for MemoryQueue<T> {
    async fn enqueue(&self, task: T) -> crate::Result<()> {
        loop {
            // Register interest before checking so a pop between the check and
            // the await still wakes us.
            let room = self.not_full.notified();
            tokio::pin!(room);
            room.as_mut().enable();

            if self.closed.load(Ordering::Acquire) {
                return Err(crate::ConsumerError::QueueClosed);
            }

            {
                let mut items = self.items.lock().await;
                if !self.is_full(items.len()) {
                    items.push_back(task);
                    trace!("Task enqueued (size: {})", items.len());
                    drop(items);
                    self.not_empty.notify_one();
                    return Ok(());
                }
            }

            debug!("Queue full, waiting for room");
            room.await;
        }
    }

    async fn fetch(&self) -> Option<T> {
        loop {
            let ready = self.not_empty.notified();
            tokio::pin!(ready);
            ready.as_mut().enable();

            {
                let mut items = self.items.lock().await;
                if let Some(task) = items.pop_front() {
                    drop(items);
                    self.not_full.notify_one();
                    return Some(task);
                }
                if self.closed.load(Ordering::Acquire) {
                    return None;
                }
            }

            ready.await;
        }
    }

    async fn try_fetch(&self) -> Option<T> {
        let task = self.items.lock().await.pop_front();
        if task.is_some() {
            self.not_full.notify_one();
        }
        task
    }

    async fn size(&self) -> usize {
        self.items.lock().await.len()
    }

    fn close(&self) {
        if !self.closed.swap(true, Ordering::AcqRel) {
            debug!("Queue closed");
        }
        self.not_empty.notify_waiters();
        self.not_full.notify_waiters();
    }

    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }
}
