//! Priority

use crate::queue::WorkQueue;
use async_trait::async_trait;
use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::sync::atomic::{AtomicBool, Ordering as AtomicOrdering};
use tokio::sync::{Mutex, Notify};
use tracing::debug;

/// Wrapper ordering tasks by priority, then by arrival
struct Entry<T> {
    task: T,
    /// Sequence number for FIFO ordering within same priority
    sequence: u64,
}

impl<T: Ord> PartialEq for Entry<T> {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl<T: Ord> Eq for Entry<T> {}

impl<T: Ord> PartialOrd for Entry<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<T: Ord> Ord for Entry<T> {
    fn cmp(&self, other: &Self) -> Ordering {
        match self.task.cmp(&other.task) {
            // Reverse because BinaryHeap is a max-heap
            Ordering::Equal => other.sequence.cmp(&self.sequence),
            other => other,
        }
    }
}

struct Heap<T> {
    entries: BinaryHeap<Entry<T>>,
    next_sequence: u64,
}

/// Unbounded in-memory queue delivering the greatest task first.
///
/// Tasks comparing equal come out in the order they were enqueued.
pub struct PriorityQueue<T> {
    heap: Mutex<Heap<T>>,
    closed: AtomicBool,
    not_empty: Notify,
}

impl<T: Ord> PriorityQueue<T> {
    /// Create a new priority queue
    pub fn new() -> Self {
        Self {
            heap: Mutex::new(Heap {
                entries: BinaryHeap::new(),
                next_sequence: 0,
            }),
            closed: AtomicBool::new(false),
            not_empty: Notify::new(),
        }
    }
}

impl<T: Ord> Default for PriorityQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<T: Ord + Send> WorkQueue<T> for PriorityQueue<T> {
    async fn enqueue(&self, task: T) -> crate::Result<()> {
        if self.closed.load(AtomicOrdering::Acquire) {
            return Err(crate::ConsumerError::QueueClosed);
        }

        let mut heap = self.heap.lock().await;
        let sequence = heap.next_sequence;
        heap.next_sequence += 1;
        heap.entries.push(Entry { task, sequence });
        debug!("Task enqueued (sequence: {})", sequence);
        drop(heap);

        self.not_empty.notify_one();
        Ok(())
    }

    async fn fetch(&self) -> Option<T> {
        loop {
            let ready = self.not_empty.notified();
            tokio::pin!(ready);
            ready.as_mut().enable();

            {
                let mut heap = self.heap.lock().await;
                if let Some(entry) = heap.entries.pop() {
                    return Some(entry.task);
                }
                if self.closed.load(AtomicOrdering::Acquire) {
                    return None;
                }
            }

            ready.await;
        }
    }

    async fn try_fetch(&self) -> Option<T> {
        self.heap.lock().await.entries.pop().map(|entry| entry.task)
    }

    async fn size(&self) -> usize {
        self.heap.lock().await.entries.len()
    }

    fn close(&self) {
        self.closed.store(true, AtomicOrdering::Release);
        self.not_empty.notify_waiters();
    }

    fn is_closed(&self) -> bool {
        self.closed.load(AtomicOrdering::Acquire)
    }
}
