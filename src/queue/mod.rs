//! Work queues consumed by the worker

/// Memory
pub mod memory;
/// Priority
pub mod priority;

use async_trait::async_trait;

/// Trait for queue implementations.
///
/// A queue is shared by many producers and exactly one consumer worker.
#[async_trait]
pub trait WorkQueue<T: Send>: Send + Sync {
    /// Add a task to the queue, waiting if the queue applies backpressure
    async fn enqueue(&self, task: T) -> crate::Result<()>;

    /// Remove and return the next task, suspending until one is available.
    ///
    /// Returns `None` once the queue is closed and empty. Must be cancel safe:
    /// dropping the future before it completes must not lose a task.
    async fn fetch(&self) -> Option<T>;

    /// Remove and return the next task if one is available right now
    async fn try_fetch(&self) -> Option<T>;

    /// Get the current size of the queue
    async fn size(&self) -> usize;

    /// Check if the queue is empty
    async fn is_empty(&self) -> bool {
        self.size().await == 0
    }

    /// Stop accepting tasks and wake any suspended `fetch` or `enqueue`
    fn close(&self);

    /// Check if the queue has been closed
    fn is_closed(&self) -> bool;
}
