//! Queued Consumer - a single background worker draining a work queue
//!
//! This library provides a reusable consumer skeleton with a forward-only
//! lifecycle, graceful and immediate termination, per-task failure isolation,
//! and a completion signal reporting how many tasks were processed.

/// Configuration management for the consumer
pub mod config;
/// Consumer lifecycle, worker loop and completion signal
pub mod consumer;
/// Queue implementations and traits
pub mod queue;
/// Task handlers and failure policies
pub mod task;

pub use config::Config;
pub use consumer::builder::ConsumerBuilder;
pub use consumer::hooks::{LifecycleHooks, NoopHooks};
pub use consumer::signal::CompletionSignal;
pub use consumer::{QueuedConsumer, State};
pub use queue::memory::MemoryQueue;
pub use queue::priority::PriorityQueue;
pub use queue::WorkQueue;
pub use task::policy::{ExceptionPolicy, LogPolicy};
pub use task::{handler_fn, FnHandler, TaskError, TaskHandler};

use thiserror::Error;

/// Result type for consumer operations
pub type Result<T> = std::result::Result<T, ConsumerError>;

/// Error types for the consumer
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConsumerError {
    /// An operation was invoked in a state that forbids it
    #[error("cannot {operation} consumer '{name}' while {state}")]
    Lifecycle {
        /// Consumer name
        name: String,
        /// Operation that was rejected
        operation: &'static str,
        /// State observed when the operation was rejected
        state: State,
    },

    /// The queue no longer accepts tasks
    #[error("Queue is closed")]
    QueueClosed,

    /// The queue is at capacity and the caller asked not to wait
    #[error("Queue is full (capacity {0})")]
    QueueFull(usize),

    /// `start` was called outside of a tokio runtime
    #[error("No tokio runtime available: {0}")]
    NoRuntime(String),

    /// The completion signal can never be fulfilled because no worker owns it
    #[error("Worker exited without fulfilling the completion signal")]
    WorkerGone,

    /// Waiting on a completion signal exceeded the given bound
    #[error("Completion signal not fulfilled within {0:?}")]
    SignalTimeout(std::time::Duration),

    /// Configuration validation error
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl ConsumerError {
    /// Returns true for errors raised by lifecycle guards
    pub fn is_lifecycle(&self) -> bool {
        matches!(self, ConsumerError::Lifecycle { .. })
    }
}
