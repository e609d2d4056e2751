/// Failure policies for tasks whose handler failed
pub mod policy;

use async_trait::async_trait;
use std::marker::PhantomData;
use std::time::Duration;
use thiserror::Error;

/// Errors raised while processing a single task.
///
/// These never leave the worker: they are routed to the consumer's
/// [`ExceptionPolicy`](policy::ExceptionPolicy) and the task is left out of
/// the processed count.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TaskError {
    /// The handler reported a failure
    #[error("task failed: {0}")]
    Failed(String),

    /// The handler did not finish within the configured task timeout
    #[error("task timed out after {0:?}")]
    Timeout(Duration),

    /// The handler panicked
    #[error("task panicked: {0}")]
    Panicked(String),
}

impl TaskError {
    /// Create a `Failed` error from any displayable message
    pub fn failed(msg: impl Into<String>) -> Self {
        TaskError::Failed(msg.into())
    }

    /// Short stable label for logs
    pub fn as_label(&self) -> &'static str {
        match self {
            TaskError::Failed(_) => "task_failed",
            TaskError::Timeout(_) => "task_timeout",
            TaskError::Panicked(_) => "task_panicked",
        }
    }

    pub(crate) fn from_panic(payload: Box<dyn std::any::Any + Send>) -> Self {
        let msg = if let Some(s) = payload.downcast_ref::<&str>() {
            (*s).to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "unknown panic payload".to_string()
        };
        TaskError::Panicked(msg)
    }
}

/// Business logic executed by the worker for every task
#[async_trait]
pub trait TaskHandler<T>: Send + Sync {
    /// Process one task
    async fn handle(&self, task: &T) -> Result<(), TaskError>;
}

/// Adapter turning a synchronous closure into a [`TaskHandler`]
pub struct FnHandler<T, F> {
    f: F,
    _task: PhantomData<fn(&T)>,
}

impl<T, F> FnHandler<T, F>
where
    F: Fn(&T) -> Result<(), TaskError> + Send + Sync,
{
    /// Wrap a closure
    pub fn new(f: F) -> Self {
        Self {
            f,
            _task: PhantomData,
        }
    }
}

#[async_trait]
impl<T, F> TaskHandler<T> for FnHandler<T, F>
where
    T: Send + Sync + 'static,
    F: Fn(&T) -> Result<(), TaskError> + Send + Sync,
{
    async fn handle(&self, task: &T) -> Result<(), TaskError> {
        (self.f)(task)
    }
}

/// Shorthand for [`FnHandler::new`]
pub fn handler_fn<T, F>(f: F) -> FnHandler<T, F>
where
    F: Fn(&T) -> Result<(), TaskError> + Send + Sync,
{
    FnHandler::new(f)
}
