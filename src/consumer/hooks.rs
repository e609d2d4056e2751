//! Hooks

/// Extension points run by the consumer around lifecycle transitions.
///
/// Hooks execute synchronously on the caller's thread and should only do
/// short cleanup or setup work. They never decide whether the worker drains.
pub trait LifecycleHooks: Send + Sync {
    /// Runs during `start`, before the worker is launched. Returning `false`
    /// aborts startup. No consumer lock is held, so the hook may query or
    /// terminate the consumer.
    fn on_start(&self) -> bool {
        true
    }

    /// Runs after a graceful `terminate` has been requested
    fn on_terminate(&self) {}

    /// Runs after an immediate `terminate_now` has been requested
    fn on_terminate_now(&self) {}
}

/// Hooks that do nothing and always allow startup
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopHooks;

impl LifecycleHooks for NoopHooks {}
