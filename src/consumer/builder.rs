use crate::config::Config;
use crate::consumer::hooks::{LifecycleHooks, NoopHooks};
use crate::consumer::{QueueFactory, QueuedConsumer};
use crate::queue::memory::MemoryQueue;
use crate::queue::WorkQueue;
use crate::task::policy::ExceptionPolicy;
use crate::task::TaskHandler;
use std::sync::Arc;
use std::time::Duration;

const DEFAULT_IDLE_BACKOFF: Duration = Duration::from_millis(100);

/// Builder for a [`QueuedConsumer`].
///
/// Only a name and a task handler are required. By default the consumer
/// uses an unbounded [`MemoryQueue`], no lifecycle hooks, no task timeout,
/// and logs failed tasks.
pub struct ConsumerBuilder<T: Send + Sync + 'static> {
    name: String,
    handler: Arc<dyn TaskHandler<T>>,
    hooks: Arc<dyn LifecycleHooks>,
    queue_factory: Option<QueueFactory<T>>,
    queue_capacity: Option<usize>,
    policy: Option<Arc<dyn ExceptionPolicy<T>>>,
    task_timeout: Option<Duration>,
    idle_backoff: Duration,
}

impl<T: Send + Sync + 'static> ConsumerBuilder<T> {
    /// Create a new builder with the given name and task handler
    pub fn new<H>(name: impl Into<String>, handler: H) -> Self
    where
        H: TaskHandler<T> + 'static,
    {
        Self {
            name: name.into(),
            handler: Arc::new(handler),
            hooks: Arc::new(NoopHooks),
            queue_factory: None,
            queue_capacity: None,
            policy: None,
            task_timeout: None,
            idle_backoff: DEFAULT_IDLE_BACKOFF,
        }
    }

    /// Create a builder taking name, queue bound and timings from `config`
    pub fn from_config<H>(config: &Config, handler: H) -> Self
    where
        H: TaskHandler<T> + 'static,
    {
        Self::new(config.name.clone(), handler)
            .with_queue_capacity(config.queue_capacity)
            .with_idle_backoff(config.idle_backoff())
            .with_task_timeout_opt(config.task_timeout())
    }

    /// Set the lifecycle hooks
    pub fn with_hooks<L>(mut self, hooks: L) -> Self
    where
        L: LifecycleHooks + 'static,
    {
        self.hooks = Arc::new(hooks);
        self
    }

    /// Bound the default memory queue
    pub fn with_queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = Some(capacity);
        self
    }

    /// Use a custom queue, built when the consumer starts
    pub fn with_queue<Q, F>(mut self, factory: F) -> Self
    where
        Q: WorkQueue<T> + 'static,
        F: Fn() -> Q + Send + Sync + 'static,
    {
        self.queue_factory = Some(Box::new(move || -> Arc<dyn WorkQueue<T>> {
            Arc::new(factory())
        }));
        self
    }

    /// Set the initial exception policy
    pub fn with_exception_policy<P>(mut self, policy: P) -> Self
    where
        P: ExceptionPolicy<T> + 'static,
    {
        self.policy = Some(Arc::new(policy));
        self
    }

    /// Fail tasks whose handler runs longer than `limit`
    pub fn with_task_timeout(mut self, limit: Duration) -> Self {
        self.task_timeout = Some(limit);
        self
    }

    fn with_task_timeout_opt(mut self, limit: Option<Duration>) -> Self {
        self.task_timeout = limit;
        self
    }

    /// Pause between fetches when the queue hands out nothing while running
    pub fn with_idle_backoff(mut self, backoff: Duration) -> Self {
        self.idle_backoff = backoff;
        self
    }

    /// Build the consumer in the `Init` state
    pub fn build(self) -> QueuedConsumer<T> {
        let queue_factory: QueueFactory<T> = match self.queue_factory {
            Some(factory) => factory,
            None => {
                let capacity = self.queue_capacity;
                Box::new(move || -> Arc<dyn WorkQueue<T>> {
                    match capacity {
                        Some(capacity) => Arc::new(MemoryQueue::bounded(capacity)),
                        None => Arc::new(MemoryQueue::new()),
                    }
                })
            }
        };

        QueuedConsumer::new(
            self.name,
            self.handler,
            self.hooks,
            queue_factory,
            self.policy,
            self.task_timeout,
            self.idle_backoff,
        )
    }
}

impl<T: Send + Sync + 'static> QueuedConsumer<T> {
    /// Shorthand for [`ConsumerBuilder::new`]
    pub fn builder<H>(name: impl Into<String>, handler: H) -> ConsumerBuilder<T>
    where
        H: TaskHandler<T> + 'static,
    {
        ConsumerBuilder::new(name, handler)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consumer::State;
    use crate::task::handler_fn;

    #[test]
    fn test_build_starts_in_init() {
        let consumer = ConsumerBuilder::new("builder", handler_fn(|_: &String| Ok(()))).build();
        assert_eq!(consumer.name(), "builder");
        assert_eq!(consumer.state(), State::Init);
        assert_eq!(consumer.consumed_count(), 0);
    }

    #[test]
    fn test_from_config() {
        let mut config = Config::new("configured");
        config.task_timeout_secs = 0;
        let builder = ConsumerBuilder::from_config(&config, handler_fn(|_: &u8| Ok(())));
        assert_eq!(builder.name, "configured");
        assert_eq!(builder.queue_capacity, Some(config.queue_capacity));
        assert_eq!(builder.task_timeout, None);
        assert_eq!(builder.idle_backoff, config.idle_backoff());
    }
}
