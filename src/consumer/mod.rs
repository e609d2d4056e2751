/// Consumer builder
pub mod builder;
/// Lifecycle hooks
pub mod hooks;
/// Completion signal
pub mod signal;

mod worker;

use crate::consumer::hooks::LifecycleHooks;
use crate::consumer::signal::CompletionSignal;
use crate::queue::WorkQueue;
use crate::task::policy::{ExceptionPolicy, LogPolicy};
use crate::task::TaskHandler;
use crate::ConsumerError;
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicU8, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, OnceLock, PoisonError, RwLock};
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::{broadcast, oneshot};
use tokio::task::JoinHandle;
use tracing::{info, warn};

/// Lifecycle state of a consumer.
///
/// Transitions only move forward: `Init -> Running -> Terminated`, or
/// `Init -> Terminated` when startup is aborted or the consumer is terminated
/// before it was started.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum State {
    /// Constructed, not yet started
    Init = 0,
    /// Worker is consuming tasks
    Running = 1,
    /// Termination was requested; the worker may still be draining
    Terminated = 2,
}

impl State {
    fn from_u8(value: u8) -> Self {
        match value {
            0 => State::Init,
            1 => State::Running,
            _ => State::Terminated,
        }
    }
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            State::Init => "INIT",
            State::Running => "RUNNING",
            State::Terminated => "TERMINATED",
        };
        f.write_str(name)
    }
}

/// Factory building the consumer's queue when it starts
pub(crate) type QueueFactory<T> = Box<dyn Fn() -> Arc<dyn WorkQueue<T>> + Send + Sync>;

/// State shared between the consumer handle and its worker
pub(crate) struct Shared<T> {
    pub(crate) name: String,
    state: AtomicU8,
    consumed: AtomicU64,
    drain: AtomicBool,
    handler: Arc<dyn TaskHandler<T>>,
    policy: RwLock<Option<Arc<dyn ExceptionPolicy<T>>>>,
    fallback_policy: LogPolicy,
    completion: Mutex<Option<oneshot::Sender<u64>>>,
    task_timeout: Option<Duration>,
    idle_backoff: Duration,
}

impl<T> Shared<T> {
    pub(crate) fn state(&self) -> State {
        State::from_u8(self.state.load(Ordering::Acquire))
    }

    fn set_state(&self, state: State) {
        self.state.store(state as u8, Ordering::Release);
    }

    pub(crate) fn consumed_count(&self) -> u64 {
        self.consumed.load(Ordering::Acquire)
    }

    pub(crate) fn take_completion(&self) -> Option<oneshot::Sender<u64>> {
        self.completion
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
    }
}

#[derive(Default)]
struct Lifecycle {
    starting: bool,
    shutdown_tx: Option<broadcast::Sender<()>>,
    worker: Option<JoinHandle<()>>,
}

/// A single background worker draining a queue fed by many producers.
///
/// Created through [`ConsumerBuilder`](builder::ConsumerBuilder). Dropping a
/// running consumer stops its worker without draining.
pub struct QueuedConsumer<T: Send + Sync + 'static> {
    shared: Arc<Shared<T>>,
    hooks: Arc<dyn LifecycleHooks>,
    queue_factory: QueueFactory<T>,
    queue: OnceLock<Arc<dyn WorkQueue<T>>>,
    lifecycle: Mutex<Lifecycle>,
}

impl<T: Send + Sync + 'static> QueuedConsumer<T> {
    pub(crate) fn new(
        name: String,
        handler: Arc<dyn TaskHandler<T>>,
        hooks: Arc<dyn LifecycleHooks>,
        queue_factory: QueueFactory<T>,
        policy: Option<Arc<dyn ExceptionPolicy<T>>>,
        task_timeout: Option<Duration>,
        idle_backoff: Duration,
    ) -> Self {
        Self {
            shared: Arc::new(Shared {
                fallback_policy: LogPolicy::new(name.clone()),
                name,
                state: AtomicU8::new(State::Init as u8),
                consumed: AtomicU64::new(0),
                drain: AtomicBool::new(false),
                handler,
                policy: RwLock::new(policy),
                completion: Mutex::new(None),
                task_timeout,
                idle_backoff,
            }),
            hooks,
            queue_factory,
            queue: OnceLock::new(),
            lifecycle: Mutex::new(Lifecycle::default()),
        }
    }

    /// Start the consumer: build the queue, run the startup hook and launch
    /// the worker on the current tokio runtime.
    ///
    /// Returns `Ok(false)` if the startup hook refused to start; the consumer
    /// is then terminated without ever having run a worker. If the consumer is
    /// terminated while the hook runs, `start` fails with a lifecycle error.
    pub fn start(&self) -> crate::Result<bool> {
        let runtime = {
            let mut lifecycle = self.lock_lifecycle();
            let state = self.state();
            if state != State::Init || lifecycle.starting {
                return Err(self.lifecycle_error("start", state));
            }
            let runtime =
                Handle::try_current().map_err(|e| ConsumerError::NoRuntime(e.to_string()))?;
            lifecycle.starting = true;
            runtime
        };

        // The hook runs unlocked so it may call back into this consumer
        let queue = (self.queue_factory)();
        let accepted = self.hooks.on_start();

        let mut lifecycle = self.lock_lifecycle();
        lifecycle.starting = false;
        let state = self.state();
        if state != State::Init {
            queue.close();
            return Err(self.lifecycle_error("start", state));
        }

        if !accepted {
            warn!(consumer = %self.name(), "Startup hook failed, consumer will not run");
            queue.close();
            self.shared.set_state(State::Terminated);
            return Ok(false);
        }

        let queue = Arc::clone(self.queue.get_or_init(|| queue));
        let (shutdown_tx, shutdown_rx) = broadcast::channel(1);

        self.shared.set_state(State::Running);
        let shared = Arc::clone(&self.shared);
        lifecycle.worker = Some(runtime.spawn(worker::run(shared, queue, shutdown_rx)));
        lifecycle.shutdown_tx = Some(shutdown_tx);

        info!(consumer = %self.name(), "Consumer started");
        Ok(true)
    }

    /// Request graceful termination.
    ///
    /// Returns immediately. The worker finishes the current task, drains every
    /// task still queued, then fulfills the returned signal.
    pub fn terminate(&self) -> crate::Result<CompletionSignal> {
        self.request_termination(true)
    }

    /// Request immediate termination.
    ///
    /// Returns immediately. The worker finishes the current task and exits;
    /// tasks still queued are abandoned.
    pub fn terminate_now(&self) -> crate::Result<CompletionSignal> {
        self.request_termination(false)
    }

    fn request_termination(&self, drain: bool) -> crate::Result<CompletionSignal> {
        let operation = if drain { "terminate" } else { "terminate_now" };
        let lifecycle = self.lock_lifecycle();
        let state = self.state();
        if state == State::Terminated {
            return Err(self.lifecycle_error(operation, state));
        }

        let (tx, rx) = oneshot::channel();
        // Without a worker nobody can fulfill the signal; dropping the sender
        // resolves it as `WorkerGone`.
        if lifecycle.worker.is_some() {
            *self
                .shared
                .completion
                .lock()
                .unwrap_or_else(PoisonError::into_inner) = Some(tx);
        }

        if drain {
            self.shared.drain.store(true, Ordering::Release);
        }
        self.shared.set_state(State::Terminated);
        if let Some(shutdown_tx) = &lifecycle.shutdown_tx {
            let _ = shutdown_tx.send(());
        }
        drop(lifecycle);

        if drain {
            self.hooks.on_terminate();
        } else {
            self.hooks.on_terminate_now();
        }

        info!(consumer = %self.name(), drain, "Termination requested");
        Ok(CompletionSignal::new(rx))
    }

    /// Fail with a lifecycle error unless the consumer is running.
    ///
    /// Producers implementing their own submission call this before enqueueing.
    pub fn check_submit(&self) -> crate::Result<()> {
        let state = self.state();
        if state != State::Running {
            return Err(self.lifecycle_error("submit", state));
        }
        Ok(())
    }

    /// Submit a task for processing.
    ///
    /// A submit racing with termination may either be rejected or land in the
    /// queue; a task that lands after the worker stopped looking is dropped.
    pub async fn submit(&self, task: T) -> crate::Result<()> {
        self.check_submit()?;
        let queue = self
            .queue
            .get()
            .ok_or_else(|| self.lifecycle_error("submit", self.state()))?;
        queue.enqueue(task).await
    }

    /// Replace the handler invoked when a task fails. Last write wins.
    pub fn set_exception_policy<P>(&self, policy: P)
    where
        P: ExceptionPolicy<T> + 'static,
    {
        *self
            .shared
            .policy
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Some(Arc::new(policy));
    }

    /// Get the current lifecycle state
    pub fn state(&self) -> State {
        self.shared.state()
    }

    /// Get the number of tasks processed successfully so far
    pub fn consumed_count(&self) -> u64 {
        self.shared.consumed_count()
    }

    /// Get the consumer name used for the worker and its logs
    pub fn name(&self) -> &str {
        &self.shared.name
    }

    /// Get the number of tasks waiting in the queue
    pub async fn pending(&self) -> usize {
        match self.queue.get() {
            Some(queue) => queue.size().await,
            None => 0,
        }
    }

    /// Check if the worker has exited
    pub fn is_finished(&self) -> bool {
        self.lock_lifecycle()
            .worker
            .as_ref()
            .is_some_and(JoinHandle::is_finished)
    }

    fn lock_lifecycle(&self) -> MutexGuard<'_, Lifecycle> {
        self.lifecycle
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn lifecycle_error(&self, operation: &'static str, state: State) -> ConsumerError {
        ConsumerError::Lifecycle {
            name: self.shared.name.clone(),
            operation,
            state,
        }
    }
}

impl<T: Send + Sync + 'static> fmt::Debug for QueuedConsumer<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueuedConsumer")
            .field("name", &self.shared.name)
            .field("state", &self.state())
            .field("consumed", &self.consumed_count())
            .finish()
    }
}
