// Worker Pool - tokio-backed live pool with reconfigurable bounds and queue

use crate::constants::*;
use crate::fifo_queue::FifoQueue;
use crate::policy::{AbortPolicy, PrefixNaming};
use crate::shutdown::{shutdown_channel, ShutdownSender};
use smartpool_core::domain::{AtomicBounds, Bounds, CapacityError, DomainError, PendingTask};
use smartpool_core::port::{
    PoolHandle, QueueSlot, RejectionPolicy, SubmitError, WorkQueue, WorkerNaming,
};
use smartpool_core::{AppError, Result};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::Notify;
use tokio::time::{sleep, Instant};
use tracing::{debug, error, info, info_span, Instrument};

/// Builder for [`WorkerPool`]
pub struct WorkerPoolBuilder {
    name: String,
    min_workers: usize,
    max_workers: usize,
    idle_timeout: Duration,
    queue: Option<Arc<dyn WorkQueue>>,
    naming: Option<Arc<dyn WorkerNaming>>,
    rejection: Option<Arc<dyn RejectionPolicy>>,
    runtime: Option<Handle>,
}

impl WorkerPoolBuilder {
    pub fn min_workers(mut self, min: usize) -> Self {
        self.min_workers = min;
        self
    }

    pub fn max_workers(mut self, max: usize) -> Self {
        self.max_workers = max;
        self
    }

    pub fn idle_timeout(mut self, timeout: Duration) -> Self {
        self.idle_timeout = timeout;
        self
    }

    pub fn queue(mut self, queue: Arc<dyn WorkQueue>) -> Self {
        self.queue = Some(queue);
        self
    }

    pub fn worker_naming(mut self, naming: Arc<dyn WorkerNaming>) -> Self {
        self.naming = Some(naming);
        self
    }

    pub fn rejection_policy(mut self, rejection: Arc<dyn RejectionPolicy>) -> Self {
        self.rejection = Some(rejection);
        self
    }

    /// Runtime to spawn workers on (default: the current one)
    pub fn runtime(mut self, handle: Handle) -> Self {
        self.runtime = Some(handle);
        self
    }

    /// Build a pool with no workers yet; see [`WorkerPool::start`].
    ///
    /// # Errors
    /// - `InvalidArgument` for bad bounds or a blank name
    /// - `Config` when called outside a tokio runtime without `runtime(..)`
    pub fn build(self) -> Result<WorkerPool> {
        if self.name.trim().is_empty() {
            return Err(DomainError::MissingParameter("pool_name").into());
        }
        let bounds = Bounds::new(self.min_workers, self.max_workers)?;
        let runtime = match self.runtime {
            Some(handle) => handle,
            None => Handle::try_current().map_err(|e| {
                AppError::Config(format!("worker pool needs a tokio runtime: {}", e))
            })?,
        };

        let (shutdown, _) = shutdown_channel();
        Ok(WorkerPool {
            inner: Arc::new(PoolInner {
                name: self.name,
                bounds: AtomicBounds::new(bounds),
                idle_timeout_ms: AtomicU64::new(duration_ms(self.idle_timeout)),
                slot: QueueSlot::new(
                    self.queue
                        .unwrap_or_else(|| Arc::new(FifoQueue::unbounded())),
                ),
                naming: self.naming.unwrap_or_else(|| Arc::new(PrefixNaming)),
                rejection: self.rejection.unwrap_or_else(|| Arc::new(AbortPolicy)),
                live: AtomicUsize::new(0),
                next_index: AtomicUsize::new(1),
                work_available: Notify::new(),
                shutdown,
                runtime,
                completed: AtomicU64::new(0),
                panicked: AtomicU64::new(0),
            }),
        })
    }
}

/// A live worker pool.
///
/// Workers are tokio tasks; each task body runs on the blocking thread
/// pool. Bounds, idle timeout and queue may all change while the pool runs.
/// Cloning yields another handle to the same pool.
#[derive(Clone)]
pub struct WorkerPool {
    inner: Arc<PoolInner>,
}

struct PoolInner {
    name: String,
    bounds: AtomicBounds,
    idle_timeout_ms: AtomicU64,
    slot: QueueSlot,
    naming: Arc<dyn WorkerNaming>,
    rejection: Arc<dyn RejectionPolicy>,
    live: AtomicUsize,
    next_index: AtomicUsize,
    work_available: Notify,
    shutdown: ShutdownSender,
    runtime: Handle,
    completed: AtomicU64,
    panicked: AtomicU64,
}

/// Why a worker stopped
#[derive(Debug, Clone, Copy)]
enum Exit {
    AboveMax,
    IdleAboveMin,
    Shutdown,
}

impl WorkerPool {
    pub fn builder(name: impl Into<String>) -> WorkerPoolBuilder {
        WorkerPoolBuilder {
            name: name.into(),
            min_workers: DEFAULT_MIN_WORKERS,
            max_workers: DEFAULT_MAX_WORKERS,
            idle_timeout: DEFAULT_IDLE_TIMEOUT,
            queue: None,
            naming: None,
            rejection: None,
            runtime: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Spawn workers up to `min_workers`; returns how many were started
    pub fn start(&self) -> usize {
        let started = self.inner.fill_to_min();
        let bounds = self.inner.bounds.load();
        info!(
            pool = %self.inner.name,
            min_workers = bounds.min(),
            max_workers = bounds.max(),
            queue_kind = %self.inner.slot.current().kind(),
            "Worker pool started"
        );
        started
    }

    /// Submit a closure for execution
    pub fn submit<F>(&self, f: F) -> std::result::Result<(), SubmitError>
    where
        F: FnOnce() + Send + 'static,
    {
        self.submit_task(PendingTask::new(f))
    }

    /// Submit a task.
    ///
    /// 1. Below `min_workers`: start a worker that runs this task first
    /// 2. Otherwise enqueue on the attached queue
    /// 3. Queue full and below `max_workers`: start a worker for it
    /// 4. Otherwise hand it to the rejection policy
    pub fn submit_task(&self, task: PendingTask) -> std::result::Result<(), SubmitError> {
        let inner = &self.inner;
        if inner.shutdown.is_shutdown() {
            return Err(SubmitError::Shutdown(inner.name.clone()));
        }

        let bounds = inner.bounds.load();
        if inner.reserve(|live| live < bounds.min()) {
            inner.spawn_worker(Some(task));
            return Ok(());
        }

        match inner.slot.offer(task) {
            Ok(()) => {
                inner.work_available.notify_one();
                // min_workers may be 0 with every worker retired
                if inner.reserve(|live| live == 0) {
                    inner.spawn_worker(None);
                }
                Ok(())
            }
            Err(task) => {
                if inner.reserve(|live| live < bounds.max()) {
                    inner.spawn_worker(Some(task));
                    Ok(())
                } else {
                    inner.rejection.on_rejected(task, &inner.slot, &inner.name)
                }
            }
        }
    }

    /// Tasks that ran to completion
    pub fn completed_tasks(&self) -> u64 {
        self.inner.completed.load(Ordering::Relaxed)
    }

    /// Tasks that panicked
    pub fn panicked_tasks(&self) -> u64 {
        self.inner.panicked.load(Ordering::Relaxed)
    }

    /// Stop accepting tasks. Workers finish what is queued, then exit.
    pub fn shutdown(&self) {
        if self.inner.shutdown.is_shutdown() {
            return;
        }
        info!(
            pool = %self.inner.name,
            backlog = self.inner.slot.current().len(),
            "Worker pool shutting down"
        );
        self.inner.shutdown.shutdown();
        self.inner.work_available.notify_waiters();
    }

    pub fn is_shutdown(&self) -> bool {
        self.inner.shutdown.is_shutdown()
    }

    /// Wait until every worker has exited. Returns false on timeout.
    pub async fn await_termination(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        loop {
            if self.inner.live.load(Ordering::SeqCst) == 0 {
                return true;
            }
            if Instant::now() >= deadline {
                return false;
            }
            sleep(TERMINATION_POLL_INTERVAL).await;
        }
    }
}

impl PoolInner {
    /// Claim a worker slot if `admit(live)` holds
    fn reserve(&self, admit: impl Fn(usize) -> bool) -> bool {
        self.live
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |live| {
                admit(live).then_some(live + 1)
            })
            .is_ok()
    }

    /// Give back a worker slot if more than `floor` are live
    fn release_above(&self, floor: usize) -> bool {
        self.live
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |live| {
                (live > floor).then(|| live - 1)
            })
            .is_ok()
    }

    fn fill_to_min(self: &Arc<Self>) -> usize {
        let mut started = 0;
        while !self.shutdown.is_shutdown() {
            let min = self.bounds.load().min();
            if !self.reserve(|live| live < min) {
                break;
            }
            self.spawn_worker(None);
            started += 1;
        }
        started
    }

    /// Spawn a worker for an already reserved slot
    fn spawn_worker(self: &Arc<Self>, first: Option<PendingTask>) {
        let index = self.next_index.fetch_add(1, Ordering::Relaxed);
        let worker = self.naming.worker_name(&self.name, index);
        let span = info_span!("worker", pool = %self.name, worker = %worker);
        let inner = Arc::clone(self);
        self.runtime.spawn(inner.run_worker(first).instrument(span));
    }

    fn idle_timeout(&self) -> Duration {
        Duration::from_millis(self.idle_timeout_ms.load(Ordering::Relaxed))
    }

    async fn run_worker(self: Arc<Self>, first: Option<PendingTask>) {
        debug!("Worker started");
        let mut shutdown = self.shutdown.subscribe();

        if let Some(task) = first {
            self.execute(task).await;
        }

        let mut idle_since = Instant::now();
        let exit = loop {
            if shutdown.is_shutdown() {
                // Finish the backlog before exiting
                while let Some(task) = self.slot.current().poll() {
                    self.execute(task).await;
                }
                self.live.fetch_sub(1, Ordering::SeqCst);
                break Exit::Shutdown;
            }

            if self.release_above(self.bounds.load().max()) {
                break Exit::AboveMax;
            }

            let next = self.slot.current().poll();
            if let Some(task) = next {
                self.execute(task).await;
                idle_since = Instant::now();
                continue;
            }

            if idle_since.elapsed() >= self.idle_timeout()
                && self.release_above(self.bounds.load().min())
            {
                break Exit::IdleAboveMin;
            }

            tokio::select! {
                _ = self.work_available.notified() => {}
                _ = sleep(IDLE_POLL_INTERVAL) => {}
                _ = shutdown.wait() => {}
            }
        };

        debug!(reason = ?exit, live = self.live.load(Ordering::SeqCst), "Worker stopped");

        // A task may have landed between the last poll and the release. During
        // shutdown this covers a submit that passed its check just before the
        // signal and offered after the final drain.
        if !self.slot.current().is_empty() && self.reserve(|live| live == 0) {
            self.spawn_worker(None);
        }
    }

    async fn execute(&self, task: PendingTask) {
        match tokio::task::spawn_blocking(move || task.run()).await {
            Ok(()) => {
                self.completed.fetch_add(1, Ordering::Relaxed);
            }
            Err(e) if e.is_panic() => {
                self.panicked.fetch_add(1, Ordering::Relaxed);
                error!(error = %e, "Task panicked");
            }
            Err(e) => {
                error!(error = %e, "Task was cancelled");
            }
        }
    }
}

impl PoolHandle for WorkerPool {
    fn bounds(&self) -> Bounds {
        self.inner.bounds.load()
    }

    fn set_max_workers(&self, max: usize) -> std::result::Result<(), CapacityError> {
        let inner = &self.inner;
        if inner.shutdown.is_shutdown() {
            return Err(CapacityError::Shutdown(inner.name.clone()));
        }
        let previous = inner.bounds.load().max();
        let applied = inner.bounds.set_max(max)?;
        debug!(pool = %inner.name, previous, max = applied.max(), "max_workers set");

        if applied.max() < previous {
            // Idle workers re-check against the new max
            inner.work_available.notify_waiters();
        }
        Ok(())
    }

    fn set_min_workers(&self, min: usize) -> std::result::Result<(), CapacityError> {
        let inner = &self.inner;
        if inner.shutdown.is_shutdown() {
            return Err(CapacityError::Shutdown(inner.name.clone()));
        }
        let previous = inner.bounds.load().min();
        let applied = inner.bounds.set_min(min)?;
        debug!(pool = %inner.name, previous, min = applied.min(), "min_workers set");

        if applied.min() > previous {
            inner.fill_to_min();
        } else if applied.min() < previous {
            inner.work_available.notify_waiters();
        }
        Ok(())
    }

    fn idle_timeout(&self) -> Duration {
        self.inner.idle_timeout()
    }

    fn set_idle_timeout(&self, timeout: Duration) {
        self.inner
            .idle_timeout_ms
            .store(duration_ms(timeout), Ordering::Relaxed);
    }

    fn queue_slot(&self) -> &QueueSlot {
        &self.inner.slot
    }

    fn worker_naming(&self) -> Arc<dyn WorkerNaming> {
        Arc::clone(&self.inner.naming)
    }

    fn rejection_policy(&self) -> Arc<dyn RejectionPolicy> {
        Arc::clone(&self.inner.rejection)
    }

    fn live_workers(&self) -> usize {
        self.inner.live.load(Ordering::SeqCst)
    }
}

fn duration_ms(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}
