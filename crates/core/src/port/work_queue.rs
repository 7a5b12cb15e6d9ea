// Work Queue Port (Interface)
// reason: async-trait for the waiting `put`

use crate::domain::{PendingTask, QueueKind};
use async_trait::async_trait;
use std::sync::{Arc, PoisonError, RwLock, RwLockWriteGuard};
use std::time::Duration;

const PUT_RETRY_INTERVAL: Duration = Duration::from_millis(1);

/// Order-preserving, concurrency-safe container of pending tasks.
///
/// Shared between the pool's dispatch loop and the queue migrator, so every
/// method must be safe to call concurrently from many threads.
#[async_trait]
pub trait WorkQueue: Send + Sync {
    /// Capacity policy of this queue
    fn kind(&self) -> QueueKind;

    /// Maximum number of tasks held at once (None = unbounded)
    fn capacity(&self) -> Option<usize>;

    /// Current backlog
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Free slots left (None = unbounded)
    fn remaining_capacity(&self) -> Option<usize> {
        self.capacity().map(|cap| cap.saturating_sub(self.len()))
    }

    /// Remove the head task without waiting
    fn poll(&self) -> Option<PendingTask>;

    /// Append without waiting; hands the task back when full
    fn offer(&self, task: PendingTask) -> Result<(), PendingTask>;

    /// Append, waiting for space if the queue is full.
    ///
    /// Calling this on a queue attached to a live pool bypasses the slot's
    /// swap protection; producers go through [`QueueSlot::put`] instead.
    async fn put(&self, task: PendingTask);
}

/// A pool's reference to its currently attached queue.
///
/// Producers enqueue while holding the read side, so once the write side is
/// taken (see [`QueueSlot::lock`]) no new task can land in the attached
/// queue until the guard is dropped. Workers may keep polling a queue they
/// already obtained through [`QueueSlot::current`].
pub struct QueueSlot {
    current: RwLock<Arc<dyn WorkQueue>>,
}

impl QueueSlot {
    pub fn new(queue: Arc<dyn WorkQueue>) -> Self {
        Self {
            current: RwLock::new(queue),
        }
    }

    /// The queue attached right now
    pub fn current(&self) -> Arc<dyn WorkQueue> {
        Arc::clone(&self.current.read().unwrap_or_else(PoisonError::into_inner))
    }

    /// Run `f` against the attached queue while holding off any swap
    pub fn with_current<R>(&self, f: impl FnOnce(&dyn WorkQueue) -> R) -> R {
        let guard = self.current.read().unwrap_or_else(PoisonError::into_inner);
        f(guard.as_ref())
    }

    /// Producer path: offer to the attached queue
    pub fn offer(&self, task: PendingTask) -> Result<(), PendingTask> {
        self.with_current(|queue| queue.offer(task))
    }

    /// Producer path that waits for space.
    ///
    /// Each attempt is an [`offer`](Self::offer) under the read side, which is
    /// released between attempts so a swap can proceed; the task lands in
    /// whichever queue is attached when it finally fits.
    pub async fn put(&self, mut task: PendingTask) {
        loop {
            match self.offer(task) {
                Ok(()) => return,
                Err(returned) => {
                    task = returned;
                    tokio::time::sleep(PUT_RETRY_INTERVAL).await;
                }
            }
        }
    }

    /// Exclusive access for drain-and-swap. Blocks producers until dropped.
    pub fn lock(&self) -> QueueSlotGuard<'_> {
        QueueSlotGuard {
            guard: self.current.write().unwrap_or_else(PoisonError::into_inner),
        }
    }
}

/// Write access to a [`QueueSlot`]
pub struct QueueSlotGuard<'a> {
    guard: RwLockWriteGuard<'a, Arc<dyn WorkQueue>>,
}

impl QueueSlotGuard<'_> {
    pub fn current(&self) -> &Arc<dyn WorkQueue> {
        &self.guard
    }

    /// Whether `queue` is the instance attached right now
    pub fn is_attached(&self, queue: &Arc<dyn WorkQueue>) -> bool {
        std::ptr::addr_eq(Arc::as_ptr(&self.guard), Arc::as_ptr(queue))
    }

    /// Swap in `queue`, returning the detached one
    pub fn attach(&mut self, queue: Arc<dyn WorkQueue>) -> Arc<dyn WorkQueue> {
        std::mem::replace(&mut *self.guard, queue)
    }
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Mutex-backed FIFO queue for testing
    pub struct VecQueue {
        items: Mutex<VecDeque<PendingTask>>,
        capacity: Option<usize>,
    }

    impl VecQueue {
        pub fn unbounded() -> Self {
            Self {
                items: Mutex::new(VecDeque::new()),
                capacity: None,
            }
        }

        pub fn bounded(capacity: usize) -> Self {
            Self {
                items: Mutex::new(VecDeque::new()),
                capacity: Some(capacity),
            }
        }

        /// Pop every task and run it on the calling thread, in order
        pub fn run_all(&self) -> usize {
            let mut ran = 0;
            while let Some(task) = self.poll() {
                task.run();
                ran += 1;
            }
            ran
        }
    }

    #[async_trait]
    impl WorkQueue for VecQueue {
        fn kind(&self) -> QueueKind {
            if self.capacity.is_some() {
                QueueKind::Bounded
            } else {
                QueueKind::Unbounded
            }
        }

        fn capacity(&self) -> Option<usize> {
            self.capacity
        }

        fn len(&self) -> usize {
            self.items.lock().unwrap().len()
        }

        fn poll(&self) -> Option<PendingTask> {
            self.items.lock().unwrap().pop_front()
        }

        fn offer(&self, task: PendingTask) -> Result<(), PendingTask> {
            let mut items = self.items.lock().unwrap();
            if self.capacity.is_some_and(|cap| items.len() >= cap) {
                return Err(task);
            }
            items.push_back(task);
            Ok(())
        }

        async fn put(&self, mut task: PendingTask) {
            loop {
                match self.offer(task) {
                    Ok(()) => return,
                    Err(rejected) => {
                        task = rejected;
                        tokio::time::sleep(PUT_RETRY_INTERVAL).await;
                    }
                }
            }
        }
    }

    /// Reports itself unbounded but refuses offers once it holds `limit` tasks
    pub struct RefusingQueue {
        inner: VecQueue,
        limit: usize,
    }

    impl RefusingQueue {
        pub fn accepting(limit: usize) -> Self {
            Self {
                inner: VecQueue::unbounded(),
                limit,
            }
        }

        pub fn inner(&self) -> &VecQueue {
            &self.inner
        }
    }

    #[async_trait]
    impl WorkQueue for RefusingQueue {
        fn kind(&self) -> QueueKind {
            QueueKind::Unbounded
        }

        fn capacity(&self) -> Option<usize> {
            None
        }

        fn len(&self) -> usize {
            self.inner.len()
        }

        fn poll(&self) -> Option<PendingTask> {
            self.inner.poll()
        }

        fn offer(&self, task: PendingTask) -> Result<(), PendingTask> {
            if self.inner.len() >= self.limit {
                return Err(task);
            }
            self.inner.offer(task)
        }

        async fn put(&self, task: PendingTask) {
            let _ = self.offer(task);
        }
    }
}
