// FIFO work queue (bounded or unbounded)

use async_trait::async_trait;
use smartpool_core::domain::{PendingTask, QueueKind, QueueSpec};
use smartpool_core::port::{QueueFactory, WorkQueue};
use smartpool_core::Result;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::Notify;

/// Mutex-guarded deque. Producers waiting in `put` are woken as tasks are
/// polled.
pub struct FifoQueue {
    items: Mutex<VecDeque<PendingTask>>,
    capacity: Option<usize>,
    space: Notify,
}

impl FifoQueue {
    pub fn unbounded() -> Self {
        Self {
            items: Mutex::new(VecDeque::new()),
            capacity: None,
            space: Notify::new(),
        }
    }

    /// A zero capacity is clamped to 1; `FifoQueueFactory` rejects it instead.
    pub fn bounded(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            items: Mutex::new(VecDeque::with_capacity(capacity.min(1024))),
            capacity: Some(capacity),
            space: Notify::new(),
        }
    }

    pub fn from_spec(spec: &QueueSpec) -> Self {
        match spec.capacity() {
            Some(capacity) => Self::bounded(capacity),
            None => Self::unbounded(),
        }
    }

    fn items(&self) -> MutexGuard<'_, VecDeque<PendingTask>> {
        self.items.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl WorkQueue for FifoQueue {
    fn kind(&self) -> QueueKind {
        match self.capacity {
            Some(_) => QueueKind::Bounded,
            None => QueueKind::Unbounded,
        }
    }

    fn capacity(&self) -> Option<usize> {
        self.capacity
    }

    fn len(&self) -> usize {
        self.items().len()
    }

    fn poll(&self) -> Option<PendingTask> {
        let task = self.items().pop_front();
        if task.is_some() && self.capacity.is_some() {
            self.space.notify_one();
        }
        task
    }

    fn offer(&self, task: PendingTask) -> std::result::Result<(), PendingTask> {
        let mut items = self.items();
        if matches!(self.capacity, Some(cap) if items.len() >= cap) {
            return Err(task);
        }
        items.push_back(task);
        Ok(())
    }

    async fn put(&self, mut task: PendingTask) {
        loop {
            // Register before offering so a poll in between is not missed
            let notified = self.space.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            match self.offer(task) {
                Ok(()) => return,
                Err(returned) => task = returned,
            }
            notified.await;
        }
    }
}

/// Builds `FifoQueue`s from queue specs
#[derive(Debug, Default, Clone, Copy)]
pub struct FifoQueueFactory;

impl QueueFactory for FifoQueueFactory {
    fn create(&self, spec: &QueueSpec) -> Result<Arc<dyn WorkQueue>> {
        spec.validate()?;
        Ok(Arc::new(FifoQueue::from_spec(spec)))
    }
}
