// Reconfiguration Orchestrator - validate, resize, migrate, report

use super::capacity;
use super::migrator;
use super::snapshot::{build_snapshot, require_label, PoolConfig};
use crate::domain::{Bounds, DomainError};
use crate::error::Result;
use crate::port::{PoolHandle, WorkQueue};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// Target state for one reconfiguration.
///
/// Resizing a queue and replacing its implementation are the same thing
/// here: both attach `new_queue`. Without one, only bounds (and optionally
/// the idle timeout) change.
#[derive(Clone)]
pub struct ReconfigureRequest {
    pub min_workers: usize,
    pub max_workers: usize,
    pub new_queue: Option<Arc<dyn WorkQueue>>,
    pub idle_timeout: Option<Duration>,
}

impl ReconfigureRequest {
    pub fn new(min_workers: usize, max_workers: usize) -> Self {
        Self {
            min_workers,
            max_workers,
            new_queue: None,
            idle_timeout: None,
        }
    }

    pub fn with_queue(mut self, queue: Arc<dyn WorkQueue>) -> Self {
        self.new_queue = Some(queue);
        self
    }

    pub fn with_idle_timeout(mut self, timeout: Duration) -> Self {
        self.idle_timeout = Some(timeout);
        self
    }
}

impl fmt::Debug for ReconfigureRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReconfigureRequest")
            .field("min_workers", &self.min_workers)
            .field("max_workers", &self.max_workers)
            .field("new_queue", &self.new_queue.as_ref().map(|q| q.kind()))
            .field("idle_timeout", &self.idle_timeout)
            .finish()
    }
}

/// Reconfigure a live pool and return its end state.
///
/// Sequence:
/// 1. Validate everything; bad input fails before any mutation
/// 2. Apply bounds in invariant-preserving order
/// 3. Apply the idle timeout, if requested
/// 4. If a queue was supplied: drain the attached queue into it and swap,
///    with producers held off for the whole drain-and-swap
///
/// Concurrent calls against the same pool are not serialized here; the
/// registry does that. A failure after step 2 leaves the new bounds in
/// place.
///
/// # Errors
/// - `InvalidArgument`: blank labels, `min > max`, zero max, or the
///   supplied queue is already attached
/// - `CapacityRejected`: the pool refused a bounds write
/// - `QueueIncompatible`: the new queue cannot hold the current backlog
pub fn reconfigure(
    app_name: &str,
    pool_name: &str,
    pool: &dyn PoolHandle,
    request: ReconfigureRequest,
) -> Result<PoolConfig> {
    require_label(app_name, "app_name")?;
    require_label(pool_name, "pool_name")?;
    let target = Bounds::new(request.min_workers, request.max_workers)?;

    if let Some(new_queue) = &request.new_queue {
        let attached = pool.queue_slot().current();
        if Arc::ptr_eq(&attached, new_queue) {
            return Err(DomainError::QueueAlreadyAttached.into());
        }
        // Early read-only check; repeated under the slot lock below
        migrator::ensure_fits(attached.as_ref(), new_queue.as_ref())?;
    }

    debug!(
        app_name,
        pool_name,
        request = ?request,
        "Reconfiguring pool"
    );

    capacity::apply(pool, target)?;

    if let Some(timeout) = request.idle_timeout {
        pool.set_idle_timeout(timeout);
    }

    if let Some(new_queue) = request.new_queue {
        let mut slot = pool.queue_slot().lock();
        let moved = migrator::migrate(&slot, &new_queue)?;
        let detached = slot.attach(new_queue);
        drop(slot);

        info!(
            pool_name,
            moved,
            left_in_detached = detached.len(),
            "Queue replaced"
        );
    }

    build_snapshot(app_name, pool_name, pool)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{PendingTask, QueueKind};
    use crate::error::AppError;
    use crate::port::pool_handle::mocks::{BoundsWrite, MockPool};
    use crate::port::work_queue::mocks::{RefusingQueue, VecQueue};
    use std::sync::Mutex;

    fn backlog(labels: &[&'static str], log: &Arc<Mutex<Vec<&'static str>>>) -> Arc<VecQueue> {
        let queue = Arc::new(VecQueue::unbounded());
        for &label in labels {
            let log = Arc::clone(log);
            queue
                .offer(PendingTask::new(move || log.lock().unwrap().push(label)))
                .unwrap();
        }
        queue
    }

    #[test]
    fn test_grow_and_swap_to_unbounded_queue() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let old = backlog(&["A", "B"], &log);
        let pool = MockPool::with_queue(1, 1, old.clone());
        let new_queue = Arc::new(VecQueue::unbounded());

        let config = reconfigure(
            "app",
            "pool",
            &pool,
            ReconfigureRequest::new(4, 4).with_queue(new_queue.clone()),
        )
        .unwrap();

        assert_eq!(config.min_workers(), 4);
        assert_eq!(config.max_workers(), 4);
        assert_eq!(config.queue().len(), 2);
        assert!(old.is_empty());

        let attached = pool.queue_slot().current();
        let expected: Arc<dyn WorkQueue> = new_queue.clone();
        assert!(Arc::ptr_eq(&attached, &expected));

        new_queue.run_all();
        assert_eq!(*log.lock().unwrap(), vec!["A", "B"]);
    }

    #[test]
    fn test_min_above_max_fails_before_mutation() {
        let pool = MockPool::new(2, 6);

        let err = reconfigure("app", "pool", &pool, ReconfigureRequest::new(5, 3)).unwrap_err();

        assert!(matches!(
            err,
            AppError::InvalidArgument(DomainError::MinExceedsMax { min: 5, max: 3 })
        ));
        assert_eq!(pool.bounds(), Bounds::new(2, 6).unwrap());
        assert!(pool.writes().is_empty());
    }

    #[test]
    fn test_bounds_only_keeps_queue() {
        let pool = MockPool::new(1, 2);
        let before = pool.queue_slot().current();

        let config = reconfigure("app", "pool", &pool, ReconfigureRequest::new(0, 8)).unwrap();

        assert_eq!((config.min_workers(), config.max_workers()), (0, 8));
        assert!(Arc::ptr_eq(&before, config.queue()));
    }

    #[test]
    fn test_too_small_queue_fails_before_mutation() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let old = backlog(&["A", "B", "C"], &log);
        let pool = MockPool::with_queue(1, 1, old.clone());

        let err = reconfigure(
            "app",
            "pool",
            &pool,
            ReconfigureRequest::new(2, 2).with_queue(Arc::new(VecQueue::bounded(2))),
        )
        .unwrap_err();

        assert!(matches!(
            err,
            AppError::QueueIncompatible {
                backlog: 3,
                capacity: 2
            }
        ));
        assert_eq!(old.len(), 3);
        assert!(pool.writes().is_empty());
        assert_eq!(pool.bounds(), Bounds::new(1, 1).unwrap());
    }

    #[test]
    fn test_reattaching_current_queue_is_invalid() {
        let pool = MockPool::new(1, 1);
        let current = pool.queue_slot().current();

        let err = reconfigure(
            "app",
            "pool",
            &pool,
            ReconfigureRequest::new(1, 2).with_queue(current),
        )
        .unwrap_err();

        assert!(matches!(
            err,
            AppError::InvalidArgument(DomainError::QueueAlreadyAttached)
        ));
        assert!(pool.writes().is_empty());
    }

    #[test]
    fn test_idle_timeout_applied() {
        let pool = MockPool::new(1, 1);

        let config = reconfigure(
            "app",
            "pool",
            &pool,
            ReconfigureRequest::new(1, 3).with_idle_timeout(Duration::from_secs(5)),
        )
        .unwrap();

        assert_eq!(config.idle_timeout(), Duration::from_secs(5));
    }

    #[test]
    fn test_bounded_replacement_reports_new_capacity() {
        let pool = MockPool::new(1, 1);

        let config = reconfigure(
            "app",
            "pool",
            &pool,
            ReconfigureRequest::new(1, 1).with_queue(Arc::new(VecQueue::bounded(32))),
        )
        .unwrap();

        assert_eq!(config.queue().kind(), QueueKind::Bounded);
        assert_eq!(config.queue().capacity(), Some(32));
    }

    #[test]
    fn test_capacity_rejection_skips_queue_swap() {
        let pool = MockPool::new(2, 4);
        pool.refuse_min_writes(true);
        let before = pool.queue_slot().current();

        let err = reconfigure(
            "app",
            "pool",
            &pool,
            ReconfigureRequest::new(6, 8).with_queue(Arc::new(VecQueue::unbounded())),
        )
        .unwrap_err();

        assert!(matches!(err, AppError::CapacityRejected(_)));
        assert_eq!(pool.writes(), vec![BoundsWrite::Max(8)]);
        assert!(Arc::ptr_eq(&before, &pool.queue_slot().current()));
    }

    #[test]
    fn test_refused_migration_keeps_every_task_on_attached_queue() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let old = Arc::new(VecQueue::unbounded());
        for n in 1..=5usize {
            let log = Arc::clone(&log);
            old.offer(PendingTask::new(move || log.lock().unwrap().push(n)))
                .unwrap();
        }
        let pool = MockPool::with_queue(1, 2, old.clone());
        let target = Arc::new(RefusingQueue::accepting(2));

        let err = reconfigure(
            "app",
            "pool",
            &pool,
            ReconfigureRequest::new(1, 2).with_queue(target.clone()),
        )
        .unwrap_err();

        assert!(matches!(
            err,
            AppError::QueueIncompatible {
                backlog: 5,
                capacity: 2
            }
        ));
        assert!(target.is_empty());
        let attached = pool.queue_slot().current();
        let expected: Arc<dyn WorkQueue> = old.clone();
        assert!(Arc::ptr_eq(&attached, &expected));

        old.run_all();
        assert_eq!(*log.lock().unwrap(), vec![1, 2, 3, 4, 5]);
    }
}
