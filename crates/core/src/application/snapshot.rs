// Config Snapshot Builder - best-effort read of a live pool's configuration

use crate::domain::{Bounds, DomainError, PoolConfigView};
use crate::error::Result;
use crate::port::{PoolHandle, RejectionPolicy, WorkQueue, WorkerNaming};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Immutable description of a pool's configuration at one point in time.
///
/// The queue and both policies are shared references to the live objects,
/// not copies. `min_workers <= max_workers` always holds.
#[derive(Clone)]
pub struct PoolConfig {
    app_name: String,
    pool_name: String,
    bounds: Bounds,
    idle_timeout: Duration,
    queue: Arc<dyn WorkQueue>,
    worker_naming: Arc<dyn WorkerNaming>,
    rejection_policy: Arc<dyn RejectionPolicy>,
}

impl PoolConfig {
    pub fn app_name(&self) -> &str {
        &self.app_name
    }

    pub fn pool_name(&self) -> &str {
        &self.pool_name
    }

    pub fn bounds(&self) -> Bounds {
        self.bounds
    }

    pub fn min_workers(&self) -> usize {
        self.bounds.min()
    }

    pub fn max_workers(&self) -> usize {
        self.bounds.max()
    }

    pub fn idle_timeout(&self) -> Duration {
        self.idle_timeout
    }

    pub fn queue(&self) -> &Arc<dyn WorkQueue> {
        &self.queue
    }

    pub fn worker_naming(&self) -> &Arc<dyn WorkerNaming> {
        &self.worker_naming
    }

    pub fn rejection_policy(&self) -> &Arc<dyn RejectionPolicy> {
        &self.rejection_policy
    }

    /// Flatten into a serializable view
    pub fn to_view(&self, live_workers: usize, captured_at_ms: i64) -> PoolConfigView {
        PoolConfigView {
            app_name: self.app_name.clone(),
            pool_name: self.pool_name.clone(),
            min_workers: self.bounds.min(),
            max_workers: self.bounds.max(),
            idle_timeout_ms: self.idle_timeout.as_millis() as u64,
            queue_kind: self.queue.kind(),
            queue_capacity: self.queue.capacity(),
            queue_backlog: self.queue.len(),
            worker_naming: self.worker_naming.policy_name().to_string(),
            rejection_policy: self.rejection_policy.policy_name().to_string(),
            live_workers,
            captured_at_ms,
        }
    }
}

impl fmt::Debug for PoolConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PoolConfig")
            .field("app_name", &self.app_name)
            .field("pool_name", &self.pool_name)
            .field("min_workers", &self.bounds.min())
            .field("max_workers", &self.bounds.max())
            .field("idle_timeout", &self.idle_timeout)
            .field("queue_kind", &self.queue.kind())
            .field("queue_backlog", &self.queue.len())
            .field("worker_naming", &self.worker_naming.policy_name())
            .field("rejection_policy", &self.rejection_policy.policy_name())
            .finish()
    }
}

/// Read a pool's current configuration.
///
/// Not transactional: a concurrent reconfiguration may land between field
/// reads. The bounds pair itself is always read in one step.
pub fn build_snapshot(app_name: &str, pool_name: &str, pool: &dyn PoolHandle) -> Result<PoolConfig> {
    require_label(app_name, "app_name")?;
    require_label(pool_name, "pool_name")?;

    Ok(PoolConfig {
        app_name: app_name.to_string(),
        pool_name: pool_name.to_string(),
        bounds: pool.bounds(),
        idle_timeout: pool.idle_timeout(),
        queue: pool.queue_slot().current(),
        worker_naming: pool.worker_naming(),
        rejection_policy: pool.rejection_policy(),
    })
}

pub(crate) fn require_label(value: &str, field: &'static str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(DomainError::MissingParameter(field).into());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{PendingTask, QueueKind};
    use crate::error::AppError;
    use crate::port::pool_handle::mocks::MockPool;
    use crate::port::work_queue::mocks::VecQueue;

    #[test]
    fn test_snapshot_reads_pool_state() {
        let queue = Arc::new(VecQueue::bounded(16));
        queue.offer(PendingTask::new(|| {})).unwrap();
        let pool = MockPool::with_queue(2, 8, queue);
        pool.set_idle_timeout(Duration::from_millis(1500));

        let config = build_snapshot("billing", "invoices", &pool).unwrap();

        assert_eq!(config.app_name(), "billing");
        assert_eq!(config.pool_name(), "invoices");
        assert_eq!(config.min_workers(), 2);
        assert_eq!(config.max_workers(), 8);
        assert_eq!(config.idle_timeout(), Duration::from_millis(1500));
        assert_eq!(config.queue().capacity(), Some(16));
        assert_eq!(config.queue().len(), 1);
        assert_eq!(config.worker_naming().policy_name(), "fixed");
        assert_eq!(config.rejection_policy().policy_name(), "counting");
    }

    #[test]
    fn test_snapshot_references_live_queue() {
        let pool = MockPool::new(1, 1);
        let config = build_snapshot("app", "pool", &pool).unwrap();

        pool.queue_slot().offer(PendingTask::new(|| {})).unwrap();

        assert_eq!(config.queue().len(), 1);
    }

    #[test]
    fn test_blank_labels_rejected() {
        let pool = MockPool::new(1, 1);

        let err = build_snapshot("  ", "pool", &pool).unwrap_err();
        assert!(matches!(
            err,
            AppError::InvalidArgument(DomainError::MissingParameter("app_name"))
        ));

        let err = build_snapshot("app", "", &pool).unwrap_err();
        assert!(matches!(
            err,
            AppError::InvalidArgument(DomainError::MissingParameter("pool_name"))
        ));
    }

    #[test]
    fn test_view_flattens_config() {
        let pool = MockPool::new(0, 3);
        let view = build_snapshot("app", "pool", &pool)
            .unwrap()
            .to_view(2, 1_700_000_000_000);

        assert_eq!(view.min_workers, 0);
        assert_eq!(view.max_workers, 3);
        assert_eq!(view.queue_kind, QueueKind::Unbounded);
        assert_eq!(view.queue_capacity, None);
        assert_eq!(view.live_workers, 2);
        assert_eq!(view.idle_timeout_ms, 60_000);
        assert_eq!(view.captured_at_ms, 1_700_000_000_000);
    }
}
