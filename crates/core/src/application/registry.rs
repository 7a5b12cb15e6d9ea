// Pool Registry - named pools and per-pool serialized reconfiguration

use super::reconfigure::{reconfigure, ReconfigureRequest};
use super::snapshot::{build_snapshot, require_label, PoolConfig};
use crate::domain::PoolConfigView;
use crate::error::{AppError, Result};
use crate::port::{IdProvider, PoolHandle, TimeProvider};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use tracing::{error, info, info_span};

/// Registry key: owning application plus pool name
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PoolKey {
    pub app_name: String,
    pub pool_name: String,
}

impl PoolKey {
    pub fn new(app_name: impl Into<String>, pool_name: impl Into<String>) -> Self {
        Self {
            app_name: app_name.into(),
            pool_name: pool_name.into(),
        }
    }
}

impl fmt::Display for PoolKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.app_name, self.pool_name)
    }
}

struct RegisteredPool {
    handle: Arc<dyn PoolHandle>,
    reconfig_lock: Mutex<()>,
}

/// All pools the process exposes for administration.
///
/// Reconfigurations of one pool are serialized by a per-pool mutex.
/// Snapshots never take it; they may observe a reconfiguration in flight.
pub struct PoolRegistry {
    pools: RwLock<BTreeMap<PoolKey, Arc<RegisteredPool>>>,
    id_provider: Arc<dyn IdProvider>,
    time_provider: Arc<dyn TimeProvider>,
}

impl PoolRegistry {
    pub fn new(id_provider: Arc<dyn IdProvider>, time_provider: Arc<dyn TimeProvider>) -> Self {
        Self {
            pools: RwLock::new(BTreeMap::new()),
            id_provider,
            time_provider,
        }
    }

    /// Register a pool under `(app_name, pool_name)`
    pub fn register(&self, app_name: &str, pool_name: &str, handle: Arc<dyn PoolHandle>) -> Result<()> {
        require_label(app_name, "app_name")?;
        require_label(pool_name, "pool_name")?;

        let key = PoolKey::new(app_name, pool_name);
        let mut pools = self.pools.write().unwrap_or_else(PoisonError::into_inner);
        if pools.contains_key(&key) {
            return Err(AppError::Conflict(format!("pool {key} already registered")));
        }

        info!(pool = %key, "Pool registered");
        pools.insert(
            key,
            Arc::new(RegisteredPool {
                handle,
                reconfig_lock: Mutex::new(()),
            }),
        );
        Ok(())
    }

    /// Remove a pool; returns its handle
    pub fn deregister(&self, app_name: &str, pool_name: &str) -> Result<Arc<dyn PoolHandle>> {
        let key = PoolKey::new(app_name, pool_name);
        let removed = self
            .pools
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&key)
            .ok_or_else(|| AppError::NotFound(format!("pool {key}")))?;

        info!(pool = %key, "Pool deregistered");
        Ok(Arc::clone(&removed.handle))
    }

    pub fn get(&self, app_name: &str, pool_name: &str) -> Result<Arc<dyn PoolHandle>> {
        self.entry(app_name, pool_name)
            .map(|entry| Arc::clone(&entry.handle))
    }

    pub fn len(&self) -> usize {
        self.pools.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Views of every registered pool, ordered by key
    pub fn list(&self) -> Result<Vec<PoolConfigView>> {
        let entries: Vec<(PoolKey, Arc<RegisteredPool>)> = self
            .pools
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(key, entry)| (key.clone(), Arc::clone(entry)))
            .collect();

        entries
            .iter()
            .map(|(key, entry)| self.view(key, entry.handle.as_ref()))
            .collect()
    }

    /// Current configuration of one pool
    pub fn snapshot(&self, app_name: &str, pool_name: &str) -> Result<PoolConfigView> {
        let entry = self.entry(app_name, pool_name)?;
        self.view(&PoolKey::new(app_name, pool_name), entry.handle.as_ref())
    }

    /// Reconfigure one pool, waiting for any reconfiguration already in flight on it
    pub fn reconfigure(
        &self,
        app_name: &str,
        pool_name: &str,
        request: ReconfigureRequest,
    ) -> Result<PoolConfigView> {
        let entry = self.entry(app_name, pool_name)?;
        let reconfig_id = self.id_provider.generate_id();
        let span = info_span!("reconfigure", %reconfig_id, app_name, pool_name);
        let _enter = span.enter();

        let _serial = entry
            .reconfig_lock
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        let config = reconfigure(app_name, pool_name, entry.handle.as_ref(), request).map_err(|e| {
            error!(error = %e, retryable = e.is_retryable(), "Reconfiguration failed");
            e
        })?;

        info!(
            min_workers = config.min_workers(),
            max_workers = config.max_workers(),
            queue_kind = %config.queue().kind(),
            "Reconfiguration complete"
        );
        Ok(self.to_view(&config, entry.handle.as_ref()))
    }

    fn entry(&self, app_name: &str, pool_name: &str) -> Result<Arc<RegisteredPool>> {
        let key = PoolKey::new(app_name, pool_name);
        self.pools
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&key)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("pool {key}")))
    }

    fn view(&self, key: &PoolKey, handle: &dyn PoolHandle) -> Result<PoolConfigView> {
        let config = build_snapshot(&key.app_name, &key.pool_name, handle)?;
        Ok(self.to_view(&config, handle))
    }

    fn to_view(&self, config: &PoolConfig, handle: &dyn PoolHandle) -> PoolConfigView {
        config.to_view(handle.live_workers(), self.time_provider.now_millis())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::QueueKind;
    use crate::port::id_provider::mocks::SequentialIdProvider;
    use crate::port::pool_handle::mocks::MockPool;
    use crate::port::time_provider::mocks::FixedTimeProvider;
    use crate::port::work_queue::mocks::VecQueue;
    use std::time::Duration;

    fn registry() -> PoolRegistry {
        PoolRegistry::new(
            Arc::new(SequentialIdProvider::default()),
            Arc::new(FixedTimeProvider(1_700_000_000_000)),
        )
    }

    #[test]
    fn test_register_and_snapshot() {
        let reg = registry();
        reg.register("billing", "invoices", Arc::new(MockPool::new(1, 4)))
            .unwrap();

        let view = reg.snapshot("billing", "invoices").unwrap();

        assert_eq!(view.app_name, "billing");
        assert_eq!(view.pool_name, "invoices");
        assert_eq!((view.min_workers, view.max_workers), (1, 4));
        assert_eq!(view.captured_at_ms, 1_700_000_000_000);
    }

    #[test]
    fn test_duplicate_register_conflicts() {
        let reg = registry();
        reg.register("app", "pool", Arc::new(MockPool::new(1, 1)))
            .unwrap();

        let err = reg
            .register("app", "pool", Arc::new(MockPool::new(1, 1)))
            .unwrap_err();

        assert!(matches!(err, AppError::Conflict(_)));
        assert_eq!(reg.len(), 1);
    }

    #[test]
    fn test_blank_name_rejected() {
        let reg = registry();
        let err = reg
            .register("app", " ", Arc::new(MockPool::new(1, 1)))
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidArgument(_)));
        assert!(reg.is_empty());
    }

    #[test]
    fn test_unknown_pool_not_found() {
        let reg = registry();
        assert!(matches!(reg.snapshot("app", "nope"), Err(AppError::NotFound(_))));
        assert!(matches!(
            reg.reconfigure("app", "nope", ReconfigureRequest::new(1, 1)),
            Err(AppError::NotFound(_))
        ));
        assert!(matches!(reg.deregister("app", "nope"), Err(AppError::NotFound(_))));
    }

    #[test]
    fn test_list_is_sorted_by_key() {
        let reg = registry();
        reg.register("b", "z", Arc::new(MockPool::new(1, 1))).unwrap();
        reg.register("a", "y", Arc::new(MockPool::new(1, 1))).unwrap();
        reg.register("a", "x", Arc::new(MockPool::new(1, 1))).unwrap();

        let names: Vec<String> = reg
            .list()
            .unwrap()
            .into_iter()
            .map(|v| format!("{}/{}", v.app_name, v.pool_name))
            .collect();

        assert_eq!(names, vec!["a/x", "a/y", "b/z"]);
    }

    #[test]
    fn test_reconfigure_through_registry() {
        let reg = registry();
        reg.register("app", "pool", Arc::new(MockPool::new(1, 1)))
            .unwrap();

        let view = reg
            .reconfigure(
                "app",
                "pool",
                ReconfigureRequest::new(2, 6)
                    .with_queue(Arc::new(VecQueue::bounded(10)))
                    .with_idle_timeout(Duration::from_millis(250)),
            )
            .unwrap();

        assert_eq!((view.min_workers, view.max_workers), (2, 6));
        assert_eq!(view.queue_kind, QueueKind::Bounded);
        assert_eq!(view.queue_capacity, Some(10));
        assert_eq!(view.idle_timeout_ms, 250);
    }

    #[test]
    fn test_concurrent_reconfigurations_are_serialized() {
        let reg = Arc::new(registry());
        let pool = Arc::new(MockPool::new(1, 1));
        reg.register("app", "pool", pool.clone()).unwrap();

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let reg = Arc::clone(&reg);
                std::thread::spawn(move || {
                    for round in 0..200 {
                        let (min, max) = if (i + round) % 2 == 0 { (6, 8) } else { (1, 2) };
                        reg.reconfigure("app", "pool", ReconfigureRequest::new(min, max))
                            .unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let end = pool.bounds();
        assert!(matches!((end.min(), end.max()), (6, 8) | (1, 2)));
    }

    #[test]
    fn test_deregister_returns_handle() {
        let reg = registry();
        reg.register("app", "pool", Arc::new(MockPool::new(3, 5)))
            .unwrap();

        let handle = reg.deregister("app", "pool").unwrap();

        assert_eq!(handle.bounds().max(), 5);
        assert!(reg.get("app", "pool").is_err());
    }
}
