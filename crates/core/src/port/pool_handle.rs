// Pool Handle Port (Interface)
// The live worker pool as seen by the reconfiguration protocol

use super::policy::{RejectionPolicy, WorkerNaming};
use super::work_queue::QueueSlot;
use crate::domain::{Bounds, CapacityError};
use std::sync::Arc;
use std::time::Duration;

/// Capability over a running worker pool.
///
/// Each individual bounds write must be atomic and must refuse any result
/// with `min > max`. Nothing makes a pair of writes atomic; ordering them is
/// the caller's job.
pub trait PoolHandle: Send + Sync {
    /// Consistent (min, max) read
    fn bounds(&self) -> Bounds;

    fn set_max_workers(&self, max: usize) -> Result<(), CapacityError>;

    fn set_min_workers(&self, min: usize) -> Result<(), CapacityError>;

    fn idle_timeout(&self) -> Duration;

    fn set_idle_timeout(&self, timeout: Duration);

    /// Reference to the attached queue
    fn queue_slot(&self) -> &QueueSlot;

    fn worker_naming(&self) -> Arc<dyn WorkerNaming>;

    fn rejection_policy(&self) -> Arc<dyn RejectionPolicy>;

    /// Workers currently alive (reporting only)
    fn live_workers(&self) -> usize;
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use crate::domain::AtomicBounds;
    use crate::port::policy::mocks::{CountingRejection, FixedNaming};
    use crate::port::work_queue::mocks::VecQueue;
    use crate::port::WorkQueue;
    use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
    use std::sync::Mutex;

    /// A single recorded bounds write
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum BoundsWrite {
        Max(usize),
        Min(usize),
    }

    /// In-memory pool without workers; records every bounds write
    pub struct MockPool {
        bounds: AtomicBounds,
        idle_timeout_ms: AtomicU64,
        slot: QueueSlot,
        naming: Arc<dyn WorkerNaming>,
        rejection: Arc<dyn RejectionPolicy>,
        writes: Mutex<Vec<BoundsWrite>>,
        refuse_min_writes: AtomicBool,
    }

    impl MockPool {
        pub fn new(min: usize, max: usize) -> Self {
            Self::with_queue(min, max, Arc::new(VecQueue::unbounded()))
        }

        pub fn with_queue(min: usize, max: usize, queue: Arc<dyn WorkQueue>) -> Self {
            Self {
                bounds: AtomicBounds::new(Bounds::new(min, max).unwrap()),
                idle_timeout_ms: AtomicU64::new(60_000),
                slot: QueueSlot::new(queue),
                naming: Arc::new(FixedNaming),
                rejection: Arc::new(CountingRejection::default()),
                writes: Mutex::new(Vec::new()),
                refuse_min_writes: AtomicBool::new(false),
            }
        }

        /// Bounds writes in the order they were applied
        pub fn writes(&self) -> Vec<BoundsWrite> {
            self.writes.lock().unwrap().clone()
        }

        /// Simulate a concurrent conflicting mutation on every min write
        pub fn refuse_min_writes(&self, refuse: bool) {
            self.refuse_min_writes.store(refuse, Ordering::SeqCst);
        }
    }

    impl PoolHandle for MockPool {
        fn bounds(&self) -> Bounds {
            self.bounds.load()
        }

        fn set_max_workers(&self, max: usize) -> Result<(), CapacityError> {
            self.bounds.set_max(max)?;
            self.writes.lock().unwrap().push(BoundsWrite::Max(max));
            Ok(())
        }

        fn set_min_workers(&self, min: usize) -> Result<(), CapacityError> {
            if self.refuse_min_writes.load(Ordering::SeqCst) {
                let current = self.bounds.load();
                return Err(CapacityError::MinAboveMax {
                    min,
                    max: current.max(),
                });
            }
            self.bounds.set_min(min)?;
            self.writes.lock().unwrap().push(BoundsWrite::Min(min));
            Ok(())
        }

        fn idle_timeout(&self) -> Duration {
            Duration::from_millis(self.idle_timeout_ms.load(Ordering::SeqCst))
        }

        fn set_idle_timeout(&self, timeout: Duration) {
            self.idle_timeout_ms
                .store(timeout.as_millis() as u64, Ordering::SeqCst);
        }

        fn queue_slot(&self) -> &QueueSlot {
            &self.slot
        }

        fn worker_naming(&self) -> Arc<dyn WorkerNaming> {
            Arc::clone(&self.naming)
        }

        fn rejection_policy(&self) -> Arc<dyn RejectionPolicy> {
            Arc::clone(&self.rejection)
        }

        fn live_workers(&self) -> usize {
            0
        }
    }
}
