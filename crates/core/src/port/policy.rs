// Pluggable pool policies (worker naming, overload rejection)

use super::work_queue::QueueSlot;
use crate::domain::PendingTask;
use thiserror::Error;

/// Errors surfaced to a producer submitting work
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SubmitError {
    #[error("Task rejected by pool {pool}: queue full and max_workers reached")]
    Rejected { pool: String },

    #[error("Pool {0} is shut down")]
    Shutdown(String),
}

/// Names the workers a pool spawns
pub trait WorkerNaming: Send + Sync {
    /// Policy name for reporting
    fn policy_name(&self) -> &str;

    fn worker_name(&self, pool_name: &str, index: usize) -> String;
}

/// Invoked when a task arrives while the queue is full and the pool is at
/// `max_workers`.
pub trait RejectionPolicy: Send + Sync {
    /// Policy name for reporting
    fn policy_name(&self) -> &str;

    fn on_rejected(
        &self,
        task: PendingTask,
        queue: &QueueSlot,
        pool_name: &str,
    ) -> Result<(), SubmitError>;
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// `{pool}-{index}`
    pub struct FixedNaming;

    impl WorkerNaming for FixedNaming {
        fn policy_name(&self) -> &str {
            "fixed"
        }

        fn worker_name(&self, pool_name: &str, index: usize) -> String {
            format!("{}-{}", pool_name, index)
        }
    }

    /// Counts rejections and refuses every task
    #[derive(Default)]
    pub struct CountingRejection {
        rejected: AtomicUsize,
    }

    impl CountingRejection {
        pub fn rejected(&self) -> usize {
            self.rejected.load(Ordering::SeqCst)
        }
    }

    impl RejectionPolicy for CountingRejection {
        fn policy_name(&self) -> &str {
            "counting"
        }

        fn on_rejected(
            &self,
            _task: PendingTask,
            _queue: &QueueSlot,
            pool_name: &str,
        ) -> Result<(), SubmitError> {
            self.rejected.fetch_add(1, Ordering::SeqCst);
            Err(SubmitError::Rejected {
                pool: pool_name.to_string(),
            })
        }
    }
}
