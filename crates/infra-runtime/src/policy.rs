// Worker naming and rejection policies

use serde::{Deserialize, Serialize};
use smartpool_core::domain::PendingTask;
use smartpool_core::port::{QueueSlot, RejectionPolicy, SubmitError, WorkerNaming};
use smartpool_core::{AppError, Result};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{debug, warn};

/// `{pool}-worker-{n}`
#[derive(Debug, Default, Clone, Copy)]
pub struct PrefixNaming;

impl WorkerNaming for PrefixNaming {
    fn policy_name(&self) -> &str {
        "prefix"
    }

    fn worker_name(&self, pool_name: &str, index: usize) -> String {
        format!("{}-worker-{}", pool_name, index)
    }
}

/// Refuse the task
#[derive(Debug, Default, Clone, Copy)]
pub struct AbortPolicy;

impl RejectionPolicy for AbortPolicy {
    fn policy_name(&self) -> &str {
        "abort"
    }

    fn on_rejected(
        &self,
        _task: PendingTask,
        _queue: &QueueSlot,
        pool_name: &str,
    ) -> std::result::Result<(), SubmitError> {
        warn!(pool = pool_name, "Task rejected: queue full at max_workers");
        Err(SubmitError::Rejected {
            pool: pool_name.to_string(),
        })
    }
}

/// Run the task on the submitting thread.
///
/// Blocks the caller for the task's duration; avoid from async contexts.
#[derive(Debug, Default, Clone, Copy)]
pub struct CallerRunsPolicy;

impl RejectionPolicy for CallerRunsPolicy {
    fn policy_name(&self) -> &str {
        "caller_runs"
    }

    fn on_rejected(
        &self,
        task: PendingTask,
        _queue: &QueueSlot,
        pool_name: &str,
    ) -> std::result::Result<(), SubmitError> {
        debug!(pool = pool_name, "Pool saturated, running task on caller");
        task.run();
        Ok(())
    }
}

/// Drop the task silently
#[derive(Debug, Default, Clone, Copy)]
pub struct DiscardPolicy;

impl RejectionPolicy for DiscardPolicy {
    fn policy_name(&self) -> &str {
        "discard"
    }

    fn on_rejected(
        &self,
        _task: PendingTask,
        _queue: &QueueSlot,
        pool_name: &str,
    ) -> std::result::Result<(), SubmitError> {
        debug!(pool = pool_name, "Pool saturated, task discarded");
        Ok(())
    }
}

/// Drop the oldest queued task and enqueue this one in its place
#[derive(Debug, Default, Clone, Copy)]
pub struct DiscardOldestPolicy;

impl RejectionPolicy for DiscardOldestPolicy {
    fn policy_name(&self) -> &str {
        "discard_oldest"
    }

    fn on_rejected(
        &self,
        task: PendingTask,
        queue: &QueueSlot,
        pool_name: &str,
    ) -> std::result::Result<(), SubmitError> {
        queue.with_current(|queue| {
            if queue.poll().is_some() {
                debug!(pool = pool_name, "Pool saturated, oldest task discarded");
            }
            queue.offer(task).map_err(|_| SubmitError::Rejected {
                pool: pool_name.to_string(),
            })
        })
    }
}

/// Rejection policy as named in configuration and admin requests
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectionPolicyName {
    #[default]
    Abort,
    CallerRuns,
    Discard,
    DiscardOldest,
}

impl RejectionPolicyName {
    pub fn as_str(&self) -> &'static str {
        match self {
            RejectionPolicyName::Abort => "abort",
            RejectionPolicyName::CallerRuns => "caller_runs",
            RejectionPolicyName::Discard => "discard",
            RejectionPolicyName::DiscardOldest => "discard_oldest",
        }
    }

    pub fn build(self) -> Arc<dyn RejectionPolicy> {
        match self {
            RejectionPolicyName::Abort => Arc::new(AbortPolicy),
            RejectionPolicyName::CallerRuns => Arc::new(CallerRunsPolicy),
            RejectionPolicyName::Discard => Arc::new(DiscardPolicy),
            RejectionPolicyName::DiscardOldest => Arc::new(DiscardOldestPolicy),
        }
    }
}

impl fmt::Display for RejectionPolicyName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RejectionPolicyName {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "abort" => Ok(RejectionPolicyName::Abort),
            "caller_runs" => Ok(RejectionPolicyName::CallerRuns),
            "discard" => Ok(RejectionPolicyName::Discard),
            "discard_oldest" => Ok(RejectionPolicyName::DiscardOldest),
            other => Err(AppError::Config(format!(
                "unknown rejection policy '{}' (expected abort, caller_runs, discard or discard_oldest)",
                other
            ))),
        }
    }
}

/// Resolve a rejection policy by its configured name
pub fn rejection_policy_by_name(name: &str) -> Result<Arc<dyn RejectionPolicy>> {
    Ok(name.parse::<RejectionPolicyName>()?.build())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fifo_queue::FifoQueue;
    use smartpool_core::port::WorkQueue;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    fn full_slot(capacity: usize) -> (QueueSlot, Arc<FifoQueue>) {
        let queue = Arc::new(FifoQueue::bounded(capacity));
        for _ in 0..capacity {
            queue.offer(PendingTask::new(|| {})).unwrap();
        }
        (QueueSlot::new(queue.clone()), queue)
    }

    #[test]
    fn test_prefix_naming() {
        assert_eq!(PrefixNaming.worker_name("ingest", 3), "ingest-worker-3");
    }

    #[test]
    fn test_abort_rejects() {
        let (slot, _) = full_slot(1);
        let err = AbortPolicy
            .on_rejected(PendingTask::new(|| {}), &slot, "p")
            .unwrap_err();
        assert_eq!(err, SubmitError::Rejected { pool: "p".into() });
    }

    #[test]
    fn test_caller_runs_executes_inline() {
        let (slot, _) = full_slot(1);
        let ran = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&ran);

        CallerRunsPolicy
            .on_rejected(
                PendingTask::new(move || {
                    counter.fetch_add(1, Ordering::SeqCst);
                }),
                &slot,
                "p",
            )
            .unwrap();

        assert_eq!(ran.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_discard_drops_task() {
        let (slot, queue) = full_slot(2);
        DiscardPolicy
            .on_rejected(PendingTask::new(|| {}), &slot, "p")
            .unwrap();
        assert_eq!(queue.len(), 2);
    }

    #[test]
    fn test_discard_oldest_replaces_head() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let queue = Arc::new(FifoQueue::bounded(2));
        for n in [1, 2] {
            let log = Arc::clone(&log);
            queue
                .offer(PendingTask::new(move || log.lock().unwrap().push(n)))
                .unwrap();
        }
        let slot = QueueSlot::new(queue.clone());

        let newest = Arc::clone(&log);
        DiscardOldestPolicy
            .on_rejected(
                PendingTask::new(move || newest.lock().unwrap().push(3)),
                &slot,
                "p",
            )
            .unwrap();

        while let Some(task) = queue.poll() {
            task.run();
        }
        assert_eq!(*log.lock().unwrap(), vec![2, 3]);
    }

    #[test]
    fn test_policy_by_name() {
        for name in ["abort", "caller_runs", "discard", "discard_oldest"] {
            assert_eq!(rejection_policy_by_name(name).unwrap().policy_name(), name);
        }
        assert!(matches!(
            rejection_policy_by_name("retry"),
            Err(AppError::Config(_))
        ));
    }

    #[test]
    fn test_policy_name_serde() {
        let name: RejectionPolicyName = serde_json::from_str("\"discard_oldest\"").unwrap();
        assert_eq!(name, RejectionPolicyName::DiscardOldest);
        assert_eq!(name.to_string(), "discard_oldest");
    }
}
