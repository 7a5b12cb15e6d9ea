// Pool Config View - serializable snapshot for display and registration

use super::queue::QueueKind;
use serde::{Deserialize, Serialize};

/// Flattened, owned copy of a pool snapshot.
///
/// Unlike `PoolConfig`, which references the live queue and policies, a view
/// holds only plain values and can cross process boundaries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolConfigView {
    pub app_name: String,
    pub pool_name: String,
    pub min_workers: usize,
    pub max_workers: usize,
    pub idle_timeout_ms: u64,
    pub queue_kind: QueueKind,
    /// None for unbounded queues
    pub queue_capacity: Option<usize>,
    pub queue_backlog: usize,
    pub worker_naming: String,
    pub rejection_policy: String,
    pub live_workers: usize,
    pub captured_at_ms: i64,
}
