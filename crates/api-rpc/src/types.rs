//! RPC Request/Response Types
//!
//! Defines the JSON-RPC method parameters and results.

use serde::{Deserialize, Serialize};
use smartpool_core::domain::{PoolConfigView, QueueSpec};

/// pool.list.v1 - Every registered pool
#[derive(Debug, Default, Deserialize)]
pub struct ListPoolsRequest {
    // No parameters needed
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListPoolsResponse {
    pub pools: Vec<PoolConfigView>,
}

/// pool.snapshot.v1 - One pool's current configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotRequest {
    pub app_name: String,
    pub pool_name: String,
}

/// pool.reconfigure.v1 - Change bounds and optionally swap the queue
///
/// ```text
/// { "app_name": "billing", "pool_name": "invoices",
///   "min_workers": 2, "max_workers": 8,
///   "queue": { "kind": "bounded", "capacity": 512 } }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReconfigureParams {
    pub app_name: String,
    pub pool_name: String,
    pub min_workers: usize,
    pub max_workers: usize,
    /// New queue to attach; absent keeps the current one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub queue: Option<QueueSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub idle_timeout_ms: Option<u64>,
}
