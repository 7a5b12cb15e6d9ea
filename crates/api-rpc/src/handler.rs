//! RPC Method Handlers
//!
//! Implements the business logic for each JSON-RPC method.

use crate::error::to_rpc_error;
use crate::types::{ListPoolsRequest, ListPoolsResponse, ReconfigureParams, SnapshotRequest};
use jsonrpsee::types::ErrorObjectOwned;
use smartpool_core::application::{PoolRegistry, ReconfigureRequest};
use smartpool_core::domain::PoolConfigView;
use smartpool_core::error::AppError;
use smartpool_core::port::QueueFactory;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// RPC Handler with injected dependencies
pub struct RpcHandler {
    registry: Arc<PoolRegistry>,
    queue_factory: Arc<dyn QueueFactory>,
}

impl RpcHandler {
    pub fn new(registry: Arc<PoolRegistry>, queue_factory: Arc<dyn QueueFactory>) -> Self {
        Self {
            registry,
            queue_factory,
        }
    }

    /// pool.list.v1
    pub async fn list(
        &self,
        _params: ListPoolsRequest,
    ) -> Result<ListPoolsResponse, ErrorObjectOwned> {
        let pools = self.registry.list().map_err(to_rpc_error)?;
        Ok(ListPoolsResponse { pools })
    }

    /// pool.snapshot.v1
    pub async fn snapshot(&self, params: SnapshotRequest) -> Result<PoolConfigView, ErrorObjectOwned> {
        self.registry
            .snapshot(&params.app_name, &params.pool_name)
            .map_err(to_rpc_error)
    }

    /// pool.reconfigure.v1
    ///
    /// Runs on the blocking pool: reconfiguration waits on the per-pool lock
    /// and holds producers off while the queue drains.
    pub async fn reconfigure(
        &self,
        params: ReconfigureParams,
    ) -> Result<PoolConfigView, ErrorObjectOwned> {
        info!(
            app_name = %params.app_name,
            pool_name = %params.pool_name,
            min_workers = params.min_workers,
            max_workers = params.max_workers,
            queue = ?params.queue,
            "Reconfigure requested"
        );

        let mut request = ReconfigureRequest::new(params.min_workers, params.max_workers);
        if let Some(spec) = &params.queue {
            let queue = self.queue_factory.create(spec).map_err(to_rpc_error)?;
            request = request.with_queue(queue);
        }
        if let Some(ms) = params.idle_timeout_ms {
            request = request.with_idle_timeout(Duration::from_millis(ms));
        }

        let registry = Arc::clone(&self.registry);
        tokio::task::spawn_blocking(move || {
            registry.reconfigure(&params.app_name, &params.pool_name, request)
        })
        .await
        .map_err(|e| to_rpc_error(AppError::Internal(format!("reconfigure task failed: {}", e))))?
        .map_err(to_rpc_error)
    }
}
