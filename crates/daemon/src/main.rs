//! SmartPool Daemon - Main Entry Point
//! Hosts the configured worker pools and serves the admin RPC.

mod config;
mod telemetry;

use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

use crate::config::{config_path, DaemonConfig, PoolSettings};
use smartpool_api_rpc::{RpcHandler, RpcServer};
use smartpool_core::application::PoolRegistry;
use smartpool_core::port::id_provider::UuidProvider;
use smartpool_core::port::time_provider::SystemTimeProvider;
use smartpool_core::port::QueueFactory;
use smartpool_infra_runtime::{FifoQueueFactory, WorkerPool};

const VERSION: &str = env!("CARGO_PKG_VERSION");
const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Initialize logging (pretty or JSON, non-blocking stdout)
    let _log_guard = init_logging()?;
    info!("SmartPool daemon v{} starting...", VERSION);

    // 2. Load configuration
    let path = config_path();
    let config = DaemonConfig::load(&path)?;
    info!(
        path = %path.display(),
        app_name = %config.app_name,
        pools = config.pools.len(),
        "Configuration loaded"
    );

    // 3. Build and register pools (DI wiring)
    let registry = Arc::new(PoolRegistry::new(
        Arc::new(UuidProvider),
        Arc::new(SystemTimeProvider),
    ));
    let queue_factory: Arc<dyn QueueFactory> = Arc::new(FifoQueueFactory);

    let mut pools = Vec::with_capacity(config.pools.len());
    for settings in &config.pools {
        let pool = build_pool(settings, queue_factory.as_ref())?;
        pool.start();
        registry
            .register(&config.app_name, &settings.name, Arc::new(pool.clone()))
            .with_context(|| format!("Failed to register pool '{}'", settings.name))?;
        pools.push(pool);
    }

    // 4. Start JSON-RPC server
    let rpc_server = RpcServer::new(
        config.rpc.clone(),
        RpcHandler::new(Arc::clone(&registry), queue_factory),
    );
    let (rpc_addr, rpc_handle) = rpc_server
        .start()
        .await
        .map_err(|e| anyhow::anyhow!("RPC server start failed: {}", e))?;

    info!(rpc = %rpc_addr, "System ready. Press Ctrl+C to shutdown");

    // 5. Wait for shutdown signal
    tokio::signal::ctrl_c().await?;
    info!("Shutdown signal received. Exiting gracefully...");

    // 6. Graceful shutdown: stop admin traffic, then drain pools
    if let Err(e) = rpc_handle.stop() {
        warn!(error = %e, "RPC server already stopped");
    }
    for pool in &pools {
        pool.shutdown();
    }
    for pool in &pools {
        if !pool.await_termination(SHUTDOWN_TIMEOUT).await {
            error!(pool = %pool.name(), "Workers did not stop within timeout");
        }
    }

    info!("Shutdown complete.");
    Ok(())
}

fn build_pool(settings: &PoolSettings, queue_factory: &dyn QueueFactory) -> Result<WorkerPool> {
    let queue = queue_factory
        .create(&settings.queue)
        .with_context(|| format!("pool '{}': invalid queue", settings.name))?;

    WorkerPool::builder(&settings.name)
        .min_workers(settings.min_workers)
        .max_workers(settings.max_workers)
        .idle_timeout(settings.idle_timeout())
        .queue(queue)
        .rejection_policy(settings.rejection.build())
        .build()
        .with_context(|| format!("Failed to build pool '{}'", settings.name))
}

/// Install the global subscriber. Keep the returned guard alive to flush logs.
fn init_logging() -> Result<tracing_appender::non_blocking::WorkerGuard> {
    let log_format =
        std::env::var("SMARTPOOL_LOG_FORMAT").unwrap_or_else(|_| "pretty".to_string());

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("smartpool=info"))
        .context("Failed to create env filter")?;

    let (writer, guard) = tracing_appender::non_blocking(std::io::stdout());

    let fmt_layer = match log_format.as_str() {
        // Production: JSON structured logging
        "json" => fmt::layer().json().with_writer(writer).boxed(),
        // Development: Pretty formatting with colors
        _ => fmt::layer().pretty().with_writer(writer).boxed(),
    };

    let otel = telemetry::otel_layer()?;
    let otel_enabled = otel.is_some();

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .with(otel)
        .try_init()
        .context("Failed to install tracing subscriber")?;

    if otel_enabled {
        info!("OpenTelemetry export enabled");
    }
    Ok(guard)
}
