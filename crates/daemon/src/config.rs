//! Daemon configuration
//!
//! `~/.smartpool/pools.toml` (or `$SMARTPOOL_CONFIG`), layered with
//! `SMARTPOOL__*` environment overrides, e.g. `SMARTPOOL__RPC__PORT=9700`.
//!
//! ```toml
//! app_name = "billing"
//!
//! [rpc]
//! host = "127.0.0.1"
//! port = 9640
//!
//! [[pools]]
//! name = "invoices"
//! min_workers = 2
//! max_workers = 8
//! idle_timeout_ms = 30000
//! rejection = "caller_runs"
//! queue = { kind = "bounded", capacity = 512 }
//! ```

use anyhow::{bail, Context, Result};
use config::{Config, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use smartpool_api_rpc::RpcServerConfig;
use smartpool_core::domain::{Bounds, QueueSpec};
use smartpool_infra_runtime::RejectionPolicyName;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_CONFIG_PATH: &str = "~/.smartpool/pools.toml";
pub const CONFIG_PATH_ENV: &str = "SMARTPOOL_CONFIG";
const ENV_PREFIX: &str = "SMARTPOOL";
const ENV_SEPARATOR: &str = "__";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DaemonConfig {
    /// Owning application label for every hosted pool
    pub app_name: String,
    pub rpc: RpcServerConfig,
    pub pools: Vec<PoolSettings>,
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            app_name: "smartpool".to_string(),
            rpc: RpcServerConfig::default(),
            pools: vec![PoolSettings::default()],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PoolSettings {
    pub name: String,
    pub min_workers: usize,
    pub max_workers: usize,
    pub idle_timeout_ms: u64,
    pub queue: QueueSpec,
    pub rejection: RejectionPolicyName,
}

impl Default for PoolSettings {
    fn default() -> Self {
        Self {
            name: "default".to_string(),
            min_workers: 1,
            max_workers: 4,
            idle_timeout_ms: 60_000,
            queue: QueueSpec::Unbounded,
            rejection: RejectionPolicyName::Abort,
        }
    }
}

impl PoolSettings {
    pub fn idle_timeout(&self) -> Duration {
        Duration::from_millis(self.idle_timeout_ms)
    }
}

impl DaemonConfig {
    /// Load from `path`; a missing file yields defaults
    pub fn load(path: &Path) -> Result<Self> {
        let config: DaemonConfig = Config::builder()
            .add_source(File::from(path).format(FileFormat::Toml).required(false))
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator(ENV_SEPARATOR)
                    .separator(ENV_SEPARATOR)
                    .try_parsing(true),
            )
            .build()
            .with_context(|| format!("Failed to read config {}", path.display()))?
            .try_deserialize()
            .with_context(|| format!("Invalid config {}", path.display()))?;

        config.validate()?;
        Ok(config)
    }

    /// Reject settings that would fail at pool construction
    pub fn validate(&self) -> Result<()> {
        if self.app_name.trim().is_empty() {
            bail!("app_name must not be blank");
        }

        let mut seen = HashSet::new();
        for pool in &self.pools {
            if pool.name.trim().is_empty() {
                bail!("pool name must not be blank");
            }
            if !seen.insert(pool.name.as_str()) {
                bail!("duplicate pool name '{}'", pool.name);
            }
            Bounds::new(pool.min_workers, pool.max_workers)
                .with_context(|| format!("pool '{}'", pool.name))?;
            pool.queue
                .validate()
                .with_context(|| format!("pool '{}'", pool.name))?;
        }
        Ok(())
    }
}

/// `$SMARTPOOL_CONFIG` or the default path, tilde-expanded
pub fn config_path() -> PathBuf {
    let raw = std::env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
    PathBuf::from(shellexpand::tilde(&raw).into_owned())
}
