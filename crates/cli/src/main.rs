//! SmartPool CLI - inspect and reconfigure live worker pools

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tabled::{Table, Tabled};

const DEFAULT_RPC_URL: &str = "http://127.0.0.1:9640";

#[derive(Parser)]
#[command(name = "smartpool")]
#[command(about = "SmartPool worker pool admin CLI", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// RPC server URL
    #[arg(long, env = "SMARTPOOL_RPC_URL", default_value = DEFAULT_RPC_URL)]
    rpc_url: String,
}

#[derive(Subcommand)]
enum Commands {
    /// List every pool the daemon hosts
    List,

    /// Show one pool's configuration
    Show {
        /// Owning application
        app: String,

        /// Pool name
        pool: String,
    },

    /// Change a pool's worker bounds, optionally replacing its queue
    Resize {
        /// Owning application
        app: String,

        /// Pool name
        pool: String,

        /// New minimum worker count
        #[arg(long)]
        min: usize,

        /// New maximum worker count
        #[arg(long)]
        max: usize,

        /// Replace the queue with a bounded one of this capacity
        #[arg(long, conflicts_with = "unbounded")]
        capacity: Option<usize>,

        /// Replace the queue with an unbounded one
        #[arg(long)]
        unbounded: bool,

        /// New keep-alive for workers above the minimum
        #[arg(long)]
        idle_timeout_ms: Option<u64>,
    },
}

#[derive(Serialize)]
struct JsonRpcRequest {
    jsonrpc: String,
    method: String,
    params: serde_json::Value,
    id: u64,
}

#[derive(Deserialize)]
struct JsonRpcResponse {
    #[allow(dead_code)]
    jsonrpc: String,
    #[allow(dead_code)]
    id: u64,
    result: Option<serde_json::Value>,
    error: Option<JsonRpcError>,
}

#[derive(Deserialize)]
struct JsonRpcError {
    code: i32,
    message: String,
}

/// Wire shape of a pool view (subset shown in tables)
#[derive(Deserialize)]
struct PoolView {
    app_name: String,
    pool_name: String,
    min_workers: usize,
    max_workers: usize,
    live_workers: usize,
    idle_timeout_ms: u64,
    queue_kind: String,
    queue_capacity: Option<usize>,
    queue_backlog: usize,
    rejection_policy: String,
}

#[derive(Tabled)]
struct PoolRow {
    app: String,
    pool: String,
    workers: String,
    live: usize,
    idle_ms: u64,
    queue: String,
    backlog: usize,
    rejection: String,
}

impl From<PoolView> for PoolRow {
    fn from(view: PoolView) -> Self {
        let queue = match view.queue_capacity {
            Some(cap) => format!("{} ({})", view.queue_kind, cap),
            None => view.queue_kind,
        };
        Self {
            app: view.app_name,
            pool: view.pool_name,
            workers: format!("{}..{}", view.min_workers, view.max_workers),
            live: view.live_workers,
            idle_ms: view.idle_timeout_ms,
            queue,
            backlog: view.queue_backlog,
            rejection: view.rejection_policy,
        }
    }
}

/// pool.reconfigure.v1 params
fn resize_params(
    app: &str,
    pool: &str,
    min: usize,
    max: usize,
    capacity: Option<usize>,
    unbounded: bool,
    idle_timeout_ms: Option<u64>,
) -> serde_json::Value {
    let mut params = json!({
        "app_name": app,
        "pool_name": pool,
        "min_workers": min,
        "max_workers": max,
    });
    if let Some(capacity) = capacity {
        params["queue"] = json!({ "kind": "bounded", "capacity": capacity });
    } else if unbounded {
        params["queue"] = json!({ "kind": "unbounded" });
    }
    if let Some(ms) = idle_timeout_ms {
        params["idle_timeout_ms"] = json!(ms);
    }
    params
}

async fn call_rpc(url: &str, method: &str, params: serde_json::Value) -> Result<serde_json::Value> {
    let request = JsonRpcRequest {
        jsonrpc: "2.0".to_string(),
        method: method.to_string(),
        params,
        id: 1,
    };

    let client = reqwest::Client::new();
    let response: JsonRpcResponse = client
        .post(url)
        .json(&request)
        .send()
        .await
        .context("Failed to connect to daemon")?
        .json()
        .await
        .context("Failed to parse response")?;

    if let Some(error) = response.error {
        anyhow::bail!("RPC error ({}): {}", error.code, error.message);
    }

    response
        .result
        .ok_or_else(|| anyhow::anyhow!("No result in response"))
}

fn print_pools(views: Vec<PoolView>) {
    let rows: Vec<PoolRow> = views.into_iter().map(PoolRow::from).collect();
    println!("{}", Table::new(rows));
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::List => {
            let result = call_rpc(&cli.rpc_url, "pool.list.v1", json!({})).await?;
            let views: Vec<PoolView> = serde_json::from_value(result["pools"].clone())
                .context("Unexpected pool list shape")?;

            if views.is_empty() {
                println!("{}", "No pools registered".yellow());
            } else {
                print_pools(views);
            }
        }

        Commands::Show { app, pool } => {
            let params = json!({ "app_name": app, "pool_name": pool });
            let result = call_rpc(&cli.rpc_url, "pool.snapshot.v1", params).await?;
            let view: PoolView = serde_json::from_value(result)?;
            print_pools(vec![view]);
        }

        Commands::Resize {
            app,
            pool,
            min,
            max,
            capacity,
            unbounded,
            idle_timeout_ms,
        } => {
            let params = resize_params(&app, &pool, min, max, capacity, unbounded, idle_timeout_ms);

            match call_rpc(&cli.rpc_url, "pool.reconfigure.v1", params).await {
                Ok(result) => {
                    let view: PoolView = serde_json::from_value(result)?;
                    println!(
                        "{}",
                        format!("✓ Pool {}/{} reconfigured", app, pool).green().bold()
                    );
                    println!();
                    print_pools(vec![view]);
                }
                Err(e) => {
                    println!("  {} Reconfiguration failed: {}", "✗".red(), e);
                    println!(
                        "  {} run `smartpool show {} {}` to see the resulting state",
                        "•".bold(),
                        app,
                        pool
                    );
                    std::process::exit(1);
                }
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resize_params_bounds_only() {
        let params = resize_params("billing", "invoices", 2, 8, None, false, None);
        assert_eq!(params["min_workers"], 2);
        assert_eq!(params["max_workers"], 8);
        assert!(params.get("queue").is_none());
        assert!(params.get("idle_timeout_ms").is_none());
    }

    #[test]
    fn test_resize_params_with_queue() {
        let params = resize_params("a", "p", 1, 1, Some(64), false, Some(500));
        assert_eq!(params["queue"], json!({ "kind": "bounded", "capacity": 64 }));
        assert_eq!(params["idle_timeout_ms"], 500);

        let params = resize_params("a", "p", 1, 1, None, true, None);
        assert_eq!(params["queue"]["kind"], "unbounded");
    }

    #[test]
    fn test_row_formats_queue() {
        let view: PoolView = serde_json::from_value(json!({
            "app_name": "a", "pool_name": "p",
            "min_workers": 1, "max_workers": 4, "live_workers": 2,
            "idle_timeout_ms": 60000,
            "queue_kind": "bounded", "queue_capacity": 16, "queue_backlog": 3,
            "worker_naming": "prefix", "rejection_policy": "abort",
            "captured_at_ms": 0
        }))
        .unwrap();

        let row = PoolRow::from(view);
        assert_eq!(row.workers, "1..4");
        assert_eq!(row.queue, "bounded (16)");
    }

    #[test]
    fn test_cli_parses_resize() {
        let cli = Cli::parse_from([
            "smartpool", "resize", "billing", "invoices", "--min", "2", "--max", "6",
            "--capacity", "128",
        ]);
        match cli.command {
            Commands::Resize { min, max, capacity, unbounded, .. } => {
                assert_eq!((min, max, capacity, unbounded), (2, 6, Some(128), false));
            }
            _ => panic!("expected resize"),
        }
    }
}
