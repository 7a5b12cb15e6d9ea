//! Admin RPC - end to end over HTTP against live pools

use jsonrpsee::core::client::{ClientT, Error as ClientError};
use jsonrpsee::core::params::ObjectParams;
use jsonrpsee::http_client::{HttpClient, HttpClientBuilder};
use jsonrpsee::rpc_params;
use jsonrpsee::server::ServerHandle;
use serde_json::{json, Value};
use smartpool_api_rpc::error::code;
use smartpool_api_rpc::{RpcHandler, RpcServer, RpcServerConfig};
use smartpool_core::application::PoolRegistry;
use smartpool_core::port::id_provider::UuidProvider;
use smartpool_core::port::time_provider::SystemTimeProvider;
use smartpool_infra_runtime::{FifoQueueFactory, WorkerPool};
use std::sync::Arc;

async fn start_daemon() -> (HttpClient, ServerHandle, WorkerPool) {
    let registry = Arc::new(PoolRegistry::new(
        Arc::new(UuidProvider),
        Arc::new(SystemTimeProvider),
    ));
    let pool = WorkerPool::builder("invoices")
        .min_workers(1)
        .max_workers(2)
        .build()
        .unwrap();
    pool.start();
    registry
        .register("billing", "invoices", Arc::new(pool.clone()))
        .unwrap();

    let server = RpcServer::new(
        RpcServerConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
        },
        RpcHandler::new(registry, Arc::new(FifoQueueFactory)),
    );
    let (addr, handle) = server.start().await.unwrap();
    let client = HttpClientBuilder::default()
        .build(format!("http://{}", addr))
        .unwrap();
    (client, handle, pool)
}

fn reconfigure_params(min: usize, max: usize, queue: Option<Value>) -> ObjectParams {
    let mut params = ObjectParams::new();
    params.insert("app_name", "billing").unwrap();
    params.insert("pool_name", "invoices").unwrap();
    params.insert("min_workers", min).unwrap();
    params.insert("max_workers", max).unwrap();
    if let Some(queue) = queue {
        params.insert("queue", queue).unwrap();
    }
    params
}

fn error_code(err: ClientError) -> i32 {
    match err {
        ClientError::Call(obj) => obj.code(),
        other => panic!("expected call error, got {other}"),
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_list_and_snapshot_over_http() {
    let (client, handle, _pool) = start_daemon().await;

    let list: Value = client.request("pool.list.v1", rpc_params![]).await.unwrap();
    assert_eq!(list["pools"].as_array().unwrap().len(), 1);
    assert_eq!(list["pools"][0]["pool_name"], "invoices");

    let mut params = ObjectParams::new();
    params.insert("app_name", "billing").unwrap();
    params.insert("pool_name", "invoices").unwrap();
    let view: Value = client.request("pool.snapshot.v1", params).await.unwrap();
    assert_eq!(view["min_workers"], 1);
    assert_eq!(view["max_workers"], 2);
    assert_eq!(view["queue_kind"], "unbounded");
    assert_eq!(view["worker_naming"], "prefix");
    assert_eq!(view["rejection_policy"], "abort");

    handle.stop().unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_reconfigure_over_http() {
    let (client, handle, pool) = start_daemon().await;

    let view: Value = client
        .request(
            "pool.reconfigure.v1",
            reconfigure_params(3, 5, Some(json!({ "kind": "bounded", "capacity": 128 }))),
        )
        .await
        .unwrap();

    assert_eq!(view["min_workers"], 3);
    assert_eq!(view["max_workers"], 5);
    assert_eq!(view["queue_kind"], "bounded");
    assert_eq!(view["queue_capacity"], 128);
    assert_eq!(smartpool_core::port::PoolHandle::live_workers(&pool), 3);

    handle.stop().unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_error_codes_over_http() {
    let (client, handle, _pool) = start_daemon().await;

    let err = client
        .request::<Value, _>("pool.reconfigure.v1", reconfigure_params(5, 3, None))
        .await
        .unwrap_err();
    assert_eq!(error_code(err), code::INVALID_ARGUMENT);

    let mut params = ObjectParams::new();
    params.insert("app_name", "billing").unwrap();
    params.insert("pool_name", "missing").unwrap();
    let err = client
        .request::<Value, _>("pool.snapshot.v1", params)
        .await
        .unwrap_err();
    assert_eq!(error_code(err), code::NOT_FOUND);

    handle.stop().unwrap();
}
