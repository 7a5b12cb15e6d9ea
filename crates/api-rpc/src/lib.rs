//! JSON-RPC API Layer
//!
//! Admin surface for SmartPool: list pools, read a pool's configuration,
//! reconfigure a live pool. JSON-RPC 2.0 over localhost TCP.

pub mod error;
pub mod handler;
pub mod server;
pub mod types;

pub use handler::RpcHandler;
pub use server::{RpcServer, RpcServerConfig};
