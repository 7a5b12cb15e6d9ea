// Application Layer - Reconfiguration Use Cases

pub mod capacity;
pub mod migrator;
pub mod reconfigure;
pub mod registry;
pub mod snapshot;

// Re-exports
pub use capacity::{set_bounds, write_order, WriteOrder};
pub use migrator::migrate;
pub use reconfigure::{reconfigure, ReconfigureRequest};
pub use registry::{PoolKey, PoolRegistry};
pub use snapshot::{build_snapshot, PoolConfig};
