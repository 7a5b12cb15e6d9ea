// Domain Layer - Pure values and invariants

pub mod bounds;
pub mod error;
pub mod pool_view;
pub mod queue;
pub mod task;

// Re-exports
pub use bounds::{AtomicBounds, Bounds, MAX_WORKER_LIMIT};
pub use error::{CapacityError, DomainError};
pub use pool_view::PoolConfigView;
pub use queue::{QueueKind, QueueSpec};
pub use task::PendingTask;
