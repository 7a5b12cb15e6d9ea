// Port Layer - Interfaces for external collaborators

pub mod id_provider; // For deterministic testing
pub mod policy;
pub mod pool_handle;
pub mod queue_factory;
pub mod time_provider;
pub mod work_queue;

// Re-exports
pub use id_provider::IdProvider;
pub use policy::{RejectionPolicy, SubmitError, WorkerNaming};
pub use pool_handle::PoolHandle;
pub use queue_factory::QueueFactory;
pub use time_provider::TimeProvider;
pub use work_queue::{QueueSlot, QueueSlotGuard, WorkQueue};
