// SmartPool Infrastructure - Runtime Adapters
// Implements: PoolHandle, WorkQueue, QueueFactory, WorkerNaming, RejectionPolicy

pub mod constants;
pub mod fifo_queue;
pub mod policy;
pub mod shutdown;
pub mod worker_pool;

pub use fifo_queue::{FifoQueue, FifoQueueFactory};
pub use policy::{
    rejection_policy_by_name, AbortPolicy, CallerRunsPolicy, DiscardOldestPolicy, DiscardPolicy,
    PrefixNaming, RejectionPolicyName,
};
pub use shutdown::{shutdown_channel, ShutdownSender, ShutdownToken};
pub use worker_pool::{WorkerPool, WorkerPoolBuilder};
