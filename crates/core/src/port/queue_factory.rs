// Queue Factory Port
// Callers that know the concrete queue kind build replacements through this,
// instead of the pool guessing a same-type queue at runtime.

use super::work_queue::WorkQueue;
use crate::domain::QueueSpec;
use crate::error::Result;
use std::sync::Arc;

/// Builds fresh, empty work queues
pub trait QueueFactory: Send + Sync {
    /// Create a queue for `spec`. Fails with `InvalidArgument` for an invalid spec.
    fn create(&self, spec: &QueueSpec) -> Result<Arc<dyn WorkQueue>>;
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use crate::port::work_queue::mocks::VecQueue;

    pub struct VecQueueFactory;

    impl QueueFactory for VecQueueFactory {
        fn create(&self, spec: &QueueSpec) -> Result<Arc<dyn WorkQueue>> {
            spec.validate()?;
            Ok(match spec.capacity() {
                Some(capacity) => Arc::new(VecQueue::bounded(capacity)),
                None => Arc::new(VecQueue::unbounded()),
            })
        }
    }
}
