// Pending Task - an opaque unit of queued work

use std::fmt;

/// A zero-argument job waiting in a work queue.
///
/// Tasks carry no identity; their only ordering is their queue position.
pub struct PendingTask {
    job: Box<dyn FnOnce() + Send + 'static>,
}

impl PendingTask {
    pub fn new<F>(job: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        Self { job: Box::new(job) }
    }

    /// Consume and execute the task on the current thread
    pub fn run(self) {
        (self.job)()
    }
}

impl fmt::Debug for PendingTask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PendingTask").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn test_run_executes_once() {
        let counter = Arc::new(AtomicUsize::new(0));
        let c = Arc::clone(&counter);

        let task = PendingTask::new(move || {
            c.fetch_add(1, Ordering::SeqCst);
        });
        task.run();

        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }
}
