// Worker pool constants (no magic values)
use std::time::Duration;

/// Upper bound on how long an idle worker sleeps before re-checking the queue (50ms)
///
/// Workers are woken on submit, but a queue swap or a direct push into the
/// attached queue does not notify; this caps the latency of noticing either.
pub const IDLE_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Default keep-alive for workers above `min_workers` (60s)
pub const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(60);

/// Default bounds for a pool built without explicit values
pub const DEFAULT_MIN_WORKERS: usize = 1;
pub const DEFAULT_MAX_WORKERS: usize = 4;

/// Interval between live-worker checks while awaiting termination (10ms)
pub const TERMINATION_POLL_INTERVAL: Duration = Duration::from_millis(10);
