// Capacity Mutator - ordered application of new worker bounds

use crate::domain::Bounds;
use crate::error::{AppError, Result};
use crate::port::PoolHandle;
use tracing::{debug, info, warn};

/// Which half of the bounds pair is written first
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOrder {
    /// New max is at or above the current min: widen max, then move min
    MaxFirst,
    /// New max drops below the current min: lower min, then max
    MinFirst,
}

/// Pick the order in which no intermediate state has `min > max`.
///
/// With `target.max >= current.min`, writing max first leaves
/// `(current.min, target.max)`, which is valid; then min moves to
/// `target.min <= target.max`. Otherwise `target.min <= target.max <
/// current.min <= current.max`, so lowering min first is valid and max
/// follows.
pub fn write_order(current: Bounds, target: Bounds) -> WriteOrder {
    if target.max() >= current.min() {
        WriteOrder::MaxFirst
    } else {
        WriteOrder::MinFirst
    }
}

/// Apply new min/max worker counts to a live pool.
///
/// # Errors
/// - `InvalidArgument` if `min_workers > max_workers` or `max_workers == 0`;
///   the pool is untouched
/// - `CapacityRejected` if the pool refuses a write (typically a concurrent
///   reconfiguration). No rollback: the pool keeps whatever the last
///   successful write produced.
pub fn set_bounds(pool: &dyn PoolHandle, min_workers: usize, max_workers: usize) -> Result<()> {
    let target = Bounds::new(min_workers, max_workers)?;
    apply(pool, target)
}

pub(crate) fn apply(pool: &dyn PoolHandle, target: Bounds) -> Result<()> {
    let current = pool.bounds();
    let order = write_order(current, target);

    debug!(
        current_min = current.min(),
        current_max = current.max(),
        target_min = target.min(),
        target_max = target.max(),
        order = ?order,
        "Applying worker bounds"
    );

    let first = match order {
        WriteOrder::MaxFirst => pool.set_max_workers(target.max()),
        WriteOrder::MinFirst => pool.set_min_workers(target.min()),
    };
    first?;

    let second = match order {
        WriteOrder::MaxFirst => pool.set_min_workers(target.min()),
        WriteOrder::MinFirst => pool.set_max_workers(target.max()),
    };
    if let Err(e) = second {
        let reached = pool.bounds();
        warn!(
            error = %e,
            min = reached.min(),
            max = reached.max(),
            "Bounds partially applied"
        );
        return Err(AppError::CapacityRejected(e));
    }

    info!(
        min_workers = target.min(),
        max_workers = target.max(),
        "Worker bounds applied"
    );
    Ok(())
}
