// Queue Migrator - move pending tasks from the attached queue to a new one

use crate::domain::{DomainError, PendingTask};
use crate::error::{AppError, Result};
use crate::port::{QueueSlotGuard, WorkQueue};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Drain the attached queue into `target`, preserving FIFO order.
///
/// Runs under the slot's write guard, so producers cannot add to the
/// attached queue while it drains; a task is never stranded behind the
/// final empty poll. Workers that already hold the attached queue may still
/// poll it concurrently: whatever they take is executed by them and simply
/// never reaches `target`.
///
/// Does not swap the slot; the caller attaches `target` afterwards.
///
/// # Returns
/// Number of tasks moved
///
/// # Errors
/// - `InvalidArgument` if `target` is the attached queue
/// - `QueueIncompatible` if the backlog does not fit in `target`; nothing is
///   removed from the attached queue
pub fn migrate(slot: &QueueSlotGuard<'_>, target: &Arc<dyn WorkQueue>) -> Result<usize> {
    if slot.is_attached(target) {
        return Err(DomainError::QueueAlreadyAttached.into());
    }
    drain_into(slot.current().as_ref(), target.as_ref())
}

/// Fail with `QueueIncompatible` if `source`'s backlog cannot fit in `target`
pub fn ensure_fits(source: &dyn WorkQueue, target: &dyn WorkQueue) -> Result<()> {
    let backlog = source.len();
    match target.remaining_capacity() {
        Some(room) if backlog > room => Err(AppError::QueueIncompatible {
            backlog,
            capacity: room,
        }),
        _ => Ok(()),
    }
}

/// Poll `source` until empty, appending each task to `target` in poll order.
///
/// The capacity check happens before anything is removed. `target` is
/// expected to have no other producers or consumers. If it still refuses a
/// task mid-drain, every task taken so far is handed back to `source` in its
/// original order and the call fails with `QueueIncompatible`, reporting how
/// many tasks `target` accepted as its capacity.
pub fn drain_into(source: &dyn WorkQueue, target: &dyn WorkQueue) -> Result<usize> {
    ensure_fits(source, target)?;

    let backlog = source.len();
    let preexisting = target.len();
    let mut moved = 0;

    while let Some(task) = source.poll() {
        if let Err(refused) = target.offer(task) {
            error!(
                moved,
                remaining = source.len(),
                "Target queue refused a task mid-migration, rolling back"
            );
            let restored = roll_back(source, target, preexisting, refused)?;
            return Err(AppError::QueueIncompatible {
                backlog: restored,
                capacity: moved,
            });
        }
        moved += 1;
    }

    if moved < backlog {
        debug!(
            moved,
            claimed_by_workers = backlog - moved,
            "Workers claimed tasks during migration"
        );
    }
    info!(moved, "Pending tasks migrated");
    Ok(moved)
}

/// Put `source` back the way the drain found it.
///
/// Order on return: tasks already moved to `target`, then `refused`, then
/// whatever `source` still held. `source` has room for all of them since each
/// one came out of it and producers are held off by the slot guard. Tasks
/// that were in `target` before the drain stay there.
fn roll_back(
    source: &dyn WorkQueue,
    target: &dyn WorkQueue,
    preexisting: usize,
    refused: PendingTask,
) -> Result<usize> {
    let remainder: Vec<PendingTask> = std::iter::from_fn(|| source.poll()).collect();
    let mut from_target: Vec<PendingTask> = std::iter::from_fn(|| target.poll()).collect();
    let moved_back = from_target.split_off(preexisting.min(from_target.len()));

    let mut dropped = 0;
    for task in from_target {
        if target.offer(task).is_err() {
            dropped += 1;
        }
    }

    let mut restored = 0;
    for task in moved_back
        .into_iter()
        .chain(std::iter::once(refused))
        .chain(remainder)
    {
        match source.offer(task) {
            Ok(()) => restored += 1,
            Err(_) => dropped += 1,
        }
    }

    if dropped > 0 {
        error!(restored, dropped, "Queues refused tasks during rollback");
        return Err(AppError::Internal(format!(
            "migration rollback dropped {} tasks",
            dropped
        )));
    }
    warn!(restored, "Migration rolled back");
    Ok(restored)
}
