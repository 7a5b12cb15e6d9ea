// Domain Error Types

use thiserror::Error;

/// Malformed caller input
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("min_workers ({min}) cannot be greater than max_workers ({max})")]
    MinExceedsMax { min: usize, max: usize },

    #[error("max_workers must be at least 1")]
    ZeroMaxWorkers,

    #[error("Worker count {0} exceeds the supported limit")]
    WorkerCountTooLarge(usize),

    #[error("Missing required parameter: {0}")]
    MissingParameter(&'static str),

    #[error("Target queue is already attached to this pool")]
    QueueAlreadyAttached,

    #[error("Validation error: {0}")]
    ValidationError(String),
}

/// A bounds write refused by the live pool
///
/// The primitive refuses any write whose result would have `min > max`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CapacityError {
    #[error("max_workers {max} is below current min_workers {min}")]
    MaxBelowMin { max: usize, min: usize },

    #[error("min_workers {min} is above current max_workers {max}")]
    MinAboveMax { min: usize, max: usize },

    #[error("max_workers must be positive")]
    ZeroMax,

    #[error("Worker count {0} is out of range")]
    OutOfRange(usize),

    #[error("Pool {0} is shut down")]
    Shutdown(String),
}

pub type Result<T> = std::result::Result<T, DomainError>;
