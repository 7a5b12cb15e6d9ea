// Central Error Type for the Application

use crate::domain::{CapacityError, DomainError};
use crate::port::SubmitError;
use thiserror::Error;

/// Application-level error type
///
/// The first three variants are the reconfiguration taxonomy:
/// - `InvalidArgument`: malformed request, never retried
/// - `CapacityRejected`: the pool refused a bounds write, retry after re-reading state
/// - `QueueIncompatible`: the target queue cannot hold the backlog
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(#[from] DomainError),

    #[error("Capacity rejected: {0}")]
    CapacityRejected(#[from] CapacityError),

    #[error("Queue incompatible: backlog of {backlog} tasks exceeds target capacity {capacity}")]
    QueueIncompatible { backlog: usize, capacity: usize },

    #[error("Submit error: {0}")]
    Submit(#[from] SubmitError),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias using AppError
pub type Result<T> = std::result::Result<T, AppError>;

impl AppError {
    /// Whether retrying the same request after re-reading pool state can succeed
    pub fn is_retryable(&self) -> bool {
        matches!(self, AppError::CapacityRejected(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_domain_error_maps_to_invalid_argument() {
        let err: AppError = DomainError::MinExceedsMax { min: 5, max: 3 }.into();
        assert!(matches!(err, AppError::InvalidArgument(_)));
        assert!(err.to_string().contains("min_workers (5)"));
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_capacity_error_is_retryable() {
        let err: AppError = CapacityError::MaxBelowMin { max: 1, min: 4 }.into();
        assert!(matches!(err, AppError::CapacityRejected(_)));
        assert!(err.is_retryable());
    }
}
