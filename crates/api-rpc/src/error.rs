//! RPC Error Types
//!
//! Maps application errors to JSON-RPC error codes.

use jsonrpsee::types::ErrorObjectOwned;
use serde_json::json;
use smartpool_core::error::AppError;

/// RPC Error Codes
pub mod code {
    pub const INVALID_ARGUMENT: i32 = 4000;
    pub const NOT_FOUND: i32 = 4001;
    pub const CONFLICT: i32 = 4002;
    pub const CAPACITY_REJECTED: i32 = 4004;
    pub const QUEUE_INCOMPATIBLE: i32 = 4005;
    pub const INTERNAL_ERROR: i32 = 5000;
}

/// Convert AppError to JSON-RPC ErrorObject
pub fn to_rpc_error(err: AppError) -> ErrorObjectOwned {
    let message = err.to_string();
    match err {
        AppError::InvalidArgument(_) => {
            ErrorObjectOwned::owned(code::INVALID_ARGUMENT, message, None::<()>)
        }
        AppError::CapacityRejected(_) => ErrorObjectOwned::owned(
            code::CAPACITY_REJECTED,
            message,
            Some(json!({ "retryable": true })),
        ),
        AppError::QueueIncompatible { backlog, capacity } => ErrorObjectOwned::owned(
            code::QUEUE_INCOMPATIBLE,
            message,
            Some(json!({ "backlog": backlog, "capacity": capacity })),
        ),
        AppError::NotFound(_) => ErrorObjectOwned::owned(code::NOT_FOUND, message, None::<()>),
        AppError::Conflict(_) => ErrorObjectOwned::owned(code::CONFLICT, message, None::<()>),
        AppError::Submit(_) | AppError::Config(_) | AppError::Internal(_) => {
            ErrorObjectOwned::owned(code::INTERNAL_ERROR, message, None::<()>)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use smartpool_core::domain::{CapacityError, DomainError};

    #[test]
    fn test_error_codes() {
        let err = to_rpc_error(DomainError::ZeroMaxWorkers.into());
        assert_eq!(err.code(), code::INVALID_ARGUMENT);

        let err = to_rpc_error(CapacityError::ZeroMax.into());
        assert_eq!(err.code(), code::CAPACITY_REJECTED);

        let err = to_rpc_error(AppError::NotFound("pool a/b".into()));
        assert_eq!(err.code(), code::NOT_FOUND);
    }

    #[test]
    fn test_queue_incompatible_carries_sizes() {
        let err = to_rpc_error(AppError::QueueIncompatible {
            backlog: 12,
            capacity: 4,
        });
        assert_eq!(err.code(), code::QUEUE_INCOMPATIBLE);
        let data: serde_json::Value = serde_json::from_str(err.data().unwrap().get()).unwrap();
        assert_eq!(data["backlog"], 12);
        assert_eq!(data["capacity"], 4);
    }
}
