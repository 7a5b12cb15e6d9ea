// Queue Domain Model

use super::error::{DomainError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Capacity policy of a work queue
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueueKind {
    Bounded,
    Unbounded,
}

impl fmt::Display for QueueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueueKind::Bounded => f.write_str("bounded"),
            QueueKind::Unbounded => f.write_str("unbounded"),
        }
    }
}

/// Description of a queue to construct (config files, admin requests)
///
/// ```text
/// { "kind": "bounded", "capacity": 256 }
/// { "kind": "unbounded" }
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum QueueSpec {
    Bounded { capacity: usize },
    #[default]
    Unbounded,
}

impl QueueSpec {
    pub fn kind(&self) -> QueueKind {
        match self {
            QueueSpec::Bounded { .. } => QueueKind::Bounded,
            QueueSpec::Unbounded => QueueKind::Unbounded,
        }
    }

    pub fn capacity(&self) -> Option<usize> {
        match self {
            QueueSpec::Bounded { capacity } => Some(*capacity),
            QueueSpec::Unbounded => None,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if let QueueSpec::Bounded { capacity: 0 } = self {
            return Err(DomainError::ValidationError(
                "bounded queue capacity must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
