//! Error types returned by the production engine.
//!
//! Invariant violations (`Conflict`, `InvalidState`, `Cycle`) are detected
//! before any write. `Store` wraps adapter failures, which abort a cascade at
//! the step that failed.

use thiserror::Error;
use uuid::Uuid;

use crate::store::StoreError;

#[derive(Debug, Error)]
pub enum ProductionError {
    /// Operator already timing elsewhere, or completing an operation with an open timer
    #[error("Conflict on operation '{operation_name}' ({operation_id}): {reason}")]
    Conflict {
        operation_id: Uuid,
        operation_name: String,
        reason: String,
    },

    #[error("Invalid state for {entity} {id}: {reason}")]
    InvalidState {
        entity: &'static str,
        id: Uuid,
        reason: String,
    },

    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: Uuid },

    #[error("Assembly cycle involving part {part_id}: {reason}")]
    Cycle { part_id: Uuid, reason: String },

    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

pub type Result<T> = std::result::Result<T, ProductionError>;

impl ProductionError {
    /// Stable kind name for callers mapping errors onto their own transport
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Conflict { .. } => "conflict",
            Self::InvalidState { .. } => "invalid_state",
            Self::NotFound { .. } => "not_found",
            Self::Cycle { .. } => "cycle",
            Self::Store(_) => "store",
        }
    }
}

/// Helper function to create a conflict error
pub fn conflict(operation_id: Uuid, operation_name: impl Into<String>, reason: impl Into<String>) -> ProductionError {
    ProductionError::Conflict {
        operation_id,
        operation_name: operation_name.into(),
        reason: reason.into(),
    }
}

/// Helper function to create an invalid state error
pub fn invalid_state(entity: &'static str, id: Uuid, reason: impl Into<String>) -> ProductionError {
    ProductionError::InvalidState {
        entity,
        id,
        reason: reason.into(),
    }
}

/// Helper function to create a not found error
pub fn not_found(entity: &'static str, id: Uuid) -> ProductionError {
    ProductionError::NotFound { entity, id }
}

/// Helper function to create a cycle error
pub fn cycle(part_id: Uuid, reason: impl Into<String>) -> ProductionError {
    ProductionError::Cycle {
        part_id,
        reason: reason.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conflict_message_names_operation() {
        let op = Uuid::new_v4();
        let err = conflict(op, "Deburr", "operator already has an open timer");
        let message = err.to_string();
        assert!(message.contains("Deburr"));
        assert!(message.contains(&op.to_string()));
        assert_eq!(err.kind(), "conflict");
    }

    #[test]
    fn test_store_error_chain() {
        let err: ProductionError = StoreError::Unavailable("connection refused".to_string()).into();
        assert_eq!(err.kind(), "store");
        assert!(err.to_string().contains("connection refused"));
    }

    #[test]
    fn test_not_found_message() {
        let id = Uuid::nil();
        assert_eq!(
            not_found("part", id).to_string(),
            format!("part {id} not found")
        );
    }
}
