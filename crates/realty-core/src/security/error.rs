//! Security-specific error types.

use crate::model::CollectionKind;
use thiserror::Error;

/// Errors surfaced by guarded operations.
///
/// The policy evaluator itself never produces these; they are how the
/// repository reports a denied or impossible write to its caller.
#[derive(Debug, Error)]
pub enum SecurityError {
    /// Permission denied for the requested operation.
    #[error("permission denied: {0}")]
    PermissionDenied(String),

    /// Caller tried to modify or delete their own account record.
    #[error("account '{0}' cannot be modified by its own login")]
    SelfModification(String),

    /// Record does not exist or is not visible to the caller.
    #[error("{collection} '{id}' not found")]
    NotFound {
        /// Collection searched.
        collection: CollectionKind,
        /// Requested record id.
        id: String,
    },

    /// Record already exists.
    #[error("{collection} '{id}' already exists")]
    AlreadyExists {
        /// Collection written to.
        collection: CollectionKind,
        /// Conflicting record id.
        id: String,
    },

    /// Record changed or vanished between the access check and the write.
    #[error("{collection} '{id}' was modified concurrently")]
    Conflict {
        /// Collection written to.
        collection: CollectionKind,
        /// Contested record id.
        id: String,
    },

    /// Caller identity is incomplete for the requested operation.
    #[error("invalid identity: {0}")]
    InvalidIdentity(String),

    /// Storage error during a guarded operation.
    #[error("storage error: {0}")]
    Storage(#[from] crate::error::Error),
}

impl SecurityError {
    /// Whether this error is a policy denial rather than a failure.
    pub fn is_denial(&self) -> bool {
        matches!(
            self,
            SecurityError::PermissionDenied(_) | SecurityError::SelfModification(_)
        )
    }
}

/// Result type for security operations.
pub type SecurityResult<T> = Result<T, SecurityError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = SecurityError::NotFound {
            collection: CollectionKind::Payment,
            id: "pay-1".to_string(),
        };
        assert_eq!(err.to_string(), "payment 'pay-1' not found");

        let err = SecurityError::SelfModification("u1".to_string());
        assert!(err.to_string().contains("u1"));
        assert!(err.is_denial());
    }

    #[test]
    fn test_storage_is_not_denial() {
        let err: SecurityError = crate::error::Error::Serialization("bad".into()).into();
        assert!(!err.is_denial());
    }
}
