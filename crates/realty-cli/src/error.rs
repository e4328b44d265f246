//! CLI error type.

use realty_core::{CollectionKind, SecurityError};
use thiserror::Error;

/// Errors reported to the user by the CLI.
#[derive(Debug, Error)]
pub enum CliError {
    /// Refused, missing, or failed repository operation.
    #[error(transparent)]
    Security(#[from] SecurityError),

    /// Store could not be opened.
    #[error("storage error: {0}")]
    Storage(#[from] realty_core::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// Record missing or not visible to the caller.
    #[error("{collection} '{id}' not found")]
    NotFound {
        collection: CollectionKind,
        id: String,
    },

    /// Command needs `--uid`.
    #[error("this command requires --uid (or REALTY_UID)")]
    MissingUid,
}

impl CliError {
    /// Process exit code: 2 for refusals, 1 for everything else.
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Security(err) if err.is_denial() => 2,
            _ => 1,
        }
    }
}
