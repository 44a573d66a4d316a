//! Sync engine error types.

use thiserror::Error;

use crate::introspect::IntrospectError;
use crate::meta::StoreError;

/// Result type for sync operations.
pub type SyncResult<T> = Result<T, SyncError>;

/// Errors raised by population, diff and apply.
#[derive(Error, Debug)]
pub enum SyncError {
    /// The live schema could not be read.
    #[error("Introspection failed: {0}")]
    Introspect(#[from] IntrospectError),

    #[error("Metadata store error: {0}")]
    Store(#[from] StoreError),

    #[error("No model for table '{0}'")]
    MissingModel(String),

    #[error("No column '{column}' in '{table}'")]
    MissingColumn { table: String, column: String },

    #[error("View repair failed: {0}")]
    ViewRepair(String),
}

impl SyncError {
    pub fn missing_column(table: impl Into<String>, column: impl Into<String>) -> Self {
        Self::MissingColumn {
            table: table.into(),
            column: column.into(),
        }
    }

    /// Check if this error must abort the whole operation.
    ///
    /// Introspection failures are fatal. Everything else concerns a single
    /// item and is logged and skipped by the batch loops.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Introspect(_))
    }

    /// Check if this error is a uniqueness violation in the store.
    pub fn is_duplicate(&self) -> bool {
        matches!(self, Self::Store(e) if e.is_duplicate())
    }
}
