//! Introspection error types.

use thiserror::Error;

/// Result type for introspection calls.
pub type IntrospectResult<T> = Result<T, IntrospectError>;

/// Errors raised while reading a live schema.
///
/// Every introspection failure aborts the running population or diff.
#[derive(Error, Debug)]
pub enum IntrospectError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("No introspector for dialect {0}")]
    UnsupportedDialect(String),

    #[error("Malformed schema snapshot: {0}")]
    MalformedSnapshot(String),

    #[error("Unknown table or view: {0}")]
    UnknownTable(String),
}
