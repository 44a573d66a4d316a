//! Live schema introspection.
//!
//! A [`SqlClient`] lists the tables, views, columns and foreign keys of one
//! database. Two clients ship with the crate:
//!
//! - [`SqliteClient`] reads a SQLite file through its pragmas
//! - [`SnapshotClient`] serves a JSON snapshot of any dialect

mod client;
mod error;
mod snapshot;
mod sqlite;
mod types;

pub use client::SqlClient;
pub use error::{IntrospectError, IntrospectResult};
pub use snapshot::{Snapshot, SnapshotClient, TableSnapshot, ViewSnapshot};
pub use sqlite::SqliteClient;
pub use types::{ListData, ListResponse, LiveColumn, LiveRelation, LiveTable, LiveView};

use crate::config::{Dialect, SchemaSource};

/// Open a client for a resolved schema source.
pub fn open_client(dialect: Dialect, source: &SchemaSource) -> IntrospectResult<Box<dyn SqlClient>> {
    match source {
        SchemaSource::SqliteFile(path) => {
            if dialect != Dialect::Sqlite {
                return Err(IntrospectError::UnsupportedDialect(dialect.to_string()));
            }
            Ok(Box::new(SqliteClient::open(path)?))
        }
        SchemaSource::Snapshot(path) => {
            let client = SnapshotClient::from_file(path)?;
            if client.dialect() != dialect {
                tracing::warn!(
                    configured = %dialect,
                    snapshot = %client.dialect(),
                    "snapshot dialect differs from the configured one; using the snapshot's"
                );
            }
            Ok(Box::new(client))
        }
    }
}
