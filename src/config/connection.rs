//! Database dialects and connection descriptors.
//!
//! A base's dialect decides which type table the mapper consults and which
//! introspector can be opened for it.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Error type for connection configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConnectionError {
    #[error("Unsupported dialect: {0}. Supported: mysql, mysql2, pg, mssql, sqlite3")]
    UnsupportedDialect(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Supported SQL dialects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Dialect {
    /// MySQL (`mysql` driver)
    #[serde(rename = "mysql")]
    MySql,
    /// MySQL/MariaDB (`mysql2` driver). Shares the MySQL type table.
    #[serde(rename = "mysql2")]
    MySql2,
    /// PostgreSQL
    #[serde(rename = "pg")]
    Postgres,
    /// Microsoft SQL Server
    #[serde(rename = "mssql")]
    MsSql,
    /// SQLite 3
    #[serde(rename = "sqlite3")]
    Sqlite,
}

impl Dialect {
    /// Parse dialect from string.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Result<Self, ConnectionError> {
        match s.to_lowercase().as_str() {
            "mysql" => Ok(Dialect::MySql),
            "mysql2" | "mariadb" => Ok(Dialect::MySql2),
            "pg" | "postgres" | "postgresql" => Ok(Dialect::Postgres),
            "mssql" | "sqlserver" | "sql_server" => Ok(Dialect::MsSql),
            "sqlite3" | "sqlite" => Ok(Dialect::Sqlite),
            other => Err(ConnectionError::UnsupportedDialect(other.to_string())),
        }
    }

    /// Client name as stored on a base.
    pub fn as_str(&self) -> &'static str {
        match self {
            Dialect::MySql => "mysql",
            Dialect::MySql2 => "mysql2",
            Dialect::Postgres => "pg",
            Dialect::MsSql => "mssql",
            Dialect::Sqlite => "sqlite3",
        }
    }

    /// MySQL and MariaDB share one type table.
    pub fn is_mysql(&self) -> bool {
        matches!(self, Dialect::MySql | Dialect::MySql2)
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where the live schema of a base comes from.
#[derive(Debug, Clone, PartialEq)]
pub enum SchemaSource {
    /// A SQLite database file.
    SqliteFile(String),
    /// A JSON schema snapshot (see `introspect::SnapshotClient`).
    Snapshot(String),
}

impl SchemaSource {
    /// Build a source from a dialect and a resolved connection string.
    ///
    /// Only sqlite files can be introspected directly; every other dialect is
    /// read from a snapshot file exported by an external introspector.
    pub fn resolve(dialect: Dialect, connection_string: &str) -> Result<Self, ConnectionError> {
        if connection_string.trim().is_empty() {
            return Err(ConnectionError::InvalidConfig(
                "connection string is empty".to_string(),
            ));
        }

        if connection_string.ends_with(".json") {
            return Ok(SchemaSource::Snapshot(connection_string.to_string()));
        }

        match dialect {
            Dialect::Sqlite => Ok(SchemaSource::SqliteFile(
                connection_string
                    .strip_prefix("sqlite://")
                    .unwrap_or(connection_string)
                    .to_string(),
            )),
            other => Err(ConnectionError::InvalidConfig(format!(
                "{} connections must point at a .json schema snapshot",
                other
            ))),
        }
    }
}
