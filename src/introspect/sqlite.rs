//! SQLite introspection via `sqlite_master` and the table pragmas.

use std::collections::HashSet;
use std::path::Path;

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use rusqlite::{params, Connection, OpenFlags, OptionalExtension};
use tokio::sync::Mutex;

use super::client::SqlClient;
use super::error::{IntrospectError, IntrospectResult};
use super::types::{ListResponse, LiveColumn, LiveRelation, LiveTable, LiveView};
use crate::config::Dialect;

/// Splits `varchar(255)` into `varchar` and `255`.
static TYPE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*([^(]*?)\s*(?:\((.*)\))?\s*$").expect("valid regex"));

/// A [`SqlClient`] reading a SQLite database.
pub struct SqliteClient {
    conn: Mutex<Connection>,
}

impl SqliteClient {
    /// Open a database file read-only.
    pub fn open<P: AsRef<Path>>(path: P) -> IntrospectResult<Self> {
        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;
        Ok(Self::from_connection(conn))
    }

    /// Wrap an existing connection.
    pub fn from_connection(conn: Connection) -> Self {
        Self {
            conn: Mutex::new(conn),
        }
    }

    fn names(conn: &Connection, kind: &str) -> IntrospectResult<Vec<String>> {
        let mut stmt = conn.prepare(
            "SELECT name FROM sqlite_master \
             WHERE type = ? AND name NOT LIKE 'sqlite_%' ORDER BY rowid",
        )?;
        let names = stmt
            .query_map(params![kind], |row| row.get(0))?
            .collect::<Result<Vec<String>, _>>()?;
        Ok(names)
    }

    fn columns(conn: &Connection, tn: &str) -> IntrospectResult<Vec<LiveColumn>> {
        let exists: Option<String> = conn
            .query_row(
                "SELECT type FROM sqlite_master WHERE name = ? AND type IN ('table', 'view')",
                params![tn],
                |row| row.get(0),
            )
            .optional()?;
        if exists.is_none() {
            return Err(IntrospectError::UnknownTable(tn.to_string()));
        }

        let unique = Self::unique_columns(conn, tn)?;

        let mut stmt = conn.prepare(
            "SELECT name, type, \"notnull\", dflt_value, pk FROM pragma_table_info(?) ORDER BY cid",
        )?;
        let rows = stmt
            .query_map(params![tn], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, bool>(2)?,
                    row.get::<_, Option<String>>(3)?,
                    row.get::<_, i64>(4)?,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        let pk_count = rows.iter().filter(|r| r.4 > 0).count();

        let columns = rows
            .into_iter()
            .map(|(cn, raw_type, notnull, cdf, pk)| {
                let (dt, dtxp) = split_type(&raw_type);
                let pk = pk > 0;
                LiveColumn {
                    // INTEGER PRIMARY KEY aliases the rowid
                    ai: pk && pk_count == 1 && dt == "integer",
                    un: dt.contains("unsigned"),
                    unique: unique.contains(&cn),
                    cn,
                    dt,
                    dtxp,
                    pk,
                    rqd: notnull || pk,
                    cdf,
                    uidt: None,
                }
            })
            .collect();

        Ok(columns)
    }

    /// Columns carrying a single-column unique index.
    fn unique_columns(conn: &Connection, tn: &str) -> IntrospectResult<HashSet<String>> {
        let mut stmt =
            conn.prepare("SELECT name FROM pragma_index_list(?) WHERE \"unique\" = 1")?;
        let indexes = stmt
            .query_map(params![tn], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;

        let mut unique = HashSet::new();
        for index in indexes {
            let mut stmt = conn.prepare("SELECT name FROM pragma_index_info(?)")?;
            let cols = stmt
                .query_map(params![index], |row| row.get::<_, Option<String>>(0))?
                .collect::<Result<Vec<_>, _>>()?;
            if let [Some(cn)] = cols.as_slice() {
                unique.insert(cn.clone());
            }
        }
        Ok(unique)
    }

    fn primary_key(conn: &Connection, tn: &str) -> IntrospectResult<Option<String>> {
        Ok(conn
            .query_row(
                "SELECT name FROM pragma_table_info(?) WHERE pk > 0 ORDER BY pk LIMIT 1",
                params![tn],
                |row| row.get(0),
            )
            .optional()?)
    }
}

/// Lowercased base type and its parenthesized parameters.
fn split_type(raw: &str) -> (String, Option<String>) {
    match TYPE_RE.captures(raw) {
        Some(caps) => {
            let dt = caps
                .get(1)
                .map(|m| m.as_str().to_lowercase())
                .unwrap_or_default();
            let dtxp = caps
                .get(2)
                .map(|m| m.as_str().trim().to_string())
                .filter(|s| !s.is_empty());
            (dt, dtxp)
        }
        None => (raw.trim().to_lowercase(), None),
    }
}

#[async_trait]
impl SqlClient for SqliteClient {
    fn dialect(&self) -> Dialect {
        Dialect::Sqlite
    }

    async fn table_list(&self) -> IntrospectResult<ListResponse<LiveTable>> {
        let conn = self.conn.lock().await;
        let tables = Self::names(&conn, "table")?
            .into_iter()
            .map(|tn| LiveTable { tn })
            .collect::<Vec<_>>();
        Ok(tables.into())
    }

    async fn view_list(&self) -> IntrospectResult<ListResponse<LiveView>> {
        let conn = self.conn.lock().await;
        let views = Self::names(&conn, "view")?
            .into_iter()
            .map(|view_name| LiveView { view_name })
            .collect::<Vec<_>>();
        Ok(views.into())
    }

    async fn column_list(&self, tn: &str) -> IntrospectResult<ListResponse<LiveColumn>> {
        let conn = self.conn.lock().await;
        Ok(Self::columns(&conn, tn)?.into())
    }

    async fn relation_list_all(&self) -> IntrospectResult<ListResponse<LiveRelation>> {
        let conn = self.conn.lock().await;
        let mut relations = Vec::new();

        for tn in Self::names(&conn, "table")? {
            let mut stmt = conn.prepare(
                "SELECT \"table\", \"from\", \"to\", on_update, on_delete \
                 FROM pragma_foreign_key_list(?) ORDER BY id, seq",
            )?;
            let keys = stmt
                .query_map(params![tn], |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, Option<String>>(2)?,
                        row.get::<_, Option<String>>(3)?,
                        row.get::<_, Option<String>>(4)?,
                    ))
                })?
                .collect::<Result<Vec<_>, _>>()?;

            for (rtn, cn, to, ur, dr) in keys {
                let rcn = match to {
                    Some(rcn) => rcn,
                    None => match Self::primary_key(&conn, &rtn)? {
                        Some(pk) => pk,
                        None => {
                            tracing::warn!(
                                table = %tn,
                                column = %cn,
                                parent = %rtn,
                                "foreign key target has no primary key; skipping"
                            );
                            continue;
                        }
                    },
                };
                relations.push(LiveRelation {
                    tn: tn.clone(),
                    cn,
                    rtn,
                    rcn,
                    cstn: None,
                    ur,
                    dr,
                });
            }
        }

        Ok(relations.into())
    }
}
