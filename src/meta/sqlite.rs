//! SQLite-backed metadata store.
//!
//! Persists models and columns to `~/.nocometa/meta.db` (or a configured
//! path). Column options are stored as JSON next to the column row.
//!
//! # Design
//!
//! - One row per model and per column, options as a JSON blob
//! - Uniqueness enforced by table constraints
//! - Versioned: the schema is rebuilt on version mismatch
//! - Compound deletes run in one transaction

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use rusqlite::{params, Connection, ErrorCode, OptionalExtension, Row};
use serde::de::DeserializeOwned;
use tokio::sync::Mutex;

use super::error::{StoreError, StoreResult};
use super::store::{materialize, MetaStore};
use super::types::{Column, ColumnId, ColumnOptions, Model, ModelId, NewColumn, NewModel};

/// Current store schema version. Bump this when the table layout changes.
const STORE_VERSION: i32 = 1;

const MODEL_FIELDS: &str = "id, project_id, base_id, table_name, title, type, \"order\", mm";

const COLUMN_FIELDS: &str = "id, model_id, column_name, title, uidt, dt, dtxp, \"order\", \
     system, pv, pk, ai, rqd, un, \"unique\", cdf, options";

/// A [`MetaStore`] persisted in a SQLite database.
pub struct SqliteMetaStore {
    conn: Mutex<Connection>,
}

impl SqliteMetaStore {
    /// Open or create the store at `path`.
    ///
    /// If the stored schema version doesn't match, the store is rebuilt.
    pub fn open<P: AsRef<Path>>(path: P) -> StoreResult<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(path)?;
        Self::init(conn)
    }

    /// Open an in-memory store (for testing).
    pub fn open_in_memory() -> StoreResult<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    /// Default location of the store.
    pub fn default_path() -> StoreResult<PathBuf> {
        let base = dirs::home_dir().ok_or(StoreError::NoHomeDir)?;
        Ok(base.join(".nocometa").join("meta.db"))
    }

    fn init(conn: Connection) -> StoreResult<Self> {
        conn.execute_batch(
            "
            PRAGMA foreign_keys = ON;

            CREATE TABLE IF NOT EXISTS meta (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );
            ",
        )?;

        let stored_version: Option<i32> = conn
            .query_row("SELECT value FROM meta WHERE key = 'version'", [], |row| {
                let s: String = row.get(0)?;
                Ok(s.parse().unwrap_or(0))
            })
            .optional()?;

        if matches!(stored_version, Some(v) if v != STORE_VERSION) {
            conn.execute_batch(
                "
                DROP TABLE IF EXISTS nc_columns;
                DROP TABLE IF EXISTS nc_models;
                ",
            )?;
        }

        conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS nc_models (
                id TEXT PRIMARY KEY,
                project_id TEXT NOT NULL,
                base_id TEXT NOT NULL,
                table_name TEXT NOT NULL,
                title TEXT NOT NULL,
                type TEXT NOT NULL,
                \"order\" INTEGER NOT NULL,
                mm INTEGER NOT NULL DEFAULT 0,
                UNIQUE (base_id, table_name),
                UNIQUE (base_id, title)
            );

            CREATE TABLE IF NOT EXISTS nc_columns (
                id TEXT PRIMARY KEY,
                model_id TEXT NOT NULL REFERENCES nc_models(id) ON DELETE CASCADE,
                column_name TEXT,
                title TEXT NOT NULL,
                uidt TEXT NOT NULL,
                dt TEXT,
                dtxp TEXT,
                \"order\" INTEGER NOT NULL,
                system INTEGER NOT NULL DEFAULT 0,
                pv INTEGER NOT NULL DEFAULT 0,
                pk INTEGER NOT NULL DEFAULT 0,
                ai INTEGER NOT NULL DEFAULT 0,
                rqd INTEGER NOT NULL DEFAULT 0,
                un INTEGER NOT NULL DEFAULT 0,
                \"unique\" INTEGER NOT NULL DEFAULT 0,
                cdf TEXT,
                options TEXT,
                UNIQUE (model_id, title)
            );

            CREATE INDEX IF NOT EXISTS nc_columns_model ON nc_columns (model_id);
            ",
        )?;

        conn.execute(
            "INSERT OR REPLACE INTO meta (key, value) VALUES ('version', ?)",
            params![STORE_VERSION.to_string()],
        )?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }
}

/// Model row as read from sqlite, before enum decoding.
struct ModelRow {
    id: String,
    project_id: String,
    base_id: String,
    table_name: String,
    title: String,
    model_type: String,
    order: u32,
    mm: bool,
}

impl ModelRow {
    fn read(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            project_id: row.get(1)?,
            base_id: row.get(2)?,
            table_name: row.get(3)?,
            title: row.get(4)?,
            model_type: row.get(5)?,
            order: row.get(6)?,
            mm: row.get(7)?,
        })
    }

    fn decode(self) -> StoreResult<Model> {
        Ok(Model {
            id: ModelId(self.id),
            project_id: self.project_id,
            base_id: self.base_id,
            table_name: self.table_name,
            title: self.title,
            model_type: decode_tag(self.model_type)?,
            order: self.order,
            mm: self.mm,
        })
    }
}

/// Column row as read from sqlite, before enum and options decoding.
struct ColumnRow {
    id: String,
    model_id: String,
    column_name: Option<String>,
    title: String,
    uidt: String,
    dt: Option<String>,
    dtxp: Option<String>,
    order: u32,
    flags: [bool; 7],
    cdf: Option<String>,
    options: Option<String>,
}

impl ColumnRow {
    fn read(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            model_id: row.get(1)?,
            column_name: row.get(2)?,
            title: row.get(3)?,
            uidt: row.get(4)?,
            dt: row.get(5)?,
            dtxp: row.get(6)?,
            order: row.get(7)?,
            flags: [
                row.get(8)?,
                row.get(9)?,
                row.get(10)?,
                row.get(11)?,
                row.get(12)?,
                row.get(13)?,
                row.get(14)?,
            ],
            cdf: row.get(15)?,
            options: row.get(16)?,
        })
    }

    fn decode(self) -> StoreResult<Column> {
        let [system, pv, pk, ai, rqd, un, unique] = self.flags;
        let options = match self.options {
            Some(json) => Some(serde_json::from_str::<ColumnOptions>(&json)?),
            None => None,
        };
        Ok(Column {
            id: ColumnId(self.id),
            model_id: ModelId(self.model_id),
            column_name: self.column_name,
            title: self.title,
            uidt: decode_tag(self.uidt)?,
            dt: self.dt,
            dtxp: self.dtxp,
            order: self.order,
            system,
            pv,
            pk,
            ai,
            rqd,
            un,
            unique,
            cdf: self.cdf,
            options,
        })
    }
}

/// Decode a unit enum stored under its serde name.
fn decode_tag<T: DeserializeOwned>(tag: String) -> StoreResult<T> {
    Ok(serde_json::from_value(serde_json::Value::String(tag))?)
}

/// Encode a unit enum under its serde name.
fn encode_tag<T: serde::Serialize>(value: &T) -> StoreResult<String> {
    match serde_json::to_value(value)? {
        serde_json::Value::String(s) => Ok(s),
        other => Ok(other.to_string()),
    }
}

fn encode_options(options: &Option<ColumnOptions>) -> StoreResult<Option<String>> {
    options
        .as_ref()
        .map(serde_json::to_string)
        .transpose()
        .map_err(StoreError::from)
}

/// Map a sqlite unique-constraint failure to [`StoreError::Duplicate`].
fn conflict(entity: &'static str, key: String) -> impl FnOnce(rusqlite::Error) -> StoreError {
    move |e| match &e {
        rusqlite::Error::SqliteFailure(f, _) if f.code == ErrorCode::ConstraintViolation => {
            StoreError::duplicate(entity, key)
        }
        _ => StoreError::Sqlite(e),
    }
}

fn write_column(conn: &Connection, column: &Column, replace: bool) -> StoreResult<usize> {
    let sql = if replace {
        "UPDATE nc_columns SET model_id = ?2, column_name = ?3, title = ?4, uidt = ?5, dt = ?6, \
         dtxp = ?7, \"order\" = ?8, system = ?9, pv = ?10, pk = ?11, ai = ?12, rqd = ?13, \
         un = ?14, \"unique\" = ?15, cdf = ?16, options = ?17 WHERE id = ?1"
            .to_string()
    } else {
        format!(
            "INSERT INTO nc_columns ({}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17)",
            COLUMN_FIELDS
        )
    };

    let rows = conn
        .execute(
            &sql,
            params![
                column.id.as_str(),
                column.model_id.as_str(),
                column.column_name,
                column.title,
                encode_tag(&column.uidt)?,
                column.dt,
                column.dtxp,
                column.order,
                column.system,
                column.pv,
                column.pk,
                column.ai,
                column.rqd,
                column.un,
                column.unique,
                column.cdf,
                encode_options(&column.options)?,
            ],
        )
        .map_err(conflict("column title", column.title.clone()))?;
    Ok(rows)
}

#[async_trait]
impl MetaStore for SqliteMetaStore {
    async fn insert_model(&self, model: NewModel) -> StoreResult<Model> {
        let conn = self.conn.lock().await;

        let order = match model.order {
            Some(order) => order,
            None => conn.query_row(
                "SELECT COALESCE(MAX(\"order\"), 0) + 1 FROM nc_models WHERE base_id = ?",
                params![model.base_id],
                |row| row.get(0),
            )?,
        };

        let stored = Model {
            id: ModelId::generate(),
            project_id: model.project_id,
            base_id: model.base_id,
            table_name: model.table_name,
            title: model.title,
            model_type: model.model_type,
            order,
            mm: false,
        };

        conn.execute(
            &format!(
                "INSERT INTO nc_models ({}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                MODEL_FIELDS
            ),
            params![
                stored.id.as_str(),
                stored.project_id,
                stored.base_id,
                stored.table_name,
                stored.title,
                encode_tag(&stored.model_type)?,
                stored.order,
                stored.mm,
            ],
        )
        .map_err(conflict(
            "model",
            format!("{} ({})", stored.table_name, stored.title),
        ))?;

        Ok(stored)
    }

    async fn get_model(&self, id: &ModelId) -> StoreResult<Option<Model>> {
        let conn = self.conn.lock().await;
        let row = conn
            .query_row(
                &format!("SELECT {} FROM nc_models WHERE id = ?", MODEL_FIELDS),
                params![id.as_str()],
                ModelRow::read,
            )
            .optional()?;
        row.map(ModelRow::decode).transpose()
    }

    async fn get_model_by_table(
        &self,
        base_id: &str,
        table_name: &str,
    ) -> StoreResult<Option<Model>> {
        let conn = self.conn.lock().await;
        let row = conn
            .query_row(
                &format!(
                    "SELECT {} FROM nc_models WHERE base_id = ? AND table_name = ?",
                    MODEL_FIELDS
                ),
                params![base_id, table_name],
                ModelRow::read,
            )
            .optional()?;
        row.map(ModelRow::decode).transpose()
    }

    async fn list_models(&self, base_id: &str) -> StoreResult<Vec<Model>> {
        let conn = self.conn.lock().await;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM nc_models WHERE base_id = ? ORDER BY \"order\", rowid",
            MODEL_FIELDS
        ))?;
        let rows = stmt
            .query_map(params![base_id], ModelRow::read)?
            .collect::<Result<Vec<_>, _>>()?;
        rows.into_iter().map(ModelRow::decode).collect()
    }

    async fn delete_model(&self, id: &ModelId) -> StoreResult<()> {
        let mut conn = self.conn.lock().await;
        let tx = conn.transaction()?;
        tx.execute(
            "DELETE FROM nc_columns WHERE model_id = ?",
            params![id.as_str()],
        )?;
        let rows = tx.execute("DELETE FROM nc_models WHERE id = ?", params![id.as_str()])?;
        if rows == 0 {
            return Err(StoreError::not_found("model", id.as_str()));
        }
        tx.commit()?;
        Ok(())
    }

    async fn set_mm(&self, id: &ModelId, mm: bool) -> StoreResult<()> {
        let conn = self.conn.lock().await;
        let rows = conn.execute(
            "UPDATE nc_models SET mm = ? WHERE id = ?",
            params![mm, id.as_str()],
        )?;
        if rows == 0 {
            return Err(StoreError::not_found("model", id.as_str()));
        }
        Ok(())
    }

    async fn insert_column(&self, column: NewColumn) -> StoreResult<Column> {
        let conn = self.conn.lock().await;

        let model_exists: bool = conn.query_row(
            "SELECT EXISTS (SELECT 1 FROM nc_models WHERE id = ?)",
            params![column.model_id.as_str()],
            |row| row.get(0),
        )?;
        if !model_exists {
            return Err(StoreError::not_found("model", column.model_id.as_str()));
        }

        let next_order: u32 = conn.query_row(
            "SELECT COALESCE(MAX(\"order\"), 0) + 1 FROM nc_columns WHERE model_id = ?",
            params![column.model_id.as_str()],
            |row| row.get(0),
        )?;

        let stored = materialize(column, next_order);
        write_column(&conn, &stored, false)?;
        Ok(stored)
    }

    async fn update_column(&self, column: &Column) -> StoreResult<()> {
        let conn = self.conn.lock().await;
        if write_column(&conn, column, true)? == 0 {
            return Err(StoreError::not_found("column", column.id.as_str()));
        }
        Ok(())
    }

    async fn delete_column(&self, id: &ColumnId) -> StoreResult<()> {
        let conn = self.conn.lock().await;
        let rows = conn.execute("DELETE FROM nc_columns WHERE id = ?", params![id.as_str()])?;
        if rows == 0 {
            return Err(StoreError::not_found("column", id.as_str()));
        }
        Ok(())
    }

    async fn mark_system(&self, id: &ColumnId, system: bool) -> StoreResult<()> {
        let conn = self.conn.lock().await;
        let rows = conn.execute(
            "UPDATE nc_columns SET system = ? WHERE id = ?",
            params![system, id.as_str()],
        )?;
        if rows == 0 {
            return Err(StoreError::not_found("column", id.as_str()));
        }
        Ok(())
    }

    async fn get_column(&self, id: &ColumnId) -> StoreResult<Option<Column>> {
        let conn = self.conn.lock().await;
        let row = conn
            .query_row(
                &format!("SELECT {} FROM nc_columns WHERE id = ?", COLUMN_FIELDS),
                params![id.as_str()],
                ColumnRow::read,
            )
            .optional()?;
        row.map(ColumnRow::decode).transpose()
    }

    async fn list_columns(&self, model_id: &ModelId) -> StoreResult<Vec<Column>> {
        let conn = self.conn.lock().await;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM nc_columns WHERE model_id = ? ORDER BY \"order\", rowid",
            COLUMN_FIELDS
        ))?;
        let rows = stmt
            .query_map(params![model_id.as_str()], ColumnRow::read)?
            .collect::<Result<Vec<_>, _>>()?;
        rows.into_iter().map(ColumnRow::decode).collect()
    }
}
