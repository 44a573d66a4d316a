//! JSON schema snapshots.
//!
//! A snapshot is a serialized live schema: tables and views with their
//! columns, plus the foreign keys between them. Snapshots stand in for
//! dialects that can't be introspected in-process.
//!
//! ```json
//! {
//!   "dialect": "pg",
//!   "tables": [
//!     { "tn": "author", "columns": [ { "cn": "id", "dt": "int4", "pk": true } ] }
//!   ],
//!   "views": [],
//!   "relations": [
//!     { "tn": "book", "cn": "author_id", "rtn": "author", "rcn": "id" }
//!   ]
//! }
//! ```

use std::collections::HashSet;
use std::path::Path;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::client::SqlClient;
use super::error::{IntrospectError, IntrospectResult};
use super::types::{ListResponse, LiveColumn, LiveRelation, LiveTable, LiveView};
use crate::config::Dialect;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableSnapshot {
    pub tn: String,
    #[serde(default)]
    pub columns: Vec<LiveColumn>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewSnapshot {
    pub view_name: String,
    #[serde(default)]
    pub columns: Vec<LiveColumn>,
}

/// A complete live schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub dialect: Dialect,
    #[serde(default)]
    pub tables: Vec<TableSnapshot>,
    #[serde(default)]
    pub views: Vec<ViewSnapshot>,
    #[serde(default)]
    pub relations: Vec<LiveRelation>,
}

impl Snapshot {
    pub fn new(dialect: Dialect) -> Self {
        Self {
            dialect,
            tables: Vec::new(),
            views: Vec::new(),
            relations: Vec::new(),
        }
    }

    /// Add a table.
    pub fn table(mut self, tn: impl Into<String>, columns: Vec<LiveColumn>) -> Self {
        self.tables.push(TableSnapshot {
            tn: tn.into(),
            columns,
        });
        self
    }

    /// Add a view.
    pub fn view(mut self, view_name: impl Into<String>, columns: Vec<LiveColumn>) -> Self {
        self.views.push(ViewSnapshot {
            view_name: view_name.into(),
            columns,
        });
        self
    }

    /// Add a foreign key.
    pub fn relation(mut self, relation: LiveRelation) -> Self {
        self.relations.push(relation);
        self
    }

    /// Mutable access to a table's columns.
    pub fn columns_mut(&mut self, tn: &str) -> Option<&mut Vec<LiveColumn>> {
        self.tables
            .iter_mut()
            .find(|t| t.tn == tn)
            .map(|t| &mut t.columns)
    }

    /// Check that names are unique and every relation endpoint exists.
    pub fn validate(&self) -> IntrospectResult<()> {
        let mut names = HashSet::new();
        for name in self
            .tables
            .iter()
            .map(|t| t.tn.as_str())
            .chain(self.views.iter().map(|v| v.view_name.as_str()))
        {
            if !names.insert(name) {
                return Err(IntrospectError::MalformedSnapshot(format!(
                    "duplicate table or view '{}'",
                    name
                )));
            }
        }

        for rel in &self.relations {
            for (tn, cn) in [(&rel.tn, &rel.cn), (&rel.rtn, &rel.rcn)] {
                let table = self.tables.iter().find(|t| &t.tn == tn).ok_or_else(|| {
                    IntrospectError::MalformedSnapshot(format!(
                        "relation references unknown table '{}'",
                        tn
                    ))
                })?;
                if !table.columns.iter().any(|c| &c.cn == cn) {
                    return Err(IntrospectError::MalformedSnapshot(format!(
                        "relation references unknown column '{}.{}'",
                        tn, cn
                    )));
                }
            }
        }

        Ok(())
    }
}

/// A [`SqlClient`] serving a [`Snapshot`].
#[derive(Debug, Clone)]
pub struct SnapshotClient {
    snapshot: Snapshot,
}

impl SnapshotClient {
    pub fn new(snapshot: Snapshot) -> Self {
        Self { snapshot }
    }

    /// Parse and validate a JSON snapshot.
    pub fn from_json(json: &str) -> IntrospectResult<Self> {
        let snapshot: Snapshot = serde_json::from_str(json)?;
        snapshot.validate()?;
        Ok(Self::new(snapshot))
    }

    /// Load a JSON snapshot file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> IntrospectResult<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    pub fn snapshot(&self) -> &Snapshot {
        &self.snapshot
    }
}

#[async_trait]
impl SqlClient for SnapshotClient {
    fn dialect(&self) -> Dialect {
        self.snapshot.dialect
    }

    async fn table_list(&self) -> IntrospectResult<ListResponse<LiveTable>> {
        Ok(self
            .snapshot
            .tables
            .iter()
            .map(|t| LiveTable { tn: t.tn.clone() })
            .collect::<Vec<_>>()
            .into())
    }

    async fn view_list(&self) -> IntrospectResult<ListResponse<LiveView>> {
        Ok(self
            .snapshot
            .views
            .iter()
            .map(|v| LiveView {
                view_name: v.view_name.clone(),
            })
            .collect::<Vec<_>>()
            .into())
    }

    async fn column_list(&self, tn: &str) -> IntrospectResult<ListResponse<LiveColumn>> {
        let columns = self
            .snapshot
            .tables
            .iter()
            .find(|t| t.tn == tn)
            .map(|t| &t.columns)
            .or_else(|| {
                self.snapshot
                    .views
                    .iter()
                    .find(|v| v.view_name == tn)
                    .map(|v| &v.columns)
            })
            .ok_or_else(|| IntrospectError::UnknownTable(tn.to_string()))?;
        Ok(columns.clone().into())
    }

    async fn relation_list_all(&self) -> IntrospectResult<ListResponse<LiveRelation>> {
        Ok(self.snapshot.relations.clone().into())
    }
}
