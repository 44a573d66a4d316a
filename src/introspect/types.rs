//! Live-schema records returned by a [`SqlClient`](super::SqlClient).
//!
//! Field names follow the short names every dialect client reports:
//! `tn` (table name), `cn` (column name), `rtn`/`rcn` (referenced table and
//! column), `dt`/`dtxp` (data type and its parameters).

use serde::{Deserialize, Serialize};

use crate::meta::UiType;

/// Uniform `{data: {list: [...]}}` envelope of every client listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListResponse<T> {
    pub data: ListData<T>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListData<T> {
    pub list: Vec<T>,
}

impl<T> ListResponse<T> {
    pub fn new(list: Vec<T>) -> Self {
        Self {
            data: ListData { list },
        }
    }

    pub fn into_list(self) -> Vec<T> {
        self.data.list
    }
}

impl<T> From<Vec<T>> for ListResponse<T> {
    fn from(list: Vec<T>) -> Self {
        Self::new(list)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiveTable {
    pub tn: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiveView {
    pub view_name: String,
}

/// One column of a live table or view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LiveColumn {
    pub cn: String,
    pub dt: String,
    #[serde(default)]
    pub dtxp: Option<String>,
    #[serde(default)]
    pub pk: bool,
    #[serde(default)]
    pub ai: bool,
    #[serde(default)]
    pub rqd: bool,
    #[serde(default)]
    pub un: bool,
    #[serde(default)]
    pub unique: bool,
    #[serde(default)]
    pub cdf: Option<String>,
    /// UI type already known to the client, if any.
    #[serde(default)]
    pub uidt: Option<UiType>,
}

impl LiveColumn {
    /// A plain nullable column of the given type.
    pub fn new(cn: impl Into<String>, dt: impl Into<String>) -> Self {
        Self {
            cn: cn.into(),
            dt: dt.into(),
            dtxp: None,
            pk: false,
            ai: false,
            rqd: false,
            un: false,
            unique: false,
            cdf: None,
            uidt: None,
        }
    }

    /// An auto-increment primary key.
    pub fn primary_key(cn: impl Into<String>, dt: impl Into<String>) -> Self {
        Self {
            pk: true,
            ai: true,
            rqd: true,
            ..Self::new(cn, dt)
        }
    }
}

/// A physical foreign key: `tn.cn` references `rtn.rcn`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiveRelation {
    /// Child table.
    pub tn: String,
    /// Child (foreign key) column.
    pub cn: String,
    /// Parent table.
    pub rtn: String,
    /// Parent (referenced) column.
    pub rcn: String,
    /// Constraint name.
    #[serde(default)]
    pub cstn: Option<String>,
    /// Update rule.
    #[serde(default)]
    pub ur: Option<String>,
    /// Delete rule.
    #[serde(default)]
    pub dr: Option<String>,
}

impl LiveRelation {
    pub fn new(
        tn: impl Into<String>,
        cn: impl Into<String>,
        rtn: impl Into<String>,
        rcn: impl Into<String>,
    ) -> Self {
        Self {
            tn: tn.into(),
            cn: cn.into(),
            rtn: rtn.into(),
            rcn: rcn.into(),
            cstn: None,
            ur: None,
            dr: None,
        }
    }

    /// Whether both relations describe the same physical key.
    pub fn same_key(&self, tn: &str, cn: &str, rtn: &str, rcn: &str) -> bool {
        self.tn == tn && self.cn == cn && self.rtn == rtn && self.rcn == rcn
    }
}
