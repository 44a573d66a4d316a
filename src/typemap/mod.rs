//! Mapping of dialect column types to UI types and OpenAPI types.
//!
//! Mapping is two-level. Each dialect has its own table turning a raw type
//! name into an [`AbstractType`]; the abstract type then picks the
//! [`UiType`]. Every function here is total: a type name no table knows
//! maps to a plain string.
//!
//! # Example
//!
//! ```
//! use nocometa::config::Dialect;
//! use nocometa::meta::UiType;
//! use nocometa::typemap::map_ui_type;
//!
//! assert_eq!(map_ui_type(Dialect::Postgres, "int4", None), UiType::Number);
//! assert_eq!(map_ui_type(Dialect::MySql, "tinyint", Some("1")), UiType::Checkbox);
//! assert_eq!(map_ui_type(Dialect::MsSql, "no_such_type", None), UiType::SingleLineText);
//! ```

mod mssql;
mod mysql;
mod pg;
mod sqlite;
mod swagger;

pub use swagger::{SwaggerKind, SwaggerType};

use serde::Serialize;

use crate::config::Dialect;
use crate::introspect::LiveColumn;
use crate::meta::UiType;

/// Dialect-independent class of a column type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AbstractType {
    Integer,
    Float,
    Boolean,
    Date,
    DateTime,
    Time,
    Year,
    String,
    Text,
    Blob,
    Enum,
    Set,
    Json,
    Geometry,
}

impl AbstractType {
    pub fn ui_type(self) -> UiType {
        match self {
            AbstractType::Integer => UiType::Number,
            AbstractType::Float => UiType::Decimal,
            AbstractType::Boolean => UiType::Checkbox,
            AbstractType::Date => UiType::Date,
            AbstractType::DateTime => UiType::DateTime,
            AbstractType::Time => UiType::Time,
            AbstractType::Year => UiType::Year,
            AbstractType::String => UiType::SingleLineText,
            AbstractType::Text => UiType::LongText,
            AbstractType::Blob => UiType::Attachment,
            AbstractType::Enum => UiType::SingleSelect,
            AbstractType::Set => UiType::MultiSelect,
            AbstractType::Json => UiType::JSON,
            AbstractType::Geometry => UiType::Geometry,
        }
    }
}

fn normalize(dt: &str) -> String {
    dt.trim().to_lowercase()
}

/// Classify a raw column type.
pub fn map_abstract_type(dialect: Dialect, dt: &str, dtxp: Option<&str>) -> AbstractType {
    let dt = normalize(dt);
    let dtxp = dtxp.map(str::trim);
    match dialect {
        Dialect::MySql | Dialect::MySql2 => mysql::abstract_type(&dt, dtxp),
        Dialect::Postgres => pg::abstract_type(&dt, dtxp),
        Dialect::MsSql => mssql::abstract_type(&dt, dtxp),
        Dialect::Sqlite => sqlite::abstract_type(&dt, dtxp),
    }
}

/// UI type of a raw column type.
pub fn map_ui_type(dialect: Dialect, dt: &str, dtxp: Option<&str>) -> UiType {
    map_abstract_type(dialect, dt, dtxp).ui_type()
}

/// OpenAPI type of a raw column type.
pub fn map_swagger_type(dialect: Dialect, dt: &str) -> SwaggerType {
    let dt = normalize(dt);
    match dialect {
        Dialect::MySql | Dialect::MySql2 => mysql::swagger_type(&dt),
        Dialect::Postgres => pg::swagger_type(&dt),
        Dialect::MsSql => mssql::swagger_type(&dt),
        Dialect::Sqlite => sqlite::swagger_type(&dt),
    }
}

/// UI type of an introspected column. A UI type reported by the client wins.
pub fn ui_type_for_column(dialect: Dialect, column: &LiveColumn) -> UiType {
    column
        .uidt
        .unwrap_or_else(|| map_ui_type(dialect, &column.dt, column.dtxp.as_deref()))
}
