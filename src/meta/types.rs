//! Metadata records: projects, bases, models, columns and column options.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use super::UiType;
use crate::config::Dialect;

macro_rules! meta_id {
    ($name:ident, $prefix:literal) => {
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            /// Generate a fresh id.
            pub fn generate() -> Self {
                Self(format!(concat!($prefix, "_{}"), Uuid::new_v4().simple()))
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_string())
            }
        }
    };
}

meta_id!(ModelId, "md");
meta_id!(ColumnId, "cl");

/// A workspace-owned container of bases.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub id: String,
    pub title: String,
    /// Table-name prefix used when the project owns a dedicated meta database.
    pub prefix: Option<String>,
    /// Shareable identifier.
    pub uuid: Option<String>,
    pub deleted: bool,
    pub bases: Vec<Base>,
}

impl Project {
    /// Whether `key` addresses this project by id, title or shared uuid.
    pub fn matches(&self, key: &str) -> bool {
        self.id == key || self.title == key || self.uuid.as_deref() == Some(key)
    }

    /// The first base. Single-source flows only ever look at this one.
    pub fn default_base(&self) -> Option<&Base> {
        self.bases.first()
    }

    /// The non-empty prefix, if any.
    pub fn prefix(&self) -> Option<&str> {
        self.prefix.as_deref().filter(|p| !p.is_empty())
    }
}

/// One database connection within a project.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Base {
    pub id: String,
    pub project_id: String,
    pub alias: Option<String>,
    #[serde(rename = "type")]
    pub dialect: Dialect,
    /// Connection config. Stripped before the base is handed back to clients.
    pub config: Option<serde_json::Value>,
    /// The base is fully owned and managed by the platform.
    pub is_meta: bool,
    pub inflection_table: Option<String>,
    pub inflection_column: Option<String>,
}

impl Base {
    /// A copy of this base without its connection config.
    pub fn redacted(&self) -> Base {
        Base {
            config: None,
            ..self.clone()
        }
    }
}

/// Whether a model describes a table or a view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelType {
    Table,
    View,
}

impl fmt::Display for ModelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelType::Table => f.write_str("table"),
            ModelType::View => f.write_str("view"),
        }
    }
}

/// Metadata for one SQL table or view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Model {
    pub id: ModelId,
    pub project_id: String,
    pub base_id: String,
    pub table_name: String,
    pub title: String,
    #[serde(rename = "type")]
    pub model_type: ModelType,
    pub order: u32,
    /// The model is a many-to-many junction table.
    pub mm: bool,
}

/// Fields for a model insert.
#[derive(Debug, Clone, PartialEq)]
pub struct NewModel {
    pub project_id: String,
    pub base_id: String,
    pub table_name: String,
    pub title: String,
    pub model_type: ModelType,
    /// Display order; the store appends after the last model when `None`.
    pub order: Option<u32>,
}

/// Relation kind of a link column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RelationType {
    #[serde(rename = "bt")]
    BelongsTo,
    #[serde(rename = "hm")]
    HasMany,
    #[serde(rename = "mm")]
    ManyToMany,
}

impl RelationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            RelationType::BelongsTo => "bt",
            RelationType::HasMany => "hm",
            RelationType::ManyToMany => "mm",
        }
    }
}

impl fmt::Display for RelationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The junction side of a many-to-many link.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Junction {
    pub fk_mm_model_id: ModelId,
    pub fk_mm_child_column_id: ColumnId,
    pub fk_mm_parent_column_id: ColumnId,
}

/// Options of a `LinkToAnotherRecord` column.
///
/// For `bt` and `hm` the child column is the physical foreign key and the
/// parent column the referenced key. For `mm` the child column is the key of
/// the owning model, the parent column the key of the related model, and the
/// junction names the bridging columns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinkToAnotherRecord {
    #[serde(rename = "type")]
    pub relation_type: RelationType,
    pub fk_child_column_id: ColumnId,
    pub fk_parent_column_id: ColumnId,
    pub fk_related_model_id: ModelId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub junction: Option<Junction>,
    /// Name of the physical foreign key constraint.
    #[serde(default)]
    pub fk_index_name: Option<String>,
    #[serde(default)]
    pub update_rule: Option<String>,
    #[serde(default)]
    pub delete_rule: Option<String>,
    /// User-defined link with no physical constraint behind it.
    #[serde(default)]
    pub virtual_link: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RollupOptions {
    pub fk_relation_column_id: ColumnId,
    pub fk_rollup_column_id: ColumnId,
    pub rollup_function: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LookupOptions {
    pub fk_relation_column_id: ColumnId,
    pub fk_lookup_column_id: ColumnId,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormulaOptions {
    pub formula: String,
}

/// Side-table record owned by a virtual column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ColumnOptions {
    Link(LinkToAnotherRecord),
    Rollup(RollupOptions),
    Lookup(LookupOptions),
    Formula(FormulaOptions),
}

/// Metadata for one field of a model, physical or virtual.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    pub id: ColumnId,
    pub model_id: ModelId,
    /// Physical name; `None` for virtual columns.
    pub column_name: Option<String>,
    pub title: String,
    pub uidt: UiType,
    /// Introspected data type.
    pub dt: Option<String>,
    /// Introspected type parameters (length, enum values).
    pub dtxp: Option<String>,
    pub order: u32,
    pub system: bool,
    /// Display value column.
    pub pv: bool,
    pub pk: bool,
    pub ai: bool,
    pub rqd: bool,
    pub un: bool,
    pub unique: bool,
    pub cdf: Option<String>,
    pub options: Option<ColumnOptions>,
}

impl Column {
    /// Link options, when this is a relation column.
    pub fn link(&self) -> Option<&LinkToAnotherRecord> {
        match &self.options {
            Some(ColumnOptions::Link(link)) if self.uidt.is_link() => Some(link),
            _ => None,
        }
    }

    /// Link options of the given relation kind.
    pub fn link_of(&self, relation_type: RelationType) -> Option<&LinkToAnotherRecord> {
        self.link().filter(|l| l.relation_type == relation_type)
    }

    pub fn is_virtual(&self) -> bool {
        self.uidt.is_virtual()
    }

    /// The physical name, or the empty string for virtual columns.
    pub fn name(&self) -> &str {
        self.column_name.as_deref().unwrap_or("")
    }
}

/// Fields for a column insert.
#[derive(Debug, Clone, PartialEq)]
pub struct NewColumn {
    pub model_id: ModelId,
    pub column_name: Option<String>,
    pub title: String,
    pub uidt: UiType,
    pub dt: Option<String>,
    pub dtxp: Option<String>,
    /// Display order; the store appends after the last column when `None`.
    pub order: Option<u32>,
    pub system: bool,
    pub pv: bool,
    pub pk: bool,
    pub ai: bool,
    pub rqd: bool,
    pub un: bool,
    pub unique: bool,
    pub cdf: Option<String>,
    pub options: Option<ColumnOptions>,
}

impl NewColumn {
    /// A virtual relation column.
    pub fn link(model_id: ModelId, title: String, link: LinkToAnotherRecord) -> Self {
        Self {
            model_id,
            column_name: None,
            title,
            uidt: UiType::LinkToAnotherRecord,
            dt: None,
            dtxp: None,
            order: None,
            system: false,
            pv: false,
            pk: false,
            ai: false,
            rqd: false,
            un: false,
            unique: false,
            cdf: None,
            options: Some(ColumnOptions::Link(link)),
        }
    }

    pub fn with_order(mut self, order: u32) -> Self {
        self.order = Some(order);
        self
    }
}
