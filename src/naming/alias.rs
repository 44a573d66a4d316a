//! Display titles derived from physical names.

use super::inflection::Inflection;
use crate::meta::{Base, Project};

/// Title of a table or view.
///
/// The first occurrence of `prefix` is removed wherever it sits in the
/// name, then the inflection runs on what is left.
pub fn table_alias(name: &str, prefix: Option<&str>, inflection: &Inflection) -> String {
    let stripped = match prefix {
        Some(prefix) if !prefix.is_empty() => name.replacen(prefix, "", 1),
        _ => name.to_string(),
    };
    inflection.apply(&stripped)
}

/// Title of a column.
pub fn column_alias(name: &str, inflection: &Inflection) -> String {
    inflection.apply(name)
}

/// Naming rules resolved for one base.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NamingPolicy {
    /// Prefix stripped from table names. Only set for meta-owned bases.
    pub prefix: Option<String>,
    pub table_inflection: Inflection,
    pub column_inflection: Inflection,
}

impl NamingPolicy {
    /// Resolve the policy of `base` within `project`.
    ///
    /// An externally connected base never gets its prefix stripped: its
    /// names belong to someone else.
    pub fn for_base(base: &Base, project: &Project) -> Self {
        let prefix = if base.is_meta {
            project.prefix().map(str::to_string)
        } else {
            None
        };
        Self {
            prefix,
            table_inflection: Inflection::from_setting(base.inflection_table.as_deref()),
            column_inflection: Inflection::from_setting(base.inflection_column.as_deref()),
        }
    }

    pub fn table_alias(&self, name: &str) -> String {
        table_alias(name, self.prefix.as_deref(), &self.table_inflection)
    }

    pub fn column_alias(&self, name: &str) -> String {
        column_alias(name, &self.column_inflection)
    }
}
