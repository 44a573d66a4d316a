//! Metadata synchronization engine.
//!
//! Keeps the stored models and columns of a base in step with the live
//! schema reported by a [`SqlClient`]:
//!
//! - [`MetaSync::populate`] imports a base for the first time
//! - [`MetaSync::compute_diff`] lists the drift between live and stored
//! - [`MetaSync::apply_diff`] reconciles that drift
//! - [`derive_m2m`] flags junction tables and adds many-to-many columns
//!
//! # Example
//!
//! ```ignore
//! use nocometa::sync::{MetaSync, SyncOptions};
//!
//! let sync = MetaSync::new(&client, &store, SyncOptions::default());
//! let report = sync.populate(&base, &project).await?;
//! let diffs = sync.compute_diff(&base, &project).await?;
//! assert!(diffs.iter().all(|d| d.detected_changes.is_empty()));
//! ```

mod apply;
mod diff;
mod display_value;
mod error;
mod m2m;
mod pending;
mod populate;
mod view_repair;

pub use apply::{sort_for_apply, ApplyReport};
pub use diff::{MetaDiff, MetaDiffChange, MetaDiffType};
pub use display_value::{assign_display_value, DisplayCandidate};
pub use error::{SyncError, SyncResult};
pub use m2m::{derive_m2m, is_bridge, BRIDGE_NORMAL_COLUMN_LIMIT};
pub use pending::{ModelArena, PendingLink};
pub use populate::PopulationReport;
pub use view_repair::{NoopViewRepair, ViewRepair};

use std::collections::BTreeSet;

use crate::introspect::{LiveColumn, SqlClient};
use crate::meta::{Base, MetaStore, ModelId, NewColumn, Project};
use crate::naming::{unique_title, NamingPolicy};
use crate::typemap::ui_type_for_column;

/// Bookkeeping tables that are never imported as models.
pub const DEFAULT_IGNORE_TABLES: &[&str] = &[
    "nc_models",
    "nc_roles",
    "nc_routes",
    "nc_loaders",
    "nc_resolvers",
    "nc_hooks",
    "nc_store",
    "_evolutions",
    "nc_evolutions",
    "xc_users",
    "nc_rpc",
    "nc_acl",
    "nc_cron",
    "nc_disabled_models_for_role",
    "nc_audit",
    "xc_knex_migrations",
    "xc_knex_migrations_lock",
    "nc_plugins",
    "nc_migrations",
    "nc_api_tokens",
    "nc_projects",
    "nc_projects_users",
    "nc_relations",
    "nc_shared_views",
];

/// Engine options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncOptions {
    /// Tables skipped by population and diff.
    pub ignore_tables: BTreeSet<String>,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            ignore_tables: DEFAULT_IGNORE_TABLES.iter().map(|t| t.to_string()).collect(),
        }
    }
}

impl SyncOptions {
    /// Replace the ignore list.
    pub fn with_ignore_tables<I>(mut self, tables: I) -> Self
    where
        I: IntoIterator<Item = String>,
    {
        self.ignore_tables = tables.into_iter().collect();
        self
    }

    pub fn is_ignored(&self, table_name: &str) -> bool {
        self.ignore_tables.contains(table_name)
    }
}

static NOOP_VIEW_REPAIR: NoopViewRepair = NoopViewRepair;

/// The sync engine over one live database and one metadata store.
pub struct MetaSync<'a> {
    client: &'a dyn SqlClient,
    store: &'a dyn MetaStore,
    view_repair: &'a dyn ViewRepair,
    options: SyncOptions,
}

impl<'a> MetaSync<'a> {
    pub fn new(client: &'a dyn SqlClient, store: &'a dyn MetaStore, options: SyncOptions) -> Self {
        Self {
            client,
            store,
            view_repair: &NOOP_VIEW_REPAIR,
            options,
        }
    }

    /// Use a view layer for grid-view repair after population.
    pub fn with_view_repair(mut self, view_repair: &'a dyn ViewRepair) -> Self {
        self.view_repair = view_repair;
        self
    }

    pub fn options(&self) -> &SyncOptions {
        &self.options
    }

    /// Whether a live table or view belongs to this base.
    ///
    /// Bookkeeping tables are skipped. When the base carries a prefix only
    /// names starting with it are kept, since several projects may share
    /// one physical schema.
    fn accepts(&self, naming: &NamingPolicy, table_name: &str) -> bool {
        if self.options.is_ignored(table_name) {
            return false;
        }
        match naming.prefix.as_deref() {
            Some(prefix) => table_name.starts_with(prefix),
            None => true,
        }
    }
}

/// Per-base state shared by population, diff and apply.
pub(crate) struct BaseScope<'b> {
    pub base: &'b Base,
    pub naming: NamingPolicy,
}

impl<'b> BaseScope<'b> {
    pub fn new(base: &'b Base, project: &Project) -> Self {
        Self {
            base,
            naming: NamingPolicy::for_base(base, project),
        }
    }
}

/// Column drafts for a freshly introspected table or view.
///
/// Titles are aliased through the base's column inflection and made unique
/// within the table. Orders start at 1.
pub(crate) fn draft_columns(
    scope: &BaseScope<'_>,
    model_id: &ModelId,
    columns: &[LiveColumn],
) -> Vec<NewColumn> {
    let mut titles: Vec<String> = Vec::with_capacity(columns.len());
    columns
        .iter()
        .enumerate()
        .map(|(i, live)| {
            let title = unique_title(
                &scope.naming.column_alias(&live.cn),
                titles.iter().map(String::as_str),
            );
            titles.push(title.clone());
            draft_column(scope, model_id, live, title).with_order(i as u32 + 1)
        })
        .collect()
}

/// One physical column draft with the given title.
pub(crate) fn draft_column(
    scope: &BaseScope<'_>,
    model_id: &ModelId,
    live: &LiveColumn,
    title: String,
) -> NewColumn {
    NewColumn {
        model_id: model_id.clone(),
        column_name: Some(live.cn.clone()),
        title,
        uidt: ui_type_for_column(scope.base.dialect, live),
        dt: Some(live.dt.clone()),
        dtxp: live.dtxp.clone(),
        order: None,
        system: false,
        pv: false,
        pk: live.pk,
        ai: live.ai,
        rqd: live.rqd,
        un: live.un,
        unique: live.unique,
        cdf: live.cdf.clone(),
        options: None,
    }
}
