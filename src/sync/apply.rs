//! Reconciling stored metadata with a computed diff.

use std::cmp::Reverse;

use serde::Serialize;
use tracing::{info, warn};

use super::diff::{MetaDiff, MetaDiffChange};
use super::error::{SyncError, SyncResult};
use super::m2m::derive_m2m;
use super::pending::{ModelArena, PendingLink};
use super::{draft_column, BaseScope, MetaSync};
use crate::introspect::LiveColumn;
use crate::meta::{Base, Column, ModelId, ModelType, Project, UiType};
use crate::naming::unique_title;
use crate::typemap::ui_type_for_column;

/// Outcome of an apply run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ApplyReport {
    /// Changes applied, relation columns included.
    pub applied: usize,
    /// Changes that failed and were logged.
    pub skipped: usize,
}

/// Put a table's changes in apply order.
///
/// Relation removals run first and view column removals next, so nothing
/// later trips over a column they still reference. Otherwise detection
/// order is kept.
pub fn sort_for_apply(changes: &mut [MetaDiffChange]) {
    changes.sort_by_key(|change| Reverse(change.apply_priority()));
}

/// Titles and order counter for models created during one apply run.
struct ModelSlots {
    titles: Vec<String>,
    next_order: u32,
}

impl<'a> MetaSync<'a> {
    /// Compute the diff of `base` and apply every change.
    ///
    /// Each change stands alone: a failing one is logged and counted as
    /// skipped. Relation columns are added once all tables are in place,
    /// after which junction tables are derived again over the whole base.
    pub async fn apply_diff(&self, base: &Base, project: &Project) -> SyncResult<ApplyReport> {
        let diffs = self.compute_diff(base, project).await?;
        self.apply_changes(base, project, diffs).await
    }

    /// Apply an already computed diff.
    pub async fn apply_changes(
        &self,
        base: &Base,
        project: &Project,
        diffs: Vec<MetaDiff>,
    ) -> SyncResult<ApplyReport> {
        let scope = BaseScope::new(base, project);
        let mut report = ApplyReport::default();

        let models = self.store.list_models(&base.id).await?;
        let mut slots = ModelSlots {
            titles: models.iter().map(|m| m.title.clone()).collect(),
            next_order: models.iter().map(|m| m.order).max().unwrap_or(1) + 1,
        };
        let mut pending: Vec<PendingLink> = Vec::new();

        for diff in diffs {
            let MetaDiff {
                table_name,
                model_type,
                mut detected_changes,
                ..
            } = diff;
            sort_for_apply(&mut detected_changes);

            for change in detected_changes {
                if let MetaDiffChange::TableRelationAdd {
                    relation,
                    relation_type,
                } = change
                {
                    pending.push(PendingLink {
                        relation,
                        relation_type,
                    });
                    continue;
                }

                let kind = change.kind();
                let msg = change.msg();
                match self
                    .apply_change(&scope, &table_name, model_type, change, &mut slots)
                    .await
                {
                    Ok(()) => {
                        info!(table = %table_name, change = ?kind, "{}", msg);
                        report.applied += 1;
                    }
                    Err(e) if e.is_fatal() => return Err(e),
                    Err(e) => {
                        warn!(table = %table_name, change = ?kind, error = %e, "failed to apply change");
                        report.skipped += 1;
                    }
                }
            }
        }

        if !pending.is_empty() {
            let queued = pending.len();
            let mut arena = ModelArena::load(self.store, &base.id).await?;
            let inserted = arena.drain(self.store, pending, true).await;
            report.applied += inserted;
            report.skipped += queued - inserted;
        }

        let models = self.store.list_models(&base.id).await?;
        derive_m2m(self.store, &models).await;

        info!(
            base = %base.id,
            applied = report.applied,
            skipped = report.skipped,
            "meta diff applied"
        );
        Ok(report)
    }

    async fn apply_change(
        &self,
        scope: &BaseScope<'_>,
        table_name: &str,
        model_type: ModelType,
        change: MetaDiffChange,
        slots: &mut ModelSlots,
    ) -> SyncResult<()> {
        match change {
            MetaDiffChange::TableNew | MetaDiffChange::ViewNew => {
                let live_columns = self.client.column_list(table_name).await?.into_list();
                let title = unique_title(
                    &scope.naming.table_alias(table_name),
                    slots.titles.iter().map(String::as_str),
                );
                let (model, _) = self
                    .insert_model_with_columns(
                        scope,
                        table_name,
                        title,
                        model_type,
                        slots.next_order,
                        &live_columns,
                        &[],
                    )
                    .await?;
                slots.next_order += 1;
                slots.titles.push(model.title);
            }
            MetaDiffChange::TableRemove { model } | MetaDiffChange::ViewRemove { model } => {
                self.store.delete_model(&model.id).await?;
                slots.titles.retain(|t| t != &model.title);
            }
            MetaDiffChange::TableColumnAdd { cn, id } | MetaDiffChange::ViewColumnAdd { cn, id } => {
                self.add_column(scope, &id, &cn).await?;
            }
            MetaDiffChange::TableColumnTypeChange { column, live, .. }
            | MetaDiffChange::ViewColumnTypeChange { column, live, .. } => {
                let updated = retyped(scope, column, &live);
                self.store.update_column(&updated).await?;
            }
            MetaDiffChange::TableColumnPropsChanged { mut column, live, .. } => {
                copy_props(&mut column, &live);
                self.store.update_column(&column).await?;
            }
            MetaDiffChange::TableColumnRemove { column, .. }
            | MetaDiffChange::ViewColumnRemove { column, .. }
            | MetaDiffChange::TableRelationRemove { column, .. }
            | MetaDiffChange::TableVirtualM2mRemove { column, .. } => {
                self.store.delete_column(&column.id).await?;
            }
            MetaDiffChange::TableRelationAdd { .. } => {}
        }
        Ok(())
    }

    /// Insert one newly found physical column, typed at apply time.
    async fn add_column(&self, scope: &BaseScope<'_>, model_id: &ModelId, cn: &str) -> SyncResult<()> {
        let model = self
            .store
            .get_model(model_id)
            .await?
            .ok_or_else(|| SyncError::MissingModel(model_id.to_string()))?;

        let live = self
            .client
            .column_list(&model.table_name)
            .await?
            .into_list()
            .into_iter()
            .find(|c| c.cn == cn)
            .ok_or_else(|| SyncError::missing_column(&model.table_name, cn))?;

        let existing = self.store.list_columns(model_id).await?;
        let title = unique_title(
            &scope.naming.column_alias(cn),
            existing.iter().map(|c| c.title.as_str()),
        );
        let order = existing.iter().map(|c| c.order).max().unwrap_or(0) + 1;

        self.store
            .insert_column(draft_column(scope, model_id, &live, title).with_order(order))
            .await?;
        Ok(())
    }
}

/// The stored column with the live type, keeping its id, title and order.
///
/// A hidden foreign key stays a foreign key.
fn retyped(scope: &BaseScope<'_>, mut column: Column, live: &LiveColumn) -> Column {
    column.dt = Some(live.dt.clone());
    column.dtxp = live.dtxp.clone();
    if column.uidt != UiType::ForeignKey {
        column.uidt = ui_type_for_column(scope.base.dialect, live);
    }
    column.cdf = live.cdf.clone();
    copy_props(&mut column, live);
    column
}

fn copy_props(column: &mut Column, live: &LiveColumn) {
    column.pk = live.pk;
    column.rqd = live.rqd;
    column.un = live.un;
    column.ai = live.ai;
    column.unique = live.unique;
}
