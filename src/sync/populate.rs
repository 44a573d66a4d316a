//! First-time import of a base.

use std::time::Instant;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::display_value::assign_display_value;
use super::error::SyncResult;
use super::m2m::derive_m2m;
use super::pending::{ModelArena, PendingLink};
use super::{draft_columns, BaseScope, MetaSync};
use crate::introspect::{LiveColumn, LiveRelation};
use crate::meta::{Base, Column, Model, ModelType, NewColumn, NewModel, Project, UiType};
use crate::naming::unique_title;

/// Endpoints exposed per table.
const TABLE_API_COUNT: usize = 5;
/// Endpoints exposed per view.
const VIEW_API_COUNT: usize = 2;
/// Endpoints exposed per relation column.
const RELATION_API_COUNT: usize = 5;
/// Order of the first table. Order 1 is taken by the project's own tables.
const FIRST_TABLE_ORDER: u32 = 2;

/// Summary of a population run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PopulationReport {
    pub tables_count: usize,
    pub views_count: usize,
    pub relations_count: usize,
    pub api_count: usize,
    /// Wall-clock seconds, rounded to a tenth.
    pub time_taken: f64,
}

impl<'a> MetaSync<'a> {
    /// Import every table and view of `base`.
    ///
    /// Tables come first, with their physical columns; relation columns are
    /// inserted once every table has a model, then junction tables are
    /// derived. Views follow and finally grid views get their display value
    /// repaired.
    ///
    /// Introspection failures abort. Store failures on a single model or
    /// column are logged and the run continues.
    pub async fn populate(&self, base: &Base, project: &Project) -> SyncResult<PopulationReport> {
        let started = Instant::now();
        let scope = BaseScope::new(base, project);
        let mut report = PopulationReport::default();

        let relations = self.client.relation_list_all().await?.into_list();
        let tables: Vec<String> = self
            .client
            .table_list()
            .await?
            .into_list()
            .into_iter()
            .map(|t| t.tn)
            .filter(|tn| self.accepts(&scope.naming, tn))
            .collect();
        report.relations_count = relations.len();

        info!(
            base = %base.id,
            tables = tables.len(),
            relations = relations.len(),
            "populating base"
        );

        let mut arena = ModelArena::load(self.store, &base.id).await?;
        let mut titles: Vec<String> = arena.models().into_iter().map(|m| m.title).collect();
        let mut order = FIRST_TABLE_ORDER;
        let mut created: Vec<Model> = Vec::new();
        let mut pending: Vec<PendingLink> = Vec::new();

        for tn in &tables {
            if arena.model(tn).is_some() {
                warn!(table = %tn, "table already has a model, skipping");
                continue;
            }

            let live_columns = self.client.column_list(tn).await?.into_list();
            let belongs_to: Vec<&LiveRelation> = relations.iter().filter(|r| &r.tn == tn).collect();
            let has_many: Vec<&LiveRelation> = relations.iter().filter(|r| &r.rtn == tn).collect();

            let title = unique_title(
                &scope.naming.table_alias(tn),
                titles.iter().map(String::as_str),
            );
            let (model, columns) = match self
                .insert_model_with_columns(&scope, tn, title, ModelType::Table, order, &live_columns, &belongs_to)
                .await
            {
                Ok(inserted) => inserted,
                Err(e) => {
                    warn!(table = %tn, error = %e, "failed to insert model");
                    continue;
                }
            };
            order += 1;
            report.tables_count += 1;
            report.api_count += TABLE_API_COUNT;

            pending.extend(has_many.into_iter().cloned().map(PendingLink::has_many));
            pending.extend(belongs_to.into_iter().cloned().map(PendingLink::belongs_to));

            titles.push(model.title.clone());
            created.push(model.clone());
            arena.insert(model, columns);
        }

        let inserted = arena.drain(self.store, pending, false).await;
        report.api_count += RELATION_API_COUNT * inserted;
        derive_m2m(self.store, &created).await;

        let views: Vec<String> = self
            .client
            .view_list()
            .await?
            .into_list()
            .into_iter()
            .map(|v| v.view_name)
            .filter(|name| self.accepts(&scope.naming, name))
            .collect();

        for name in &views {
            if arena.model(name).is_some() {
                warn!(view = %name, "view already has a model, skipping");
                continue;
            }

            let live_columns = self.client.column_list(name).await?.into_list();
            let title = unique_title(
                &scope.naming.table_alias(name),
                titles.iter().map(String::as_str),
            );
            let model = match self
                .insert_model_with_columns(&scope, name, title, ModelType::View, order, &live_columns, &[])
                .await
            {
                Ok((model, _)) => model,
                Err(e) => {
                    warn!(view = %name, error = %e, "failed to insert model");
                    continue;
                }
            };
            order += 1;
            report.views_count += 1;
            report.api_count += VIEW_API_COUNT;
            titles.push(model.title.clone());
        }

        self.repair_grid_views(&base.id).await?;

        report.time_taken = (started.elapsed().as_secs_f64() * 10.0).round() / 10.0;
        info!(
            base = %base.id,
            tables = report.tables_count,
            views = report.views_count,
            relations = report.relations_count,
            seconds = report.time_taken,
            "population finished"
        );
        Ok(report)
    }

    /// Insert a model and its physical columns.
    ///
    /// Columns referenced by `belongs_to` become hidden foreign keys and the
    /// display value is picked before insert. Column failures are logged and
    /// skipped; a model failure is returned.
    #[allow(clippy::too_many_arguments)]
    pub(crate) async fn insert_model_with_columns(
        &self,
        scope: &BaseScope<'_>,
        table_name: &str,
        title: String,
        model_type: ModelType,
        order: u32,
        live_columns: &[LiveColumn],
        belongs_to: &[&LiveRelation],
    ) -> SyncResult<(Model, Vec<Column>)> {
        let model = self
            .store
            .insert_model(NewModel {
                project_id: scope.base.project_id.clone(),
                base_id: scope.base.id.clone(),
                table_name: table_name.to_string(),
                title,
                model_type,
                order: Some(order),
            })
            .await?;

        let mut drafts = draft_columns(scope, &model.id, live_columns);
        assign_display_value(&mut drafts);
        mark_foreign_keys(&mut drafts, belongs_to);

        let mut columns = Vec::with_capacity(drafts.len());
        for draft in drafts {
            let name = draft.column_name.clone().unwrap_or_default();
            match self.store.insert_column(draft).await {
                Ok(column) => columns.push(column),
                Err(e) => warn!(table = %table_name, column = %name, error = %e, "failed to insert column"),
            }
        }

        debug!(
            table = %table_name,
            title = %model.title,
            kind = %model_type,
            columns = columns.len(),
            "inserted model"
        );
        Ok((model, columns))
    }

    /// Hand every grid view of the base to the view layer.
    async fn repair_grid_views(&self, base_id: &str) -> SyncResult<()> {
        for model in self.store.list_models(base_id).await? {
            let views = match self.view_repair.grid_views(&model).await {
                Ok(views) => views,
                Err(e) => {
                    warn!(table = %model.table_name, error = %e, "failed to list grid views");
                    continue;
                }
            };
            for view_id in views {
                if let Err(e) = self.view_repair.fix_pv_column_for_view(&view_id).await {
                    warn!(view = %view_id, error = %e, "failed to repair grid view");
                }
            }
        }
        Ok(())
    }
}

/// Turn the physical side of each belongs-to relation into a hidden key.
pub(crate) fn mark_foreign_keys(drafts: &mut [NewColumn], belongs_to: &[&LiveRelation]) {
    for relation in belongs_to {
        if let Some(draft) = drafts
            .iter_mut()
            .find(|d| d.column_name.as_deref() == Some(relation.cn.as_str()))
        {
            draft.uidt = UiType::ForeignKey;
            draft.system = true;
        }
    }
}
