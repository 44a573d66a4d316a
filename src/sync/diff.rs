//! Drift detection between the live schema and stored metadata.

use std::collections::{HashMap, HashSet};

use serde::{Serialize, Serializer};
use tracing::{debug, info};

use super::error::SyncResult;
use super::{BaseScope, MetaSync};
use crate::config::Dialect;
use crate::introspect::{LiveColumn, LiveRelation};
use crate::meta::graph;
use crate::meta::{Base, Column, LinkToAnotherRecord, Model, ModelId, ModelType, Project, RelationType};

/// Kind of a detected change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MetaDiffType {
    TableNew,
    TableRemove,
    TableColumnAdd,
    TableColumnTypeChange,
    TableColumnPropsChanged,
    TableColumnRemove,
    ViewNew,
    ViewRemove,
    ViewColumnAdd,
    ViewColumnTypeChange,
    ViewColumnRemove,
    TableRelationAdd,
    TableRelationRemove,
    TableVirtualM2mRemove,
}

/// One detected change with what is needed to apply it.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MetaDiffChange {
    TableNew,
    TableRemove {
        model: Model,
    },
    TableColumnAdd {
        cn: String,
        id: ModelId,
    },
    TableColumnTypeChange {
        cn: String,
        id: ModelId,
        column: Column,
        live: LiveColumn,
    },
    TableColumnPropsChanged {
        cn: String,
        id: ModelId,
        column: Column,
        live: LiveColumn,
    },
    TableColumnRemove {
        cn: String,
        id: ModelId,
        column: Column,
    },
    ViewNew,
    ViewRemove {
        model: Model,
    },
    ViewColumnAdd {
        cn: String,
        id: ModelId,
    },
    ViewColumnTypeChange {
        cn: String,
        id: ModelId,
        column: Column,
        live: LiveColumn,
    },
    ViewColumnRemove {
        cn: String,
        id: ModelId,
        column: Column,
    },
    TableRelationAdd {
        #[serde(flatten)]
        relation: LiveRelation,
        #[serde(rename = "relationType")]
        relation_type: RelationType,
    },
    TableRelationRemove {
        tn: String,
        cn: String,
        rtn: String,
        rcn: String,
        column: Column,
    },
    TableVirtualM2mRemove {
        /// What disappeared from the live schema.
        reason: String,
        column: Column,
    },
}

impl MetaDiffChange {
    pub fn kind(&self) -> MetaDiffType {
        match self {
            Self::TableNew => MetaDiffType::TableNew,
            Self::TableRemove { .. } => MetaDiffType::TableRemove,
            Self::TableColumnAdd { .. } => MetaDiffType::TableColumnAdd,
            Self::TableColumnTypeChange { .. } => MetaDiffType::TableColumnTypeChange,
            Self::TableColumnPropsChanged { .. } => MetaDiffType::TableColumnPropsChanged,
            Self::TableColumnRemove { .. } => MetaDiffType::TableColumnRemove,
            Self::ViewNew => MetaDiffType::ViewNew,
            Self::ViewRemove { .. } => MetaDiffType::ViewRemove,
            Self::ViewColumnAdd { .. } => MetaDiffType::ViewColumnAdd,
            Self::ViewColumnTypeChange { .. } => MetaDiffType::ViewColumnTypeChange,
            Self::ViewColumnRemove { .. } => MetaDiffType::ViewColumnRemove,
            Self::TableRelationAdd { .. } => MetaDiffType::TableRelationAdd,
            Self::TableRelationRemove { .. } => MetaDiffType::TableRelationRemove,
            Self::TableVirtualM2mRemove { .. } => MetaDiffType::TableVirtualM2mRemove,
        }
    }

    /// Human-readable description.
    pub fn msg(&self) -> String {
        match self {
            Self::TableNew => "New table".to_string(),
            Self::ViewNew => "New view".to_string(),
            Self::TableRemove { .. } | Self::ViewRemove { .. } => "Table removed".to_string(),
            Self::TableColumnAdd { cn, .. } | Self::ViewColumnAdd { cn, .. } => {
                format!("New column({})", cn)
            }
            Self::TableColumnTypeChange { cn, .. } | Self::ViewColumnTypeChange { cn, .. } => {
                format!("Column type changed({})", cn)
            }
            Self::TableColumnPropsChanged { cn, .. } => format!("Column properties changed({})", cn),
            Self::TableColumnRemove { cn, .. } | Self::ViewColumnRemove { cn, .. } => {
                format!("Column removed({})", cn)
            }
            Self::TableRelationAdd { .. } => "New relation added".to_string(),
            Self::TableRelationRemove { .. } => "Relation removed".to_string(),
            Self::TableVirtualM2mRemove { reason, .. } => {
                format!("Many to many removed({})", reason)
            }
        }
    }

    /// Higher runs first within a table's changes.
    ///
    /// Relation columns go before anything that could drop the columns they
    /// reference, then dependent view columns.
    pub fn apply_priority(&self) -> u8 {
        match self {
            Self::TableRelationRemove { .. } => 2,
            Self::ViewColumnRemove { .. } => 1,
            _ => 0,
        }
    }
}

#[derive(Serialize)]
struct ChangeRecord<'a> {
    msg: String,
    #[serde(flatten)]
    change: &'a MetaDiffChange,
}

fn serialize_changes<S: Serializer>(changes: &[MetaDiffChange], s: S) -> Result<S::Ok, S::Error> {
    s.collect_seq(changes.iter().map(|change| ChangeRecord {
        msg: change.msg(),
        change,
    }))
}

/// The changes detected for one table or view.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetaDiff {
    pub table_name: String,
    /// Stored title; absent for tables and views not yet imported.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(rename = "type")]
    pub model_type: ModelType,
    #[serde(rename = "detectedChanges", serialize_with = "serialize_changes")]
    pub detected_changes: Vec<MetaDiffChange>,
}

impl MetaDiff {
    fn new(table_name: &str, title: Option<String>, model_type: ModelType) -> Self {
        Self {
            table_name: table_name.to_string(),
            title,
            model_type,
            detected_changes: Vec::new(),
        }
    }

    fn single(table_name: &str, model_type: ModelType, change: MetaDiffChange) -> Self {
        Self {
            detected_changes: vec![change],
            ..Self::new(table_name, None, model_type)
        }
    }

    pub fn is_empty(&self) -> bool {
        self.detected_changes.is_empty()
    }
}

/// Which directions of a live foreign key already have a relation column.
#[derive(Debug, Default)]
struct Found {
    belongs_to: bool,
    has_many: bool,
}

impl Found {
    fn mark(&mut self, relation_type: RelationType) {
        match relation_type {
            RelationType::BelongsTo => self.belongs_to = true,
            RelationType::HasMany => self.has_many = true,
            RelationType::ManyToMany => {}
        }
    }
}

/// Live state gathered once per diff run.
struct LiveState {
    tables: Vec<String>,
    relations: Vec<(LiveRelation, Found)>,
    columns: HashMap<String, Vec<LiveColumn>>,
}

impl<'a> MetaSync<'a> {
    /// Compare the live schema of `base` with its stored models.
    ///
    /// Every live table and view gets an entry, empty when in sync, followed
    /// by entries for stored tables and views that no longer exist.
    pub async fn compute_diff(&self, base: &Base, project: &Project) -> SyncResult<Vec<MetaDiff>> {
        let scope = BaseScope::new(base, project);
        let dialect = base.dialect;

        let tables: Vec<String> = self
            .client
            .table_list()
            .await?
            .into_list()
            .into_iter()
            .map(|t| t.tn)
            .filter(|tn| self.accepts(&scope.naming, tn))
            .collect();
        let known: HashSet<&str> = tables.iter().map(String::as_str).collect();
        let relations = self
            .client
            .relation_list_all()
            .await?
            .into_list()
            .into_iter()
            .filter(|r| known.contains(r.tn.as_str()) && known.contains(r.rtn.as_str()))
            .map(|r| (r, Found::default()))
            .collect();
        let mut live = LiveState {
            tables,
            relations,
            columns: HashMap::new(),
        };

        let (mut old_tables, mut old_views): (Vec<Model>, Vec<Model>) = self
            .store
            .list_models(&base.id)
            .await?
            .into_iter()
            .partition(|m| m.model_type == ModelType::Table);

        let mut changes: Vec<MetaDiff> = Vec::new();
        let mut relation_columns: Vec<(String, Column)> = Vec::new();

        for tn in live.tables.clone() {
            let Some(idx) = old_tables.iter().position(|m| m.table_name == tn) else {
                changes.push(MetaDiff::single(&tn, ModelType::Table, MetaDiffChange::TableNew));
                continue;
            };
            let model = old_tables.remove(idx);

            let live_columns = self.client.column_list(&tn).await?.into_list();
            let mut stored = self.store.list_columns(&model.id).await?;
            let mut entry = MetaDiff::new(&tn, Some(model.title.clone()), ModelType::Table);
            entry.detected_changes =
                column_changes(dialect, &model, &live_columns, &mut stored, ModelType::Table);

            for column in stored {
                if column.is_virtual() {
                    if column.uidt.is_link() {
                        relation_columns.push((tn.clone(), column));
                    }
                    continue;
                }
                entry.detected_changes.push(MetaDiffChange::TableColumnRemove {
                    cn: column.name().to_string(),
                    id: model.id.clone(),
                    column,
                });
            }

            live.columns.insert(tn, live_columns);
            changes.push(entry);
        }

        for model in old_tables {
            changes.push(MetaDiff::single(
                &model.table_name.clone(),
                ModelType::Table,
                MetaDiffChange::TableRemove { model },
            ));
        }

        for (owner, column) in relation_columns {
            if let Some(change) = self.relation_change(&column, &mut live).await? {
                if let Some(entry) = group_mut(&mut changes, &owner, ModelType::Table) {
                    entry.detected_changes.push(change);
                }
            }
        }

        for (relation, found) in &live.relations {
            if !found.belongs_to {
                if let Some(entry) = group_mut(&mut changes, &relation.tn, ModelType::Table) {
                    entry.detected_changes.push(MetaDiffChange::TableRelationAdd {
                        relation: relation.clone(),
                        relation_type: RelationType::BelongsTo,
                    });
                }
            }
            if !found.has_many {
                if let Some(entry) = group_mut(&mut changes, &relation.rtn, ModelType::Table) {
                    entry.detected_changes.push(MetaDiffChange::TableRelationAdd {
                        relation: relation.clone(),
                        relation_type: RelationType::HasMany,
                    });
                }
            }
        }

        let views: Vec<String> = self
            .client
            .view_list()
            .await?
            .into_list()
            .into_iter()
            .map(|v| v.view_name)
            .filter(|name| self.accepts(&scope.naming, name))
            .collect();

        for name in views {
            let Some(idx) = old_views.iter().position(|m| m.table_name == name) else {
                changes.push(MetaDiff::single(&name, ModelType::View, MetaDiffChange::ViewNew));
                continue;
            };
            let model = old_views.remove(idx);

            let live_columns = self.client.column_list(&name).await?.into_list();
            let mut stored = self.store.list_columns(&model.id).await?;
            let mut entry = MetaDiff::new(&name, Some(model.title.clone()), ModelType::View);
            entry.detected_changes =
                column_changes(dialect, &model, &live_columns, &mut stored, ModelType::View);

            for column in stored {
                entry.detected_changes.push(MetaDiffChange::ViewColumnRemove {
                    cn: column.name().to_string(),
                    id: model.id.clone(),
                    column,
                });
            }
            changes.push(entry);
        }

        for model in old_views {
            changes.push(MetaDiff::single(
                &model.table_name.clone(),
                ModelType::View,
                MetaDiffChange::ViewRemove { model },
            ));
        }

        let total: usize = changes.iter().map(|d| d.detected_changes.len()).sum();
        info!(base = %base.id, entries = changes.len(), changes = total, "computed meta diff");
        Ok(changes)
    }

    /// The change a stored relation column calls for, if any.
    ///
    /// Matching live foreign keys are marked found along the way.
    async fn relation_change(
        &self,
        column: &Column,
        live: &mut LiveState,
    ) -> SyncResult<Option<MetaDiffChange>> {
        let Some(link) = column.link() else {
            return Ok(None);
        };

        if link.relation_type == RelationType::ManyToMany {
            return Ok(self
                .stale_m2m_reason(link, live)
                .await?
                .map(|reason| MetaDiffChange::TableVirtualM2mRemove {
                    reason,
                    column: column.clone(),
                }));
        }

        if link.virtual_link {
            return Ok(None);
        }

        let child = graph::child_column(self.store, link).await?;
        let parent = graph::parent_column(self.store, link).await?;
        let (tn, cn) = self.endpoint(child.as_ref()).await?;
        let (rtn, rcn) = self.endpoint(parent.as_ref()).await?;

        let matched = live
            .relations
            .iter_mut()
            .find(|(r, _)| r.same_key(&tn, &cn, &rtn, &rcn));

        match matched {
            Some((_, found)) => {
                found.mark(link.relation_type);
                Ok(None)
            }
            None => {
                debug!(table = %tn, column = %cn, parent = %rtn, "relation no longer in live schema");
                Ok(Some(MetaDiffChange::TableRelationRemove {
                    tn,
                    cn,
                    rtn,
                    rcn,
                    column: column.clone(),
                }))
            }
        }
    }

    /// Table and column name of a stored column; empty when it is gone.
    async fn endpoint(&self, column: Option<&Column>) -> SyncResult<(String, String)> {
        let Some(column) = column else {
            return Ok((String::new(), String::new()));
        };
        let table = self
            .store
            .get_model(&column.model_id)
            .await?
            .map(|m| m.table_name)
            .unwrap_or_default();
        Ok((table, column.name().to_string()))
    }

    /// Why an `mm` column no longer matches the live schema, if it doesn't.
    async fn stale_m2m_reason(
        &self,
        link: &LinkToAnotherRecord,
        live: &mut LiveState,
    ) -> SyncResult<Option<String>> {
        let related = graph::related_model(self.store, link).await?;
        let junction = graph::mm_model(self.store, link).await?;
        let child = graph::child_column(self.store, link).await?;

        for model in [&related, &junction] {
            match model {
                Some(m) if live.tables.contains(&m.table_name) => {}
                Some(m) => return Ok(Some(format!("{} removed", m.table_name))),
                None => return Ok(Some("related table removed".to_string())),
            }
        }
        let (Some(related), Some(junction)) = (related, junction) else {
            return Ok(None);
        };

        let owner = match &child {
            Some(c) => self.store.get_model(&c.model_id).await?,
            None => None,
        };

        let column_removed = Some("One of the relation column removed".to_string());
        let Some(owner) = owner else {
            return Ok(column_removed);
        };

        let checks = [
            (&owner.table_name, child),
            (&related.table_name, graph::parent_column(self.store, link).await?),
            (&junction.table_name, graph::mm_child_column(self.store, link).await?),
            (&junction.table_name, graph::mm_parent_column(self.store, link).await?),
        ];
        for (table, column) in checks {
            let Some(column) = column else {
                return Ok(column_removed);
            };
            let columns = self.live_columns(table, live).await?;
            if !columns.iter().any(|c| c.cn == column.name()) {
                return Ok(column_removed);
            }
        }
        Ok(None)
    }

    async fn live_columns<'l>(
        &self,
        table: &str,
        live: &'l mut LiveState,
    ) -> SyncResult<&'l [LiveColumn]> {
        if !live.columns.contains_key(table) {
            let columns = self.client.column_list(table).await?.into_list();
            live.columns.insert(table.to_string(), columns);
        }
        Ok(live.columns.get(table).map(Vec::as_slice).unwrap_or_default())
    }
}

/// Added, retyped and drifted columns of one table or view.
///
/// Matched stored columns are removed from `stored`, leaving the ones with
/// no live counterpart.
fn column_changes(
    dialect: Dialect,
    model: &Model,
    live_columns: &[LiveColumn],
    stored: &mut Vec<Column>,
    model_type: ModelType,
) -> Vec<MetaDiffChange> {
    let is_view = model_type == ModelType::View;
    let mut changes = Vec::new();

    for live in live_columns {
        let Some(idx) = stored
            .iter()
            .position(|c| c.column_name.as_deref() == Some(live.cn.as_str()))
        else {
            changes.push(if is_view {
                MetaDiffChange::ViewColumnAdd {
                    cn: live.cn.clone(),
                    id: model.id.clone(),
                }
            } else {
                MetaDiffChange::TableColumnAdd {
                    cn: live.cn.clone(),
                    id: model.id.clone(),
                }
            });
            continue;
        };
        let column = stored.remove(idx);

        if type_changed(dialect, &column, live) {
            let (cn, id, live) = (live.cn.clone(), model.id.clone(), live.clone());
            changes.push(if is_view {
                MetaDiffChange::ViewColumnTypeChange { cn, id, column, live }
            } else {
                MetaDiffChange::TableColumnTypeChange { cn, id, column, live }
            });
        } else if !is_view && props_changed(&column, live) {
            changes.push(MetaDiffChange::TableColumnPropsChanged {
                cn: live.cn.clone(),
                id: model.id.clone(),
                column,
                live: live.clone(),
            });
        }
    }
    changes
}

/// The data type differs, or the value list of a MySQL enum or set does.
fn type_changed(dialect: Dialect, column: &Column, live: &LiveColumn) -> bool {
    if column.dt.as_deref() != Some(live.dt.as_str()) {
        return true;
    }
    dialect.is_mysql()
        && matches!(live.dt.as_str(), "enum" | "set")
        && column.dtxp != live.dtxp
}

fn props_changed(column: &Column, live: &LiveColumn) -> bool {
    column.pk != live.pk
        || column.rqd != live.rqd
        || column.un != live.un
        || column.ai != live.ai
        || column.unique != live.unique
}

fn group_mut<'c>(
    changes: &'c mut [MetaDiff],
    table_name: &str,
    model_type: ModelType,
) -> Option<&'c mut MetaDiff> {
    changes
        .iter_mut()
        .find(|d| d.table_name == table_name && d.model_type == model_type)
}
