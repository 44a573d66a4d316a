//! Deferred relation-column inserts.
//!
//! A has-many column needs the id of the child model and a belongs-to column
//! the id of the parent model, but models are inserted one table at a time.
//! Relation columns are therefore queued as [`PendingLink`]s while models
//! are inserted into a [`ModelArena`] keyed by table name, and the queue is
//! drained once every model exists.

use std::collections::HashMap;

use tracing::{debug, warn};

use super::error::{SyncError, SyncResult};
use crate::introspect::LiveRelation;
use crate::meta::{
    Column, LinkToAnotherRecord, MetaStore, Model, NewColumn, RelationType, UiType,
};
use crate::naming::unique_title;

/// A relation column waiting for both of its models.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingLink {
    pub relation: LiveRelation,
    pub relation_type: RelationType,
}

impl PendingLink {
    pub fn belongs_to(relation: LiveRelation) -> Self {
        Self {
            relation,
            relation_type: RelationType::BelongsTo,
        }
    }

    pub fn has_many(relation: LiveRelation) -> Self {
        Self {
            relation,
            relation_type: RelationType::HasMany,
        }
    }

    /// Table whose model receives the column.
    pub fn owner_table(&self) -> &str {
        match self.relation_type {
            RelationType::HasMany => &self.relation.rtn,
            _ => &self.relation.tn,
        }
    }
}

#[derive(Debug, Clone)]
struct ArenaEntry {
    model: Model,
    columns: Vec<Column>,
}

impl ArenaEntry {
    fn column(&self, name: &str) -> Option<&Column> {
        self.columns
            .iter()
            .find(|c| c.column_name.as_deref() == Some(name))
    }

    fn next_order(&self) -> u32 {
        self.columns.iter().map(|c| c.order).max().unwrap_or(0) + 1
    }
}

/// Models and their columns, keyed by physical table name.
#[derive(Debug, Default)]
pub struct ModelArena {
    entries: HashMap<String, ArenaEntry>,
    order: Vec<String>,
}

impl ModelArena {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load every model of a base from the store.
    pub async fn load(store: &dyn MetaStore, base_id: &str) -> SyncResult<Self> {
        let mut arena = Self::new();
        for model in store.list_models(base_id).await? {
            let columns = store.list_columns(&model.id).await?;
            arena.insert(model, columns);
        }
        Ok(arena)
    }

    pub fn insert(&mut self, model: Model, columns: Vec<Column>) {
        let key = model.table_name.clone();
        if !self.entries.contains_key(&key) {
            self.order.push(key.clone());
        }
        self.entries.insert(key, ArenaEntry { model, columns });
    }

    pub fn model(&self, table_name: &str) -> Option<&Model> {
        self.entries.get(table_name).map(|e| &e.model)
    }

    /// Models in insertion order.
    pub fn models(&self) -> Vec<Model> {
        self.order
            .iter()
            .filter_map(|k| self.entries.get(k))
            .map(|e| e.model.clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Insert every queued relation column.
    ///
    /// Links whose models or key columns are missing are skipped with a
    /// warning, as are store failures of a single insert. With
    /// `mark_foreign_key` the physical key column is first turned into a
    /// hidden `ForeignKey` column. Returns the number of columns inserted.
    pub async fn drain(
        &mut self,
        store: &dyn MetaStore,
        pending: Vec<PendingLink>,
        mark_foreign_key: bool,
    ) -> usize {
        let mut inserted = 0;
        for link in pending {
            match self.resolve(store, &link, mark_foreign_key).await {
                Ok(column) => {
                    debug!(
                        table = %link.owner_table(),
                        column = %column.title,
                        kind = %link.relation_type,
                        "inserted relation column"
                    );
                    inserted += 1;
                }
                Err(e) => {
                    warn!(
                        table = %link.relation.tn,
                        column = %link.relation.cn,
                        parent = %link.relation.rtn,
                        kind = %link.relation_type,
                        error = %e,
                        "skipping relation column"
                    );
                }
            }
        }
        inserted
    }

    async fn resolve(
        &mut self,
        store: &dyn MetaStore,
        link: &PendingLink,
        mark_foreign_key: bool,
    ) -> SyncResult<Column> {
        let rel = &link.relation;

        let child = self
            .entries
            .get(&rel.tn)
            .ok_or_else(|| SyncError::MissingModel(rel.tn.clone()))?;
        let parent = self
            .entries
            .get(&rel.rtn)
            .ok_or_else(|| SyncError::MissingModel(rel.rtn.clone()))?;

        let child_column = child
            .column(&rel.cn)
            .cloned()
            .ok_or_else(|| SyncError::missing_column(&rel.tn, &rel.cn))?;
        let parent_column = parent
            .column(&rel.rcn)
            .cloned()
            .ok_or_else(|| SyncError::missing_column(&rel.rtn, &rel.rcn))?;

        let (title, related) = match link.relation_type {
            RelationType::HasMany => (format!("{} List", child.model.title), child.model.id.clone()),
            _ => (parent.model.title.clone(), parent.model.id.clone()),
        };

        if mark_foreign_key && (child_column.uidt != UiType::ForeignKey || !child_column.system) {
            let mut fk = child_column.clone();
            fk.uidt = UiType::ForeignKey;
            fk.system = true;
            store.update_column(&fk).await?;
            if let Some(entry) = self.entries.get_mut(&rel.tn) {
                if let Some(slot) = entry.columns.iter_mut().find(|c| c.id == fk.id) {
                    *slot = fk;
                }
            }
        }

        let owner = self
            .entries
            .get_mut(link.owner_table())
            .ok_or_else(|| SyncError::MissingModel(link.owner_table().to_string()))?;

        let title = unique_title(&title, owner.columns.iter().map(|c| c.title.as_str()));
        let column = NewColumn::link(
            owner.model.id.clone(),
            title,
            LinkToAnotherRecord {
                relation_type: link.relation_type,
                fk_child_column_id: child_column.id,
                fk_parent_column_id: parent_column.id,
                fk_related_model_id: related,
                junction: None,
                fk_index_name: rel.cstn.clone(),
                update_rule: rel.ur.clone(),
                delete_rule: rel.dr.clone(),
                virtual_link: false,
            },
        )
        .with_order(owner.next_order());

        let stored = store.insert_column(column).await?;
        owner.columns.push(stored.clone());
        Ok(stored)
    }
}
