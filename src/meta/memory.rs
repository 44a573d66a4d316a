//! In-memory metadata store.

use async_trait::async_trait;
use tokio::sync::Mutex;

use super::error::{StoreError, StoreResult};
use super::store::{materialize, MetaStore};
use super::types::{Column, ColumnId, Model, ModelId, NewColumn, NewModel};

#[derive(Debug, Default)]
struct Inner {
    models: Vec<Model>,
    columns: Vec<Column>,
}

/// A [`MetaStore`] kept entirely in memory.
///
/// Used by the integration tests and by dry runs that should not touch the
/// persisted metadata.
#[derive(Debug, Default)]
pub struct InMemoryMetaStore {
    inner: Mutex<Inner>,
}

impl InMemoryMetaStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl MetaStore for InMemoryMetaStore {
    async fn insert_model(&self, model: NewModel) -> StoreResult<Model> {
        let mut inner = self.inner.lock().await;

        let siblings = inner.models.iter().filter(|m| m.base_id == model.base_id);
        let mut next_order = 1;
        for existing in siblings {
            if existing.table_name == model.table_name {
                return Err(StoreError::duplicate("model table", model.table_name));
            }
            if existing.title == model.title {
                return Err(StoreError::duplicate("model title", model.title));
            }
            next_order = next_order.max(existing.order + 1);
        }

        let stored = Model {
            id: ModelId::generate(),
            project_id: model.project_id,
            base_id: model.base_id,
            table_name: model.table_name,
            title: model.title,
            model_type: model.model_type,
            order: model.order.unwrap_or(next_order),
            mm: false,
        };
        inner.models.push(stored.clone());
        Ok(stored)
    }

    async fn get_model(&self, id: &ModelId) -> StoreResult<Option<Model>> {
        let inner = self.inner.lock().await;
        Ok(inner.models.iter().find(|m| &m.id == id).cloned())
    }

    async fn get_model_by_table(
        &self,
        base_id: &str,
        table_name: &str,
    ) -> StoreResult<Option<Model>> {
        let inner = self.inner.lock().await;
        Ok(inner
            .models
            .iter()
            .find(|m| m.base_id == base_id && m.table_name == table_name)
            .cloned())
    }

    async fn list_models(&self, base_id: &str) -> StoreResult<Vec<Model>> {
        let inner = self.inner.lock().await;
        let mut models: Vec<Model> = inner
            .models
            .iter()
            .filter(|m| m.base_id == base_id)
            .cloned()
            .collect();
        models.sort_by_key(|m| m.order);
        Ok(models)
    }

    async fn delete_model(&self, id: &ModelId) -> StoreResult<()> {
        let mut inner = self.inner.lock().await;
        let before = inner.models.len();
        inner.models.retain(|m| &m.id != id);
        if inner.models.len() == before {
            return Err(StoreError::not_found("model", id.as_str()));
        }
        inner.columns.retain(|c| &c.model_id != id);
        Ok(())
    }

    async fn set_mm(&self, id: &ModelId, mm: bool) -> StoreResult<()> {
        let mut inner = self.inner.lock().await;
        let model = inner
            .models
            .iter_mut()
            .find(|m| &m.id == id)
            .ok_or_else(|| StoreError::not_found("model", id.as_str()))?;
        model.mm = mm;
        Ok(())
    }

    async fn insert_column(&self, column: NewColumn) -> StoreResult<Column> {
        let mut inner = self.inner.lock().await;

        if !inner.models.iter().any(|m| m.id == column.model_id) {
            return Err(StoreError::not_found("model", column.model_id.as_str()));
        }

        let mut next_order = 1;
        for existing in inner.columns.iter().filter(|c| c.model_id == column.model_id) {
            if existing.title == column.title {
                return Err(StoreError::duplicate("column title", column.title));
            }
            next_order = next_order.max(existing.order + 1);
        }

        let stored = materialize(column, next_order);
        inner.columns.push(stored.clone());
        Ok(stored)
    }

    async fn update_column(&self, column: &Column) -> StoreResult<()> {
        let mut inner = self.inner.lock().await;

        let clash = inner.columns.iter().any(|c| {
            c.model_id == column.model_id && c.id != column.id && c.title == column.title
        });
        if clash {
            return Err(StoreError::duplicate("column title", column.title.clone()));
        }

        let stored = inner
            .columns
            .iter_mut()
            .find(|c| c.id == column.id)
            .ok_or_else(|| StoreError::not_found("column", column.id.as_str()))?;
        *stored = column.clone();
        Ok(())
    }

    async fn delete_column(&self, id: &ColumnId) -> StoreResult<()> {
        let mut inner = self.inner.lock().await;
        let before = inner.columns.len();
        inner.columns.retain(|c| &c.id != id);
        if inner.columns.len() == before {
            return Err(StoreError::not_found("column", id.as_str()));
        }
        Ok(())
    }

    async fn mark_system(&self, id: &ColumnId, system: bool) -> StoreResult<()> {
        let mut inner = self.inner.lock().await;
        let column = inner
            .columns
            .iter_mut()
            .find(|c| &c.id == id)
            .ok_or_else(|| StoreError::not_found("column", id.as_str()))?;
        column.system = system;
        Ok(())
    }

    async fn get_column(&self, id: &ColumnId) -> StoreResult<Option<Column>> {
        let inner = self.inner.lock().await;
        Ok(inner.columns.iter().find(|c| &c.id == id).cloned())
    }

    async fn list_columns(&self, model_id: &ModelId) -> StoreResult<Vec<Column>> {
        let inner = self.inner.lock().await;
        let mut columns: Vec<Column> = inner
            .columns
            .iter()
            .filter(|c| &c.model_id == model_id)
            .cloned()
            .collect();
        columns.sort_by_key(|c| c.order);
        Ok(columns)
    }
}
