//! MetaStore trait definition.
//!
//! The MetaStore trait abstracts over where model and column metadata is
//! persisted. The sync engines only ever talk to the store through this
//! trait, so the same population and diff code runs against the in-memory
//! store in tests and the sqlite store in the CLI.

use async_trait::async_trait;

use super::error::StoreResult;
use super::types::{Column, ColumnId, Model, ModelId, NewColumn, NewModel};

/// Persistent storage of models and columns.
///
/// Implementations enforce the uniqueness invariants and report violations
/// as [`StoreError::Duplicate`](super::StoreError::Duplicate):
///
/// - `(base_id, table_name)` and `(base_id, title)` per model
/// - `(model_id, title)` per column
#[async_trait]
pub trait MetaStore: Send + Sync {
    // =========================================================================
    // Models
    // =========================================================================

    /// Insert a model. Appends after the last model of the base when no
    /// order is given.
    async fn insert_model(&self, model: NewModel) -> StoreResult<Model>;

    async fn get_model(&self, id: &ModelId) -> StoreResult<Option<Model>>;

    /// Look up a model by physical name within a base.
    async fn get_model_by_table(
        &self,
        base_id: &str,
        table_name: &str,
    ) -> StoreResult<Option<Model>>;

    /// All models of a base, ordered by `order`.
    async fn list_models(&self, base_id: &str) -> StoreResult<Vec<Model>>;

    /// Delete a model together with its columns and their options.
    async fn delete_model(&self, id: &ModelId) -> StoreResult<()>;

    /// Set or clear the junction flag.
    async fn set_mm(&self, id: &ModelId, mm: bool) -> StoreResult<()>;

    // =========================================================================
    // Columns
    // =========================================================================

    /// Insert a column. Appends after the last column of the model when no
    /// order is given.
    async fn insert_column(&self, column: NewColumn) -> StoreResult<Column>;

    /// Overwrite a stored column, matched by id.
    async fn update_column(&self, column: &Column) -> StoreResult<()>;

    /// Delete a column and its options.
    async fn delete_column(&self, id: &ColumnId) -> StoreResult<()>;

    /// Set or clear the system flag.
    async fn mark_system(&self, id: &ColumnId, system: bool) -> StoreResult<()>;

    async fn get_column(&self, id: &ColumnId) -> StoreResult<Option<Column>>;

    /// Columns of a model, ordered by `order`.
    async fn list_columns(&self, model_id: &ModelId) -> StoreResult<Vec<Column>>;
}

/// Build the stored column for an insert.
pub(crate) fn materialize(column: NewColumn, order: u32) -> Column {
    Column {
        id: ColumnId::generate(),
        model_id: column.model_id,
        column_name: column.column_name,
        title: column.title,
        uidt: column.uidt,
        dt: column.dt,
        dtxp: column.dtxp,
        order: column.order.unwrap_or(order),
        system: column.system,
        pv: column.pv,
        pk: column.pk,
        ai: column.ai,
        rqd: column.rqd,
        un: column.un,
        unique: column.unique,
        cdf: column.cdf,
        options: column.options,
    }
}
