//! Graph-loading helpers over link options.
//!
//! Each helper resolves one reference of a [`LinkToAnotherRecord`] through
//! the store. A reference to a record that no longer exists resolves to
//! `None` rather than an error.

use super::error::StoreResult;
use super::store::MetaStore;
use super::types::{Column, LinkToAnotherRecord, Model};

/// The model on the other side of the link.
pub async fn related_model(
    store: &dyn MetaStore,
    link: &LinkToAnotherRecord,
) -> StoreResult<Option<Model>> {
    store.get_model(&link.fk_related_model_id).await
}

pub async fn child_column(
    store: &dyn MetaStore,
    link: &LinkToAnotherRecord,
) -> StoreResult<Option<Column>> {
    store.get_column(&link.fk_child_column_id).await
}

pub async fn parent_column(
    store: &dyn MetaStore,
    link: &LinkToAnotherRecord,
) -> StoreResult<Option<Column>> {
    store.get_column(&link.fk_parent_column_id).await
}

/// The junction model of an `mm` link.
pub async fn mm_model(
    store: &dyn MetaStore,
    link: &LinkToAnotherRecord,
) -> StoreResult<Option<Model>> {
    match &link.junction {
        Some(junction) => store.get_model(&junction.fk_mm_model_id).await,
        None => Ok(None),
    }
}

/// The junction column pointing back at the owning model.
pub async fn mm_child_column(
    store: &dyn MetaStore,
    link: &LinkToAnotherRecord,
) -> StoreResult<Option<Column>> {
    match &link.junction {
        Some(junction) => store.get_column(&junction.fk_mm_child_column_id).await,
        None => Ok(None),
    }
}

/// The junction column pointing at the related model.
pub async fn mm_parent_column(
    store: &dyn MetaStore,
    link: &LinkToAnotherRecord,
) -> StoreResult<Option<Column>> {
    match &link.junction {
        Some(junction) => store.get_column(&junction.fk_mm_parent_column_id).await,
        None => Ok(None),
    }
}
