//! Hook into the view layer.

use async_trait::async_trait;

use super::error::SyncResult;
use crate::meta::Model;

/// Grid-view repair run after population.
///
/// Grid views resolve their display value column independently of the
/// table, so every grid view of a freshly populated base is handed back to
/// the view layer once all columns exist.
#[async_trait]
pub trait ViewRepair: Send + Sync {
    /// Ids of the grid views over `model`.
    async fn grid_views(&self, model: &Model) -> SyncResult<Vec<String>>;

    /// Re-resolve the display value column of one view.
    async fn fix_pv_column_for_view(&self, view_id: &str) -> SyncResult<()>;
}

/// A [`ViewRepair`] for deployments without a view layer.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopViewRepair;

#[async_trait]
impl ViewRepair for NoopViewRepair {
    async fn grid_views(&self, _model: &Model) -> SyncResult<Vec<String>> {
        Ok(Vec::new())
    }

    async fn fix_pv_column_for_view(&self, _view_id: &str) -> SyncResult<()> {
        Ok(())
    }
}
