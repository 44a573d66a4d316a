//! SqlClient trait definition.
//!
//! The SqlClient trait abstracts over how a live schema is read. Every
//! listing comes back in the same `{data: {list}}` shape regardless of the
//! dialect behind it.

use async_trait::async_trait;

use super::error::IntrospectResult;
use super::types::{ListResponse, LiveColumn, LiveRelation, LiveTable, LiveView};
use crate::config::Dialect;

/// Read access to a live database schema.
///
/// # Example
///
/// ```ignore
/// use nocometa::introspect::SqlClient;
///
/// async fn example(client: &dyn SqlClient) -> IntrospectResult<()> {
///     for table in client.table_list().await?.into_list() {
///         let columns = client.column_list(&table.tn).await?.into_list();
///         println!("{}: {} columns", table.tn, columns.len());
///     }
///     Ok(())
/// }
/// ```
#[async_trait]
pub trait SqlClient: Send + Sync {
    /// Dialect of the database behind this client.
    fn dialect(&self) -> Dialect;

    /// Base tables, in introspection order.
    async fn table_list(&self) -> IntrospectResult<ListResponse<LiveTable>>;

    /// Views, in introspection order.
    async fn view_list(&self) -> IntrospectResult<ListResponse<LiveView>>;

    /// Columns of a table or view, in ordinal order.
    async fn column_list(&self, tn: &str) -> IntrospectResult<ListResponse<LiveColumn>>;

    /// Every foreign key in the database.
    async fn relation_list_all(&self) -> IntrospectResult<ListResponse<LiveRelation>>;
}
