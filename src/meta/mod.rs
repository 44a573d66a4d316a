//! Metadata model: projects, bases, models, columns and the stores that
//! persist them.
//!
//! # Module Structure
//!
//! - `types` - metadata records and column options
//! - `ui_type` - the `uidt` tag of a column
//! - `store` - the [`MetaStore`] trait
//! - `memory` / `sqlite` - store implementations
//! - `graph` - helpers resolving link references through a store

mod error;
pub mod graph;
mod memory;
mod sqlite;
mod store;
mod types;
mod ui_type;

pub use error::{StoreError, StoreResult};
pub use memory::InMemoryMetaStore;
pub use sqlite::SqliteMetaStore;
pub use store::MetaStore;
pub use types::{
    Base, Column, ColumnId, ColumnOptions, FormulaOptions, Junction, LinkToAnotherRecord,
    LookupOptions, Model, ModelId, ModelType, NewColumn, NewModel, Project, RelationType,
    RollupOptions,
};
pub use ui_type::UiType;
