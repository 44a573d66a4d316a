//! # nocometa
//!
//! Keeps spreadsheet-style metadata in step with a live SQL schema.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │           SqlClient (live tables, views, FKs)            │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [typemap + naming]
//! ┌─────────────────────────────────────────────────────────┐
//! │        MetaSync: populate / compute_diff / apply         │
//! │        + deferred relation columns + m2m derivation      │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼
//! ┌─────────────────────────────────────────────────────────┐
//! │          MetaStore (models, columns, link options)       │
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! - [`introspect`] reads live schemas (SQLite files, JSON snapshots)
//! - [`typemap`] maps dialect types to UI and Swagger types
//! - [`naming`] derives display titles
//! - [`meta`] holds the metadata records and stores
//! - [`sync`] is the engine
//! - [`config`] loads settings

pub mod config;
pub mod introspect;
pub mod meta;
pub mod naming;
pub mod sync;
pub mod typemap;

/// Re-exports for convenient usage.
pub mod prelude {
    pub use crate::config::{Dialect, Settings};
    pub use crate::introspect::{SnapshotClient, SqlClient, SqliteClient};
    pub use crate::meta::{
        Base, Column, InMemoryMetaStore, MetaStore, Model, ModelType, Project, RelationType,
        SqliteMetaStore, UiType,
    };
    pub use crate::sync::{MetaDiff, MetaDiffType, MetaSync, SyncOptions};
}
