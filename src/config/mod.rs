//! Configuration module for nocometa.
//!
//! Handles dialects, connection descriptors, and settings files.

mod connection;
mod settings;

pub use connection::{ConnectionError, Dialect, SchemaSource};
pub use settings::{
    expand_env_vars, ConnectionSettings, LoggingSettings, MetaSettings, ProjectSettings,
    Settings, SettingsError, SyncSettings,
};
