//! TOML-based configuration for nocometa.
//!
//! Supports a config file (nocometa.toml) with environment variable expansion.
//!
//! Example configuration:
//! ```toml
//! [project]
//! id = "p_sales"
//! title = "Sales"
//! prefix = "nc_sales_"
//!
//! [connections.default]
//! dialect = "sqlite3"
//! connection_string = "${SALES_DB}"
//! is_meta = false
//! inflection_table = "camelize"
//!
//! [sync]
//! ignore_tables = ["nc_evolutions", "_evolutions"]
//!
//! [meta]
//! path = "./meta.db"
//!
//! [logging]
//! level = "debug"
//! ```

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use super::connection::{Dialect, SchemaSource};
use crate::meta::{Base, Project};
use crate::sync::{SyncOptions, DEFAULT_IGNORE_TABLES};

/// Error type for settings.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("Config file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Connection not found: {0}")]
    ConnectionNotFound(String),

    #[error("Unsupported dialect: {0}")]
    UnsupportedDialect(String),

    #[error("Failed to determine home directory")]
    NoHomeDir,

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Root configuration structure.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Settings {
    /// The project the connections belong to.
    pub project: ProjectSettings,

    /// Named database connections, one base each.
    pub connections: BTreeMap<String, ConnectionSettings>,

    /// Synchronization settings.
    pub sync: SyncSettings,

    /// Metadata store settings.
    pub meta: MetaSettings,

    /// Logging settings.
    pub logging: LoggingSettings,
}

/// Project identity.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ProjectSettings {
    pub id: String,
    pub title: String,
    /// Table-name prefix of a project that owns a dedicated meta database.
    pub prefix: Option<String>,
}

impl Default for ProjectSettings {
    fn default() -> Self {
        Self {
            id: "p_default".to_string(),
            title: "default".to_string(),
            prefix: None,
        }
    }
}

/// Connection configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ConnectionSettings {
    /// Database dialect (mysql, mysql2, pg, mssql, sqlite3).
    pub dialect: String,

    /// Connection string (supports ${ENV_VAR} expansion).
    pub connection_string: String,

    /// Whether the base is fully owned by the platform.
    #[serde(default)]
    pub is_meta: bool,

    /// Comma-separated inflection transforms for table titles.
    #[serde(default)]
    pub inflection_table: Option<String>,

    /// Comma-separated inflection transforms for column titles.
    #[serde(default)]
    pub inflection_column: Option<String>,
}

impl ConnectionSettings {
    /// Get the dialect.
    pub fn dialect(&self) -> Result<Dialect, SettingsError> {
        Dialect::from_str(&self.dialect)
            .map_err(|_| SettingsError::UnsupportedDialect(self.dialect.clone()))
    }

    /// Get the connection string with environment variables expanded.
    pub fn resolved_connection_string(&self) -> Result<String, SettingsError> {
        expand_env_vars(&self.connection_string)
    }

    /// Resolve where the live schema is read from.
    pub fn schema_source(&self) -> Result<SchemaSource, SettingsError> {
        let conn = self.resolved_connection_string()?;
        SchemaSource::resolve(self.dialect()?, &conn)
            .map_err(|e| SettingsError::InvalidConfig(e.to_string()))
    }
}

/// Synchronization configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SyncSettings {
    /// Bookkeeping tables never imported as models.
    pub ignore_tables: Vec<String>,
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            ignore_tables: DEFAULT_IGNORE_TABLES
                .iter()
                .map(|t| t.to_string())
                .collect(),
        }
    }
}

/// Metadata store configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct MetaSettings {
    /// Path of the sqlite metadata store. Defaults to `~/.nocometa/meta.db`.
    pub path: Option<String>,
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// Default level when neither the CLI nor `RUST_LOG` sets one.
    pub level: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl Settings {
    /// Load settings from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, SettingsError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(SettingsError::FileNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path)?;
        let settings: Settings = toml::from_str(&content)?;
        Ok(settings)
    }

    /// Load settings from the default config file locations.
    ///
    /// Searches in order:
    /// 1. Environment variable `NOCOMETA_CONFIG`
    /// 2. `./nocometa.toml`
    /// 3. `~/.config/nocometa/config.toml`
    pub fn load() -> Result<Self, SettingsError> {
        if let Ok(path) = env::var("NOCOMETA_CONFIG") {
            return Self::from_file(&path);
        }

        let local_config = PathBuf::from("nocometa.toml");
        if local_config.exists() {
            return Self::from_file(&local_config);
        }

        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join("nocometa").join("config.toml");
            if user_config.exists() {
                return Self::from_file(&user_config);
            }
        }

        Ok(Settings::default())
    }

    /// Get a connection by name.
    pub fn get_connection(&self, name: &str) -> Result<&ConnectionSettings, SettingsError> {
        self.connections
            .get(name)
            .ok_or_else(|| SettingsError::ConnectionNotFound(name.to_string()))
    }

    /// Get the default connection ("default" if it exists, otherwise the first one).
    pub fn default_connection(&self) -> Option<(&str, &ConnectionSettings)> {
        if let Some(conn) = self.connections.get("default") {
            return Some(("default", conn));
        }
        self.connections.iter().next().map(|(k, v)| (k.as_str(), v))
    }

    /// Path of the sqlite metadata store.
    pub fn meta_path(&self) -> Result<PathBuf, SettingsError> {
        if let Some(path) = &self.meta.path {
            return Ok(PathBuf::from(expand_env_vars(path)?));
        }
        let home = dirs::home_dir().ok_or(SettingsError::NoHomeDir)?;
        Ok(home.join(".nocometa").join("meta.db"))
    }

    /// Build the project with one base per configured connection.
    ///
    /// Connections are ordered by name, except that "default" always comes
    /// first so legacy single-base flows pick it up as `bases[0]`.
    pub fn project(&self) -> Result<Project, SettingsError> {
        let mut names: Vec<&String> = self.connections.keys().collect();
        names.sort_by_key(|name| name.as_str() != "default");

        let mut bases = Vec::with_capacity(names.len());
        for name in names {
            let conn = &self.connections[name];
            bases.push(Base {
                id: format!("{}_{}", self.project.id, name),
                project_id: self.project.id.clone(),
                alias: Some(name.clone()),
                dialect: conn.dialect()?,
                config: Some(serde_json::json!({
                    "connection": conn.connection_string,
                })),
                is_meta: conn.is_meta,
                inflection_table: conn.inflection_table.clone(),
                inflection_column: conn.inflection_column.clone(),
            });
        }

        Ok(Project {
            id: self.project.id.clone(),
            title: self.project.title.clone(),
            prefix: self.project.prefix.clone(),
            uuid: None,
            deleted: false,
            bases,
        })
    }

    /// Engine options derived from these settings.
    pub fn sync_options(&self) -> SyncOptions {
        SyncOptions::default().with_ignore_tables(self.sync.ignore_tables.iter().cloned())
    }
}

/// Expand environment variables in a string.
///
/// Supports `${VAR}` and `$VAR` syntax.
pub fn expand_env_vars(s: &str) -> Result<String, SettingsError> {
    let mut result = String::with_capacity(s.len());
    let mut chars = s.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '$' {
            result.push(c);
            continue;
        }

        if chars.peek() == Some(&'{') {
            chars.next();
            let mut var_name = String::new();
            for ch in chars.by_ref() {
                if ch == '}' {
                    break;
                }
                var_name.push(ch);
            }
            let value =
                env::var(&var_name).map_err(|_| SettingsError::MissingEnvVar(var_name.clone()))?;
            result.push_str(&value);
        } else {
            let mut var_name = String::new();
            while let Some(ch) = chars.next_if(|ch| ch.is_alphanumeric() || *ch == '_') {
                var_name.push(ch);
            }
            if var_name.is_empty() {
                result.push('$');
            } else {
                let value = env::var(&var_name)
                    .map_err(|_| SettingsError::MissingEnvVar(var_name.clone()))?;
                result.push_str(&value);
            }
        }
    }

    Ok(result)
}
