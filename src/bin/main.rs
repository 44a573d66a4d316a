//! nocometa CLI - sync metadata with a live schema
//!
//! Usage:
//!   nocometa [--config <file>] [--connection <name>] populate
//!   nocometa diff [--all]
//!   nocometa sync
//!   nocometa models
//!
//! Examples:
//!   nocometa --snapshot schema.json populate
//!   nocometa --connection sales diff
//!   nocometa --meta ./meta.db sync

use clap::{Parser, Subcommand};
use nocometa::config::{SchemaSource, Settings, SettingsError};
use nocometa::introspect::{open_client, IntrospectError, SnapshotClient, SqlClient};
use nocometa::meta::{Base, MetaStore, Project, SqliteMetaStore, StoreError};
use nocometa::sync::{MetaSync, SyncError, SyncOptions};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "nocometa")]
#[command(about = "Keep spreadsheet metadata in step with a live SQL schema")]
#[command(version)]
struct Cli {
    /// Settings file (defaults to NOCOMETA_CONFIG, ./nocometa.toml, then the user config)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Connection to sync (defaults to "default", else the first one)
    #[arg(long, global = true)]
    connection: Option<String>,

    /// Metadata store path (overrides the settings file)
    #[arg(long, global = true)]
    meta: Option<PathBuf>,

    /// Read the live schema from a JSON snapshot instead of the connection
    #[arg(long, global = true)]
    snapshot: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Import every table and view of the base
    Populate,

    /// Print the drift between live schema and stored metadata as JSON
    Diff {
        /// Include tables and views without changes
        #[arg(long)]
        all: bool,
    },

    /// Apply the drift to the stored metadata
    Sync,

    /// List stored models and their columns
    Models,
}

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error(transparent)]
    Settings(#[from] SettingsError),

    #[error(transparent)]
    Introspect(#[from] IntrospectError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Sync(#[from] SyncError),

    #[error("Failed to render output: {0}")]
    Json(#[from] serde_json::Error),

    #[error("No connection configured; pass --snapshot or add [connections.<name>]")]
    NoConnection,
}

/// Everything one command needs.
struct Context {
    project: Project,
    base: Base,
    client: Box<dyn SqlClient>,
    store: SqliteMetaStore,
    options: SyncOptions,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let settings = match &cli.config {
        Some(path) => Settings::from_file(path),
        None => Settings::load(),
    };
    let settings = match settings {
        Ok(s) => s,
        Err(e) => {
            init_logging(cli.log_level.as_deref(), "info");
            eprintln!("Error loading settings: {}", e);
            return ExitCode::FAILURE;
        }
    };
    init_logging(cli.log_level.as_deref(), &settings.logging.level);

    let result = match open_context(&cli, &settings) {
        Ok(ctx) => match cli.command {
            Commands::Populate => cmd_populate(&ctx).await,
            Commands::Diff { all } => cmd_diff(&ctx, all).await,
            Commands::Sync => cmd_sync(&ctx).await,
            Commands::Models => cmd_models(&ctx).await,
        },
        Err(e) => Err(e),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

/// `--log-level` wins, then `RUST_LOG`, then the settings file.
fn init_logging(cli_level: Option<&str>, default_level: &str) {
    let filter = match cli_level {
        Some(level) => EnvFilter::new(level),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .without_time()
        .init();
}

fn open_context(cli: &Cli, settings: &Settings) -> Result<Context, CliError> {
    let mut project = settings.project()?;

    let base = match &cli.connection {
        Some(name) => {
            settings.get_connection(name)?;
            project
                .bases
                .iter()
                .find(|b| b.alias.as_deref() == Some(name.as_str()))
                .cloned()
        }
        None => project.default_base().cloned(),
    };

    let (base, client): (Base, Box<dyn SqlClient>) = match (&cli.snapshot, base) {
        (Some(path), base) => {
            let client = SnapshotClient::from_file(path)?;
            let base = match base {
                Some(base) => base,
                None => {
                    let base = snapshot_base(&project, &client);
                    project.bases.push(base.clone());
                    base
                }
            };
            (base, Box::new(client))
        }
        (None, Some(base)) => {
            let name = base.alias.clone().unwrap_or_default();
            let source: SchemaSource = settings.get_connection(&name)?.schema_source()?;
            let client = open_client(base.dialect, &source)?;
            (base, client)
        }
        (None, None) => return Err(CliError::NoConnection),
    };

    let meta_path = match &cli.meta {
        Some(path) => path.clone(),
        None => settings.meta_path()?,
    };
    let store = SqliteMetaStore::open(&meta_path)?;

    tracing::debug!(
        base = ?base.redacted(),
        meta = %meta_path.display(),
        "opened context"
    );

    Ok(Context {
        project,
        base,
        client,
        store,
        options: settings.sync_options(),
    })
}

/// A base for a snapshot given without any configured connection.
fn snapshot_base(project: &Project, client: &SnapshotClient) -> Base {
    Base {
        id: format!("{}_default", project.id),
        project_id: project.id.clone(),
        alias: Some("default".to_string()),
        dialect: client.dialect(),
        config: None,
        is_meta: false,
        inflection_table: None,
        inflection_column: None,
    }
}

fn engine(ctx: &Context) -> MetaSync<'_> {
    MetaSync::new(ctx.client.as_ref(), &ctx.store, ctx.options.clone())
}

async fn cmd_populate(ctx: &Context) -> Result<(), CliError> {
    let report = engine(ctx).populate(&ctx.base, &ctx.project).await?;
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

async fn cmd_diff(ctx: &Context, all: bool) -> Result<(), CliError> {
    let mut diffs = engine(ctx).compute_diff(&ctx.base, &ctx.project).await?;
    if !all {
        diffs.retain(|d| !d.is_empty());
    }
    println!("{}", serde_json::to_string_pretty(&diffs)?);
    Ok(())
}

async fn cmd_sync(ctx: &Context) -> Result<(), CliError> {
    let report = engine(ctx).apply_diff(&ctx.base, &ctx.project).await?;
    println!(
        "Applied {} change(s), skipped {}",
        report.applied, report.skipped
    );
    Ok(())
}

async fn cmd_models(ctx: &Context) -> Result<(), CliError> {
    let models = ctx.store.list_models(&ctx.base.id).await?;
    if models.is_empty() {
        println!("No models stored for base '{}'", ctx.base.id);
        return Ok(());
    }

    for model in models {
        let junction = if model.mm { " [mm]" } else { "" };
        println!(
            "{:>3}  {} ({}, {}){}",
            model.order, model.title, model.table_name, model.model_type, junction
        );

        for column in ctx.store.list_columns(&model.id).await? {
            let mut flags = Vec::new();
            if column.pk {
                flags.push("pk");
            }
            if column.pv {
                flags.push("pv");
            }
            if column.system {
                flags.push("system");
            }
            if let Some(link) = column.link() {
                flags.push(link.relation_type.as_str());
            }
            let flags = if flags.is_empty() {
                String::new()
            } else {
                format!(" [{}]", flags.join(", "))
            };
            let name = column
                .column_name
                .as_deref()
                .map(|n| format!(" ({})", n))
                .unwrap_or_default();
            println!("       - {}{}: {}{}", column.title, name, column.uidt, flags);
        }
    }
    Ok(())
}
