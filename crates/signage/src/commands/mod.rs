//! CLI command dispatch and execution

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use serde_json::Value;
use signage_store_core::Session;
use signage_store_core::config::{ConfigOverrides, resolve_config};
use signage_store_core::home::get_home_dir;
use signage_store_core::schema::Family;
use std::path::PathBuf;

mod list;
mod migrate;
mod refs;
mod show;
mod stats;
mod sweep;

/// signage - inspect and maintain a signage content store
#[derive(Parser, Debug)]
#[command(
    name = "signage",
    version,
    about = "Inspect and maintain a signage content store",
    long_about = "A thin CLI over the signage store: contents, layouts, playlists and schedules kept as JSON files under one root directory"
)]
pub struct Cli {
    /// Store root (overrides config and SIGNAGE_STORE_ROOT)
    #[arg(long, global = true)]
    root: Option<PathBuf>,

    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Show storage usage per family
    Stats(stats::StatsArgs),

    /// List the index rows of a family
    List(list::ListArgs),

    /// Print one record as JSON
    Show(show::ShowArgs),

    /// Show which playlists or schedules reference an entity
    Refs(refs::RefsArgs),

    /// Upgrade legacy content records
    Migrate(migrate::MigrateArgs),

    /// Delete orphan detail files and unreferenced blobs
    Sweep(sweep::SweepArgs),
}

/// Shared state handed to every command
pub(crate) struct CommandContext {
    pub session: Session,
    pub json: bool,
}

impl Cli {
    /// Execute the CLI command
    pub async fn execute(self) -> Result<()> {
        // `migrate` reports pending work itself instead of applying it on open
        let auto_migrate = match self.command {
            Commands::Migrate(_) => Some(false),
            _ => None,
        };
        let ctx = self.open(auto_migrate).await?;

        match self.command {
            Commands::Stats(args) => stats::execute(&ctx, args).await,
            Commands::List(args) => list::execute(&ctx, args).await,
            Commands::Show(args) => show::execute(&ctx, args).await,
            Commands::Refs(args) => refs::execute(&ctx, args).await,
            Commands::Migrate(args) => migrate::execute(&ctx, args).await,
            Commands::Sweep(args) => sweep::execute(&ctx, args).await,
        }
    }

    async fn open(&self, auto_migrate: Option<bool>) -> Result<CommandContext> {
        let home_dir = get_home_dir()?;
        let current_dir = std::env::current_dir().context("Could not determine current directory")?;
        let overrides = ConfigOverrides {
            root: self.root.clone(),
            auto_migrate,
            ..Default::default()
        };
        let config = resolve_config(&overrides, &current_dir, &home_dir)?;
        let session = Session::open(&config, &home_dir)
            .await
            .with_context(|| format!("Failed to open store at {}", config.store_root(&home_dir).display()))?;

        Ok(CommandContext {
            session,
            json: self.json,
        })
    }
}

/// Pretty-print any serializable value to stdout
pub(crate) fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Index rows of any family as JSON values
pub(crate) async fn index_rows(session: &Session, family: Family) -> Result<Vec<Value>> {
    let rows = match family {
        Family::Contents => to_values(session.contents().list_index().await?)?,
        Family::Layouts => to_values(session.layouts().list_index().await?)?,
        Family::Playlists => to_values(session.playlists().list_index().await?)?,
        Family::Schedules => to_values(session.schedules().list_index().await?)?,
    };
    Ok(rows)
}

/// One detail record of any family as a JSON value
pub(crate) async fn detail(session: &Session, family: Family, id: &str) -> Result<Option<Value>> {
    let record = match family {
        Family::Contents => session.contents().get_by_id(id).await?.map(serde_json::to_value),
        Family::Layouts => session.layouts().get_by_id(id).await?.map(serde_json::to_value),
        Family::Playlists => session.playlists().get_by_id(id).await?.map(serde_json::to_value),
        Family::Schedules => session.schedules().get_by_id(id).await?.map(serde_json::to_value),
    };
    Ok(record.transpose()?)
}

fn to_values<T: Serialize>(rows: Vec<T>) -> Result<Vec<Value>> {
    rows.into_iter()
        .map(|row| serde_json::to_value(row).map_err(Into::into))
        .collect()
}
