//! Migrate command implementation

use anyhow::{Result, bail};
use clap::Args;
use serde_json::json;

use super::{CommandContext, print_json};

/// Upgrade legacy content records
#[derive(Args, Debug)]
pub struct MigrateArgs {
    /// Only report whether a migration is pending
    #[arg(long)]
    check: bool,
}

/// Execute the migrate command
pub async fn execute(ctx: &CommandContext, args: MigrateArgs) -> Result<()> {
    let runner = ctx.session.migrations();

    if args.check {
        let pending = runner.needs_migration().await?;
        if ctx.json {
            return print_json(&json!({ "migrationNeeded": pending }));
        }
        if pending {
            println!("Migration needed: legacy content records found");
        } else {
            println!("Up to date");
        }
        return Ok(());
    }

    let report = runner.run_migration().await?;
    if ctx.json {
        print_json(&report)?;
    } else {
        println!("Migrated {} record(s)", report.migrated_count);
        for failure in &report.errors {
            println!("  failed {}: {}", failure.id, failure.message);
        }
    }

    if !report.errors.is_empty() {
        bail!("{} record(s) could not be migrated", report.errors.len());
    }
    Ok(())
}
