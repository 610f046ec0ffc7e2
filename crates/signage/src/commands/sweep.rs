//! Sweep command implementation

use anyhow::{Result, bail};
use clap::Args;

use super::{CommandContext, print_json};

/// Delete orphan detail files and unreferenced blobs
#[derive(Args, Debug)]
pub struct SweepArgs {
    /// List what would be deleted without deleting it
    #[arg(long)]
    dry_run: bool,
}

/// Execute the sweep command
pub async fn execute(ctx: &CommandContext, args: SweepArgs) -> Result<()> {
    let report = ctx.session.sweep(args.dry_run).await?;

    if ctx.json {
        print_json(&report)?;
    } else {
        let verb = if args.dry_run { "Would remove" } else { "Removed" };
        for path in &report.removed {
            println!("{verb} {path}");
        }
        println!("{verb} {} file(s)", report.removed.len());
        for failure in &report.errors {
            println!("  error {}: {}", failure.path, failure.message);
        }
    }

    if !report.is_clean() {
        bail!("sweep finished with {} error(s)", report.errors.len());
    }
    Ok(())
}
