//! Refs command implementation

use anyhow::Result;
use clap::Args;
use signage_store_core::UsageTarget;

use super::{CommandContext, print_json};

/// Show which playlists or schedules reference an entity
#[derive(Args, Debug)]
pub struct RefsArgs {
    /// Kind of entity (content, layout, playlist)
    target: UsageTarget,

    /// Entity id
    id: String,
}

/// Execute the refs command
pub async fn execute(ctx: &CommandContext, args: RefsArgs) -> Result<()> {
    let usage = ctx
        .session
        .usage_resolver()
        .compute_usage(&args.id, args.target)
        .await?;

    if ctx.json {
        return print_json(&usage);
    }

    if usage.is_used {
        println!(
            "{} {} is referenced {} time(s) by {} entr{}:",
            args.target,
            args.id,
            usage.usage_count,
            usage.referencing_entities.len(),
            if usage.referencing_entities.len() == 1 { "y" } else { "ies" }
        );
        for reference in &usage.referencing_entities {
            let device = reference
                .device
                .as_deref()
                .map(|device| format!(" [{device}]"))
                .unwrap_or_default();
            println!("  {}  {}{device}  x{}", reference.id, reference.name, reference.count);
        }
    } else {
        println!("{} {} is not referenced", args.target, args.id);
    }

    for failure in &usage.skipped {
        eprintln!("Warning: skipped {}: {}", failure.id, failure.message);
    }
    Ok(())
}
