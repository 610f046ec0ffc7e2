//! List command implementation

use anyhow::Result;
use clap::Args;
use signage_store_core::schema::Family;

use super::{CommandContext, index_rows, print_json};

/// List the index rows of a family
#[derive(Args, Debug)]
pub struct ListArgs {
    /// Family to list (contents, layouts, playlists, schedules)
    family: Family,
}

/// Execute the list command
pub async fn execute(ctx: &CommandContext, args: ListArgs) -> Result<()> {
    let rows = index_rows(&ctx.session, args.family).await?;

    if ctx.json {
        return print_json(&rows);
    }

    if rows.is_empty() {
        println!("No {} stored", args.family);
        return Ok(());
    }

    for row in &rows {
        let id = row["id"].as_str().unwrap_or("?");
        let name = row["name"].as_str().unwrap_or("");
        println!("{id}  {name}");
    }
    println!();
    println!("{} {}", rows.len(), args.family);
    Ok(())
}
