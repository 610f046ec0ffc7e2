//! Stats command implementation

use anyhow::Result;
use clap::Args;
use serde_json::json;
use signage_store_core::schema::Family;

use super::{CommandContext, index_rows, print_json};

/// Show storage usage per family
#[derive(Args, Debug)]
pub struct StatsArgs {}

/// Execute the stats command
pub async fn execute(ctx: &CommandContext, _args: StatsArgs) -> Result<()> {
    let usage = ctx.session.storage_usage().await?;

    let mut families = Vec::new();
    for family in Family::ALL {
        let records = index_rows(&ctx.session, family).await?.len();
        let disk = usage.by_directory.get(family.dir()).cloned().unwrap_or_default();
        families.push((family, records, disk));
    }

    if ctx.json {
        let output = json!({
            "root": ctx.session.root().display().to_string(),
            "files": usage.files,
            "directories": usage.directories,
            "totalBytes": usage.total_bytes,
            "families": families.iter().map(|(family, records, disk)| json!({
                "family": family,
                "records": records,
                "files": disk.files,
                "bytes": disk.bytes,
            })).collect::<Vec<_>>(),
        });
        return print_json(&output);
    }

    println!("Store: {}", ctx.session.root().display());
    println!();
    println!("{:<12} {:>8} {:>8} {:>12}", "FAMILY", "RECORDS", "FILES", "BYTES");
    for (family, records, disk) in &families {
        println!("{:<12} {:>8} {:>8} {:>12}", family.to_string(), records, disk.files, disk.bytes);
    }
    println!();
    println!(
        "Total: {} file(s) in {} director{}, {} bytes",
        usage.files,
        usage.directories,
        if usage.directories == 1 { "y" } else { "ies" },
        usage.total_bytes
    );
    Ok(())
}
