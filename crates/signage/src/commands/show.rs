//! Show command implementation

use anyhow::{Result, bail};
use clap::Args;
use signage_store_core::schema::Family;

use super::{CommandContext, detail, print_json};

/// Print one record as JSON
#[derive(Args, Debug)]
pub struct ShowArgs {
    /// Family of the record
    family: Family,

    /// Record id
    id: String,
}

/// Execute the show command
///
/// The record is always printed as JSON; `--json` changes nothing here.
pub async fn execute(ctx: &CommandContext, args: ShowArgs) -> Result<()> {
    match detail(&ctx.session, args.family, &args.id).await? {
        Some(record) => print_json(&record),
        None => bail!("{} entry '{}' not found", args.family, args.id),
    }
}
