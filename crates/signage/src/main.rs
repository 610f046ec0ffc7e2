//! signage - inspect and maintain a signage content store
//!
//! A thin CLI over `signage-store-core`: storage statistics, index listings,
//! record dumps, usage lookups, schema migration and garbage collection.

use clap::Parser;

mod commands;

use commands::Cli;

#[tokio::main(flavor = "current_thread")]
async fn main() {
    signage_store_core::logging::init();
    let cli = Cli::parse();

    if let Err(e) = cli.execute().await {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}
