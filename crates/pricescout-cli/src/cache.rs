//! `cache` subcommands.

use clap::Subcommand;
use pricescout_cache::{CacheType, TwoTierCache};

#[derive(Debug, Subcommand)]
pub enum CacheCommands {
    /// Show hit counters and per-type entry counts
    Stats,
    /// Remove expired entries now
    Cleanup,
    /// Remove entries of one type, or all entries
    Clear {
        /// scraper, contact or agent
        #[arg(long)]
        cache_type: Option<String>,
    },
}

/// # Errors
///
/// Returns an error if the cache type is unknown or the store fails.
pub(crate) async fn run_cache_command(
    cache: &TwoTierCache,
    command: CacheCommands,
    json: bool,
) -> anyhow::Result<()> {
    match command {
        CacheCommands::Stats => {
            let stats = cache.stats();
            let per_type = cache.store_stats().await?;
            if json {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&serde_json::json!({
                        "process": stats,
                        "store": per_type,
                    }))?
                );
                return Ok(());
            }
            if per_type.is_empty() {
                println!("cache is empty");
                return Ok(());
            }
            println!("{:<10}{:>9}{:>9}{:>9}", "TYPE", "ENTRIES", "EXPIRED", "HITS");
            for row in &per_type {
                println!(
                    "{:<10}{:>9}{:>9}{:>9}",
                    row.cache_type, row.entries, row.expired, row.total_hits
                );
            }
        }
        CacheCommands::Cleanup => {
            let removed = cache.cleanup_expired().await?;
            println!("removed {removed} expired entries");
        }
        CacheCommands::Clear { cache_type } => {
            let cache_type = cache_type
                .as_deref()
                .map(str::parse::<CacheType>)
                .transpose()?;
            let removed = cache.clear(cache_type).await?;
            match cache_type {
                Some(t) => println!("removed {removed} {t} entries"),
                None => println!("removed {removed} entries"),
            }
        }
    }
    Ok(())
}
