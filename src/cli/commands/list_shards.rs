//! List shards command implementation
//!
//! This module implements the `list-shards` command, which shows the shard
//! tables a full-history export would cover.

use super::{connect_store, exit_code_for, EXIT_CONFIG, EXIT_SUCCESS};
use crate::config::load_config;
use crate::core::shard::ShardResolver;
use clap::Args;
use serde::Serialize;

/// Arguments for the list-shards command
#[derive(Args, Debug, Default)]
pub struct ListShardsArgs {
    /// Also read each shard's block number bounds
    #[arg(long)]
    pub bounds: bool,

    /// Print the list as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Serialize)]
struct ShardListing {
    table: String,
    date: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    low: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    high: Option<i64>,
}

impl ListShardsArgs {
    /// Execute the list-shards command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        let config = match load_config(config_path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("Configuration error: {e}");
                return Ok(EXIT_CONFIG);
            }
        };

        let store = match connect_store(&config) {
            Ok(store) => store,
            Err(e) => {
                eprintln!("Failed to connect: {e}");
                return Ok(exit_code_for(&e));
            }
        };

        if let Err(e) = store.ping().await {
            eprintln!("Failed to connect: {e}");
            return Ok(exit_code_for(&e));
        }

        let resolver = ShardResolver::from_config(&config.shards);
        let shards = match resolver.list_all_shards(store.as_ref()).await {
            Ok(shards) => shards,
            Err(e) => {
                tracing::error!(error = %e, "Failed to list shards");
                eprintln!("Failed to list shards: {e}");
                return Ok(exit_code_for(&e));
            }
        };

        let mut listings = Vec::with_capacity(shards.len());
        for shard in &shards {
            let (low, high) = if self.bounds {
                match store.sequence_bounds(shard).await {
                    Ok(Some(bounds)) => (Some(bounds.low), Some(bounds.high)),
                    Ok(None) => (None, None),
                    Err(e) => {
                        tracing::warn!(shard = %shard, error = %e, "Failed to read bounds");
                        (None, None)
                    }
                }
            } else {
                (None, None)
            };

            listings.push(ShardListing {
                table: shard.table_name().to_string(),
                date: shard.date().to_string(),
                low,
                high,
            });
        }

        if self.json {
            println!("{}", serde_json::to_string_pretty(&listings)?);
            return Ok(EXIT_SUCCESS);
        }

        if listings.is_empty() {
            println!(
                "No shard tables found with prefix '{}' since {}",
                resolver.prefix(),
                resolver.history_start()
            );
            return Ok(EXIT_SUCCESS);
        }

        println!("📋 {} shard table(s):", listings.len());
        for listing in &listings {
            match (listing.low, listing.high) {
                (Some(low), Some(high)) => {
                    println!("  {}  blocks {}..={}", listing.table, low, high)
                }
                _ if self.bounds => println!("  {}  (empty)", listing.table),
                _ => println!("  {}", listing.table),
            }
        }

        Ok(EXIT_SUCCESS)
    }
}
