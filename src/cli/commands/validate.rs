//! Validate config command implementation
//!
//! This module implements the `validate-config` command for validating
//! the txn-export configuration file.

use super::{connect_store, exit_code_for, EXIT_CONFIG, EXIT_SUCCESS};
use crate::config::{load_config, redact_connection_string};
use clap::Args;

/// Arguments for the validate-config command
#[derive(Args, Debug, Default)]
pub struct ValidateArgs {
    /// Also check that the database is reachable
    #[arg(long)]
    pub check_connection: bool,
}

impl ValidateArgs {
    /// Execute the validate-config command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        tracing::info!(config_path = %config_path, "Validating configuration");

        println!("🔍 Validating configuration file: {config_path}");
        println!();

        // Loading also validates
        let config = match load_config(config_path) {
            Ok(c) => {
                println!("✅ Configuration is valid");
                c
            }
            Err(e) => {
                println!("❌ Configuration is invalid");
                println!("   Error: {e}");
                return Ok(EXIT_CONFIG);
            }
        };

        println!();
        println!("Configuration Summary:");
        println!("  Log Level: {}", config.application.log_level);
        println!(
            "  PostgreSQL: {}",
            redact_connection_string(&config.postgresql.connection_string)
        );
        println!("  Max Connections: {}", config.postgresql.max_connections);
        println!("  Schema: {}", config.shards.schema);
        println!("  Table Prefix: {}", config.shards.table_prefix);
        println!("  History Start: {}", config.shards.history_start);
        println!("  Output Directory: {}", config.export.output_dir);
        println!("  Layout: {}", config.export.layout);
        println!("  Partition Size: {}", config.export.partition_size);
        println!("  Max Concurrency: {}", config.export.max_concurrency);
        println!();

        if self.check_connection {
            let reachable = match connect_store(&config) {
                Ok(store) => store.ping().await,
                Err(e) => Err(e),
            };
            if let Err(e) = reachable {
                println!("❌ Database is not reachable");
                println!("   Error: {e}");
                return Ok(exit_code_for(&e));
            }
            println!("✅ Database is reachable");
        }

        Ok(EXIT_SUCCESS)
    }
}
