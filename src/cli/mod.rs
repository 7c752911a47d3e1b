//! CLI interface and argument parsing
//!
//! This module provides the command-line interface for txn-export using clap.

pub mod commands;

use clap::{Parser, Subcommand};

/// txn-export - Sharded transaction exporter
#[derive(Parser, Debug)]
#[command(name = "txn-export")]
#[command(version, about, long_about = None)]
#[command(author = "txn-export Contributors")]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "txn-export.toml", env = "TXN_EXPORT_CONFIG")]
    pub config: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, env = "TXN_EXPORT_LOG_LEVEL")]
    pub log_level: Option<String>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Export transactions for a day, a time window or the whole history
    Export(commands::export::ExportArgs),

    /// List the shard tables present in the database
    ListShards(commands::list_shards::ListShardsArgs),

    /// Validate configuration file
    ValidateConfig(commands::validate::ValidateArgs),

    /// Initialize a new configuration file
    Init(commands::init::InitArgs),
}
