//! Export command implementation
//!
//! This module implements the `export` command. Without a scope flag it
//! exports yesterday, which is what the daily scheduled job runs.

use super::{connect_store, exit_code_for, EXIT_CONFIG, EXIT_PARTIAL, EXIT_SUCCESS};
use crate::config::{load_config, ExportConfig, OutputLayout};
use crate::core::export::{parse_date, parse_datetime, ExportCoordinator, ExportRun, ExportSummary};
use crate::domain::Result;
use crate::log_error_with_context;
use chrono::{Local, NaiveDate};
use clap::Args;

/// Arguments for the export command
#[derive(Args, Debug, Default)]
pub struct ExportArgs {
    /// Export one day (YYYYMMDD or YYYY-MM-DD)
    #[arg(long, conflicts_with_all = ["from", "to", "all"])]
    pub date: Option<String>,

    /// Start of a time window, inclusive (YYYYMMDDHHMMSS or "YYYY-MM-DD HH:MM:SS")
    #[arg(long, requires = "to", conflicts_with = "all")]
    pub from: Option<String>,

    /// End of a time window, exclusive (YYYYMMDDHHMMSS or "YYYY-MM-DD HH:MM:SS")
    #[arg(long, requires = "from", conflicts_with = "all")]
    pub to: Option<String>,

    /// Export every shard in the catalog
    #[arg(long)]
    pub all: bool,

    /// Last day included by --all (YYYYMMDD or YYYY-MM-DD)
    #[arg(long, requires = "all")]
    pub until: Option<String>,

    /// Override the output layout (single, per_shard, per_partition)
    #[arg(long, value_parser = parse_layout)]
    pub layout: Option<OutputLayout>,

    /// Override the output directory
    #[arg(long)]
    pub output_dir: Option<String>,

    /// Dry run mode - count and sum without writing files
    #[arg(long)]
    pub dry_run: bool,

    /// Print the summary as JSON
    #[arg(long)]
    pub json: bool,

    /// Skip confirmation prompt
    #[arg(short, long)]
    pub yes: bool,
}

fn parse_layout(value: &str) -> std::result::Result<OutputLayout, String> {
    match value {
        "single" => Ok(OutputLayout::Single),
        "per_shard" | "per-shard" => Ok(OutputLayout::PerShard),
        "per_partition" | "per-partition" => Ok(OutputLayout::PerPartition),
        other => Err(format!(
            "invalid layout '{other}' (expected single, per_shard or per_partition)"
        )),
    }
}

impl ExportArgs {
    /// Turn the flags into a run; `today` anchors the default previous-day run
    pub fn build_run(&self, today: NaiveDate, config: &ExportConfig) -> Result<ExportRun> {
        if let Some(date) = &self.date {
            return Ok(ExportRun::single_date(parse_date(date)?, config));
        }
        if let (Some(from), Some(to)) = (&self.from, &self.to) {
            return Ok(ExportRun::range(
                parse_datetime(from)?,
                parse_datetime(to)?,
                config,
            ));
        }
        if self.all {
            let until = self.until.as_deref().map(parse_date).transpose()?;
            return Ok(ExportRun::from_beginning(until, config));
        }
        ExportRun::previous_day(today, config)
    }

    /// Execute the export command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        tracing::info!("Starting export command");

        let mut config = match load_config(config_path) {
            Ok(config) => config,
            Err(e) => {
                log_error_with_context!(&e, "Failed to load configuration");
                eprintln!("Configuration error: {e}");
                return Ok(EXIT_CONFIG);
            }
        };

        if let Some(layout) = self.layout {
            tracing::info!(layout = %layout, "Overriding output layout from CLI");
            config.export.layout = layout;
        }
        if let Some(output_dir) = &self.output_dir {
            tracing::info!(output_dir = %output_dir, "Overriding output directory from CLI");
            config.export.output_dir = output_dir.clone();
        }
        if self.dry_run {
            tracing::info!("Enabling dry-run mode from CLI");
            config.export.dry_run = true;
        }

        if let Err(e) = config.validate() {
            log_error_with_context!(&e, "Configuration validation failed");
            eprintln!("Configuration validation failed: {e}");
            return Ok(EXIT_CONFIG);
        }

        let run = match self.build_run(Local::now().date_naive(), &config.export) {
            Ok(run) => run,
            Err(e) => {
                eprintln!("Invalid export parameters: {e}");
                return Ok(exit_code_for(&e));
            }
        };

        if run.dry_run && !self.json {
            println!("🔍 DRY RUN MODE - No files will be written");
            println!();
        }

        if !self.yes && !run.dry_run && !confirm(&run)? {
            println!("Export cancelled.");
            return Ok(EXIT_SUCCESS);
        }

        let store = match connect_store(&config) {
            Ok(store) => store,
            Err(e) => {
                log_error_with_context!(&e, "Failed to create store");
                eprintln!("Failed to initialize export: {e}");
                return Ok(exit_code_for(&e));
            }
        };

        let coordinator = ExportCoordinator::new(config, store);

        if !self.json {
            println!("🚀 Starting export {}...", run.label());
            println!();
        }

        let summary = match coordinator.run_export(&run).await {
            Ok(summary) => summary,
            Err(e) => {
                tracing::error!(error = %e, "Export failed");
                eprintln!("Export failed: {e}");
                return Ok(exit_code_for(&e));
            }
        };

        summary.log_summary();

        if self.json {
            println!("{}", serde_json::to_string_pretty(&summary)?);
        } else {
            print_summary(&summary);
        }

        Ok(if summary.is_successful() {
            EXIT_SUCCESS
        } else {
            EXIT_PARTIAL
        })
    }
}

fn confirm(run: &ExportRun) -> anyhow::Result<bool> {
    use std::io::{self, Write};

    println!("Export Configuration:");
    println!("  Run: {}", run.label());
    println!("  Layout: {}", run.layout);
    println!("  Output: {}", run.output_dir.display());
    println!("  Partition size: {}", run.partition_size);
    println!();
    print!("Proceed with export? [y/N]: ");
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    Ok(input.trim().eq_ignore_ascii_case("y"))
}

fn print_summary(summary: &ExportSummary) {
    println!();
    println!("📊 Export Summary:");
    println!("  Run ID: {}", summary.run_id);
    println!("  Records: {}", summary.total_records);
    println!("  Amount: {}", summary.total_amount);
    println!(
        "  Shards: {} in scope, {} exported, {} skipped",
        summary.shards_in_scope, summary.shards_exported, summary.shards_skipped
    );
    println!(
        "  Partitions: {} dispatched, {} failed",
        summary.partitions_dispatched, summary.partitions_failed
    );
    if summary.rows_failed > 0 {
        println!("  Rows failed: {}", summary.rows_failed);
    }
    println!("  Duration: {:.2}s", summary.duration.as_secs_f64());
    println!();

    if !summary.files.is_empty() {
        println!("📁 Output:");
        for file in &summary.files {
            println!(
                "  - {} ({} records, amount {})",
                file.location, file.records, file.amount
            );
        }
        println!();
    }

    if !summary.errors.is_empty() {
        println!("⚠️  Errors encountered:");
        for error in &summary.errors {
            println!("  - {:?}: {}", error.error_type, error.message);
            if let Some(context) = &error.context {
                println!("    Context: {context}");
            }
        }
        println!();
        println!("⚠️  Export completed with errors");
    } else {
        println!("✅ Export completed successfully!");
    }
}
