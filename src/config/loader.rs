//! Configuration loader with TOML parsing and environment variable overrides

use super::schema::{AmountScale, OutputLayout, TxnExportConfig};
use super::secret::secret_string;
use crate::domain::errors::TxnExportError;
use crate::domain::result::Result;
use regex::Regex;
use std::fs;
use std::path::Path;

/// Loads configuration from a TOML file
///
/// This function:
/// 1. Reads the TOML file
/// 2. Performs environment variable substitution (${VAR} syntax)
/// 3. Parses the TOML into TxnExportConfig
/// 4. Applies environment variable overrides (TXN_EXPORT_* prefix)
/// 5. Validates the configuration
///
/// # Errors
///
/// Returns a `Configuration` error if the file cannot be read or parsed, a
/// referenced variable is unset, or validation fails.
///
/// # Examples
///
/// ```no_run
/// use txn_export::config::loader::load_config;
///
/// let config = load_config("txn-export.toml").expect("Failed to load config");
/// ```
pub fn load_config(path: impl AsRef<Path>) -> Result<TxnExportConfig> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(TxnExportError::Configuration(format!(
            "Configuration file not found: {}",
            path.display()
        )));
    }

    let contents = fs::read_to_string(path).map_err(|e| {
        TxnExportError::Configuration(format!(
            "Failed to read configuration file {}: {}",
            path.display(),
            e
        ))
    })?;

    parse_config(&contents)
}

/// Parses configuration text, applying substitution, overrides and validation
pub fn parse_config(contents: &str) -> Result<TxnExportConfig> {
    let contents = substitute_env_vars(contents)?;

    let mut config: TxnExportConfig = toml::from_str(&contents)
        .map_err(|e| TxnExportError::Configuration(format!("Failed to parse TOML: {e}")))?;

    apply_env_overrides(&mut config)?;

    config.validate().map_err(|e| {
        TxnExportError::Configuration(format!("Configuration validation failed: {e}"))
    })?;

    Ok(config)
}

/// Substitutes environment variables in the format ${VAR_NAME}
///
/// Comment lines are copied untouched so documented placeholders do not have
/// to be set.
fn substitute_env_vars(input: &str) -> Result<String> {
    let re = Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}")
        .map_err(|e| TxnExportError::Other(format!("Invalid substitution pattern: {e}")))?;
    let mut result = String::new();
    let mut missing_vars = Vec::new();

    for line in input.lines() {
        if line.trim_start().starts_with('#') {
            result.push_str(line);
            result.push('\n');
            continue;
        }

        let mut processed_line = line.to_string();
        for cap in re.captures_iter(line) {
            let var_name = &cap[1];
            match std::env::var(var_name) {
                Ok(value) => {
                    let placeholder = format!("${{{var_name}}}");
                    processed_line = processed_line.replace(&placeholder, &value);
                }
                Err(_) => {
                    if !missing_vars.contains(&var_name.to_string()) {
                        missing_vars.push(var_name.to_string());
                    }
                }
            }
        }
        result.push_str(&processed_line);
        result.push('\n');
    }

    if !missing_vars.is_empty() {
        return Err(TxnExportError::Configuration(format!(
            "Missing required environment variables: {}",
            missing_vars.join(", ")
        )));
    }

    Ok(result)
}

/// Applies environment variable overrides using the TXN_EXPORT_* prefix
///
/// Variables follow the pattern TXN_EXPORT_<SECTION>_<KEY>, for example
/// TXN_EXPORT_EXPORT_PARTITION_SIZE or TXN_EXPORT_POSTGRESQL_CONNECTION_STRING.
fn apply_env_overrides(config: &mut TxnExportConfig) -> Result<()> {
    // Application overrides
    if let Ok(val) = std::env::var("TXN_EXPORT_APPLICATION_LOG_LEVEL") {
        config.application.log_level = val;
    }

    // PostgreSQL overrides
    if let Ok(val) = std::env::var("TXN_EXPORT_POSTGRESQL_CONNECTION_STRING") {
        config.postgresql.connection_string = secret_string(val);
    }
    if let Ok(val) = std::env::var("TXN_EXPORT_POSTGRESQL_MAX_CONNECTIONS") {
        if let Ok(max) = val.parse() {
            config.postgresql.max_connections = max;
        }
    }
    if let Ok(val) = std::env::var("TXN_EXPORT_POSTGRESQL_SSL_MODE") {
        config.postgresql.ssl_mode = val;
    }

    // Shard overrides
    if let Ok(val) = std::env::var("TXN_EXPORT_SHARDS_SCHEMA") {
        config.shards.schema = val;
    }
    if let Ok(val) = std::env::var("TXN_EXPORT_SHARDS_TABLE_PREFIX") {
        config.shards.table_prefix = val;
    }

    // Export overrides
    if let Ok(val) = std::env::var("TXN_EXPORT_EXPORT_OUTPUT_DIR") {
        config.export.output_dir = val;
    }
    if let Ok(val) = std::env::var("TXN_EXPORT_EXPORT_FILE_PREFIX") {
        config.export.file_prefix = val;
    }
    if let Ok(val) = std::env::var("TXN_EXPORT_EXPORT_PARTITION_SIZE") {
        if let Ok(size) = val.parse() {
            config.export.partition_size = size;
        }
    }
    if let Ok(val) = std::env::var("TXN_EXPORT_EXPORT_MAX_CONCURRENCY") {
        if let Ok(concurrency) = val.parse() {
            config.export.max_concurrency = concurrency;
        }
    }
    if let Ok(val) = std::env::var("TXN_EXPORT_EXPORT_LAYOUT") {
        config.export.layout = match val.as_str() {
            "single" => OutputLayout::Single,
            "per_shard" => OutputLayout::PerShard,
            "per_partition" => OutputLayout::PerPartition,
            other => {
                return Err(TxnExportError::Configuration(format!(
                    "Invalid TXN_EXPORT_EXPORT_LAYOUT '{other}'. Must be one of: single, per_shard, per_partition"
                )))
            }
        };
    }
    if let Ok(val) = std::env::var("TXN_EXPORT_EXPORT_AMOUNT_SCALE") {
        config.export.amount_scale = match val.as_str() {
            "major" => AmountScale::Major,
            "minor" => AmountScale::Minor,
            other => {
                return Err(TxnExportError::Configuration(format!(
                    "Invalid TXN_EXPORT_EXPORT_AMOUNT_SCALE '{other}'. Must be one of: major, minor"
                )))
            }
        };
    }
    if let Ok(val) = std::env::var("TXN_EXPORT_EXPORT_DRY_RUN") {
        config.export.dry_run = val.parse().unwrap_or(false);
    }

    // Logging overrides
    if let Ok(val) = std::env::var("TXN_EXPORT_LOGGING_LOCAL_ENABLED") {
        config.logging.local_enabled = val.parse().unwrap_or(false);
    }
    if let Ok(val) = std::env::var("TXN_EXPORT_LOGGING_LOCAL_PATH") {
        config.logging.local_path = val;
    }

    Ok(())
}
