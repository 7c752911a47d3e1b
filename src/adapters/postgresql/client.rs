//! PostgreSQL client implementation
//!
//! Connection pooling and TLS setup for the source database.

use crate::config::schema::PostgreSQLConfig;
use crate::config::redact_connection_string;
use crate::domain::{Result, TxnExportError};
use deadpool_postgres::{Manager, ManagerConfig, Pool, RecyclingMethod, Runtime};
use postgres_native_tls::MakeTlsConnector;
use secrecy::ExposeSecret;
use std::time::Duration;
use tokio_postgres::config::SslMode;
use tokio_postgres::error::SqlState;
use tokio_postgres::types::ToSql;
use tokio_postgres::{NoTls, Row};

/// PostgreSQL client for txn-export
///
/// Wraps a deadpool connection pool shared read-only by every partition task.
pub struct PostgreSQLClient {
    /// Connection pool
    pool: Pool,

    /// Connection string with credentials masked, for logs
    safe_connection_string: String,
}

impl PostgreSQLClient {
    /// Create a new PostgreSQL client
    ///
    /// The pool connects lazily; call [`PostgreSQLClient::test_connection`]
    /// to fail fast on an unreachable server.
    ///
    /// # Errors
    ///
    /// Returns a `Configuration` error for an unparsable connection string or
    /// TLS setup failure, and a `Database` error if the pool cannot be built.
    pub fn new(config: &PostgreSQLConfig) -> Result<Self> {
        let raw: &str = config.connection_string.expose_secret().as_ref();
        let mut pg_config: tokio_postgres::Config = raw.parse().map_err(|e| {
            TxnExportError::Configuration(format!("Invalid PostgreSQL connection string: {e}"))
        })?;

        pg_config.options(&format!(
            "-c statement_timeout={}",
            config.statement_timeout_seconds * 1000
        ));
        pg_config.connect_timeout(Duration::from_secs(config.connection_timeout_seconds));

        let manager_config = ManagerConfig {
            recycling_method: RecyclingMethod::Fast,
        };

        let manager = match config.ssl_mode.as_str() {
            "disable" => {
                pg_config.ssl_mode(SslMode::Disable);
                Manager::from_config(pg_config, NoTls, manager_config)
            }
            mode => {
                pg_config.ssl_mode(if mode == "require" {
                    SslMode::Require
                } else {
                    SslMode::Prefer
                });
                let connector = native_tls::TlsConnector::new().map_err(|e| {
                    TxnExportError::Configuration(format!("Failed to initialise TLS: {e}"))
                })?;
                Manager::from_config(pg_config, MakeTlsConnector::new(connector), manager_config)
            }
        };

        let timeout = Some(Duration::from_secs(config.connection_timeout_seconds));
        let pool = Pool::builder(manager)
            .max_size(config.max_connections)
            .runtime(Runtime::Tokio1)
            .wait_timeout(timeout)
            .create_timeout(timeout)
            .recycle_timeout(timeout)
            .build()
            .map_err(|e| {
                TxnExportError::Database(format!("Failed to create connection pool: {e}"))
            })?;

        Ok(Self {
            pool,
            safe_connection_string: redact_connection_string(&config.connection_string),
        })
    }

    /// Test the connection to PostgreSQL
    pub async fn test_connection(&self) -> Result<()> {
        let client = self.get_connection().await?;

        client
            .query_one("SELECT 1", &[])
            .await
            .map_err(|e| TxnExportError::Connection(format!("Connection test failed: {e}")))?;

        tracing::info!(
            server = %self.safe_connection_string,
            "PostgreSQL connection test successful"
        );
        Ok(())
    }

    /// Get a connection from the pool
    ///
    /// # Errors
    ///
    /// Returns a `Connection` error if a connection cannot be obtained.
    pub async fn get_connection(&self) -> Result<deadpool_postgres::Object> {
        self.pool.get().await.map_err(|e| {
            TxnExportError::Connection(format!("Failed to get connection from pool: {e}"))
        })
    }

    /// Execute a query and return rows
    ///
    /// # Errors
    ///
    /// Returns a `Database` error if the query fails.
    pub async fn query(&self, query: &str, params: &[&(dyn ToSql + Sync)]) -> Result<Vec<Row>> {
        self.query_existing(query, params).await?.ok_or_else(|| {
            TxnExportError::Database("Query failed: relation does not exist".to_string())
        })
    }

    /// Execute a query against a table that may not exist yet
    ///
    /// Returns `Ok(None)` when PostgreSQL reports an undefined table.
    pub async fn query_existing(
        &self,
        query: &str,
        params: &[&(dyn ToSql + Sync)],
    ) -> Result<Option<Vec<Row>>> {
        let client = self.get_connection().await?;

        match client.query(query, params).await {
            Ok(rows) => Ok(Some(rows)),
            Err(e) if e.code() == Some(&SqlState::UNDEFINED_TABLE) => Ok(None),
            Err(e) => Err(TxnExportError::Database(format!("Query failed: {e}"))),
        }
    }

    /// Get the connection string (without credentials)
    pub fn connection_string_safe(&self) -> &str {
        &self.safe_connection_string
    }

    /// Get the pool statistics
    pub fn pool_status(&self) -> deadpool_postgres::Status {
        self.pool.status()
    }
}
