//! Postgres probe queries.
//!
//! A probe batch runs under one deadline and stops at the first connection
//! failure, so an unreachable database costs at most one acquire timeout.

use std::time::Duration;

use tokio::time;

use sqlx::postgres::{PgConnectOptions, PgPool, PgPoolOptions};

use crate::config::DatabaseConfig;
use crate::outbound::OutboundError;

/// Outcome of a batch of probe queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ProbeSummary {
    pub succeeded: u32,
    pub failed: u32,
}

/// Lazily connected Postgres pool.
#[derive(Debug, Clone)]
pub struct Database {
    pool: PgPool,
    query_count: u32,
    probe_timeout: Duration,
}

impl Database {
    /// Build the pool without opening a connection.
    pub fn connect_lazy(config: &DatabaseConfig) -> Self {
        let options = PgConnectOptions::new()
            .host(&config.host)
            .port(config.port)
            .username(&config.user)
            .password(&config.password)
            .database(&config.dbname);

        let pool = PgPoolOptions::new()
            .max_connections(5)
            .acquire_timeout(Duration::from_secs(config.acquire_timeout_secs))
            .connect_lazy_with(options);

        Self {
            pool,
            query_count: config.query_count,
            probe_timeout: Duration::from_secs(config.probe_timeout_secs),
        }
    }

    /// Check connectivity with a single query.
    pub async fn ping(&self) -> Result<(), OutboundError> {
        self.select_one().await?;
        Ok(())
    }

    async fn select_one(&self) -> Result<i32, sqlx::Error> {
        let value: i32 = sqlx::query_scalar("SELECT 1").fetch_one(&self.pool).await?;
        Ok(value)
    }

    /// Run the configured number of `SELECT 1` queries, logging failures.
    ///
    /// Queries not attempted because of a connection failure or the batch
    /// deadline count as failed.
    pub async fn run_probe_queries(&self) -> ProbeSummary {
        let mut summary = ProbeSummary::default();

        let batch = async {
            for i in 0..self.query_count {
                tracing::info!(query = i, "Making SQL request to database");
                match self.select_one().await {
                    Ok(_) => summary.succeeded += 1,
                    Err(e) if is_connection_error(&e) => {
                        tracing::error!(query = i, error = %e, "Database unreachable, skipping remaining SQL requests");
                        break;
                    }
                    Err(e) => tracing::error!(query = i, error = %e, "SQL request failed"),
                }
            }
        };
        if time::timeout(self.probe_timeout, batch).await.is_err() {
            tracing::error!(
                timeout_secs = self.probe_timeout.as_secs(),
                "SQL requests exceeded their deadline"
            );
        }

        summary.failed = self.query_count - summary.succeeded;
        summary
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}

fn is_connection_error(error: &sqlx::Error) -> bool {
    matches!(
        error,
        sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) | sqlx::Error::Tls(_)
    )
}
