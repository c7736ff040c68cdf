// src/probes/sql.rs
use crate::health::{CheckResult, CheckerConfig, HealthChecker, ProbeError};
use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::any::AnyPoolOptions;
use sqlx::AnyPool;
use std::time::Instant;
use tokio::time::timeout;
use tracing::{debug, warn};

/// Runs `SELECT 1` through a lazily connected pool, so authentication and
/// the database handshake are part of every check.
pub struct SqlProbe {
    pool: AnyPool,
    config: CheckerConfig,
}

impl SqlProbe {
    /// Accepts `mysql://` and `postgres://` URLs. No connection is opened
    /// until the first check.
    pub fn new(url: &str, config: CheckerConfig) -> Result<Self> {
        sqlx::any::install_default_drivers();

        let pool = AnyPoolOptions::new()
            .max_connections(1)
            .acquire_timeout(config.timeout)
            .connect_lazy(url)
            .context("Failed to configure database pool")?;

        Ok(Self { pool, config })
    }
}

#[async_trait]
impl HealthChecker for SqlProbe {
    async fn check_health(&self) -> CheckResult {
        let start = Instant::now();
        let result = timeout(
            self.config.timeout,
            sqlx::query("SELECT 1").execute(&self.pool),
        )
        .await;
        let duration = start.elapsed();

        match result {
            Ok(Ok(_)) => {
                debug!(?duration, "Database health check successful");
                CheckResult::up(duration)
            }
            Ok(Err(e)) => {
                warn!(error = %e, "Database health check failed");
                CheckResult::down(ProbeError::Connect(e.to_string()), duration)
            }
            Err(_) => {
                warn!(timeout = ?self.config.timeout, "Database health check timed out");
                CheckResult::down(ProbeError::Timeout(self.config.timeout), duration)
            }
        }
    }

    fn kind(&self) -> &'static str {
        "sql"
    }
}
