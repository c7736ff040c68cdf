// src/probes/redis.rs
use crate::health::{CheckResult, CheckerConfig, HealthChecker, ProbeError};
use anyhow::{Context, Result};
use async_trait::async_trait;
use redis::Client;
use std::time::Instant;
use tokio::time::timeout;
use tracing::{debug, warn};

/// Opens a connection and sends `PING`; only a `PONG` reply counts as UP.
pub struct RedisProbe {
    client: Client,
    config: CheckerConfig,
}

impl RedisProbe {
    pub fn new(url: &str, config: CheckerConfig) -> Result<Self> {
        let client = Client::open(url).context("Failed to create Redis client")?;
        Ok(Self { client, config })
    }

    async fn ping(&self) -> Result<(), ProbeError> {
        let mut conn = self
            .client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| ProbeError::Connect(e.to_string()))?;

        let reply: String = redis::cmd("PING")
            .query_async(&mut conn)
            .await
            .map_err(|e| ProbeError::Request(e.to_string()))?;

        if reply == "PONG" {
            Ok(())
        } else {
            Err(ProbeError::Request(format!("unexpected PING reply: {reply}")))
        }
    }
}

#[async_trait]
impl HealthChecker for RedisProbe {
    async fn check_health(&self) -> CheckResult {
        let start = Instant::now();
        let result = timeout(self.config.timeout, self.ping()).await;
        let duration = start.elapsed();

        let error = match result {
            Ok(Ok(())) => None,
            Ok(Err(e)) => Some(e),
            Err(_) => Some(ProbeError::Timeout(self.config.timeout)),
        };

        match error {
            None => {
                debug!(?duration, "Redis health check successful");
                CheckResult::up(duration)
            }
            Some(error) => {
                warn!(%error, "Redis health check failed");
                CheckResult::down(error, duration)
            }
        }
    }

    fn kind(&self) -> &'static str {
        "redis"
    }
}
