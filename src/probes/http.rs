// src/probes/http.rs
use crate::health::{CheckResult, CheckerConfig, HealthChecker, ProbeError};
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use std::time::Instant;
use tracing::{debug, warn};
use url::Url;

/// Issues a GET against an external endpoint; anything but `200 OK` is DOWN.
pub struct HttpProbe {
    url: Url,
    config: CheckerConfig,
    client: Client,
}

impl HttpProbe {
    pub fn new(url: Url, config: CheckerConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            url,
            config,
            client,
        })
    }
}

#[async_trait]
impl HealthChecker for HttpProbe {
    async fn check_health(&self) -> CheckResult {
        let start = Instant::now();

        // Bounded by the client timeout set in `new`.
        let result = self.client.get(self.url.as_str()).send().await;
        let duration = start.elapsed();

        let error = match result {
            Ok(response) if response.status() == StatusCode::OK => None,
            Ok(response) => Some(ProbeError::UnexpectedStatus(response.status().as_u16())),
            Err(e) if e.is_timeout() => Some(ProbeError::Timeout(self.config.timeout)),
            Err(e) => Some(ProbeError::Request(e.to_string())),
        };

        match error {
            None => {
                debug!(url = %self.url, ?duration, "External API health check successful");
                CheckResult::up(duration)
            }
            Some(error) => {
                warn!(url = %self.url, %error, "External API health check failed");
                CheckResult::down(error, duration)
            }
        }
    }

    fn kind(&self) -> &'static str {
        "http"
    }
}
