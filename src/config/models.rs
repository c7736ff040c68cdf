// src/config/models.rs
use crate::health::CheckerConfig;
use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::time::Duration;
use url::Url;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub metrics: MetricsConfig,
    pub checks: Vec<CheckConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_metrics_port")]
    pub port: u16,
    #[serde(default = "default_metrics_path")]
    pub path: String,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            port: default_metrics_port(),
            path: default_metrics_path(),
        }
    }
}

/// One dependency to probe and the classes it is enrolled in.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckConfig {
    pub name: String,
    pub probe: ProbeConfig,
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,
    #[serde(default = "default_true")]
    pub readiness: bool,
    #[serde(default = "default_true")]
    pub liveness: bool,
}

impl CheckConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    pub fn checker_config(&self) -> CheckerConfig {
        CheckerConfig::new(self.timeout(), self.interval())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ProbeConfig {
    Http { url: Url },
    Tcp { address: String },
    Redis { url: String },
    Sql { url: String },
}

impl Config {
    pub fn validate(&self) -> Result<()> {
        if self.checks.is_empty() {
            bail!("At least one check must be configured");
        }

        let mut names = HashSet::new();
        for check in &self.checks {
            if check.name.trim().is_empty() {
                bail!("Check names must not be empty");
            }
            if !names.insert(check.name.as_str()) {
                bail!("Duplicate check name: {}", check.name);
            }
            if check.timeout_ms == 0 {
                bail!("Check {} has a zero timeout", check.name);
            }
            if check.interval_ms == 0 {
                bail!("Check {} has a zero interval", check.name);
            }
            if !check.readiness && !check.liveness {
                bail!(
                    "Check {} must be enrolled in readiness, liveness or both",
                    check.name
                );
            }
            match &check.probe {
                ProbeConfig::Tcp { address } if address.trim().is_empty() => {
                    bail!("Check {} has an empty TCP address", check.name);
                }
                ProbeConfig::Redis { url } | ProbeConfig::Sql { url } if url.trim().is_empty() => {
                    bail!("Check {} has an empty connection URL", check.name);
                }
                _ => {}
            }
        }

        if self.metrics.enabled && !self.metrics.path.starts_with('/') {
            bail!("Metrics path must start with '/'");
        }

        Ok(())
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_metrics_port() -> u16 {
    9090
}

fn default_metrics_path() -> String {
    "/metrics".to_string()
}

fn default_timeout_ms() -> u64 {
    1000
}

fn default_interval_ms() -> u64 {
    10_000
}

fn default_true() -> bool {
    true
}
