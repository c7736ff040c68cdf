// src/probes/mod.rs
mod http;
mod redis;
mod sql;
mod tcp;

pub use self::http::HttpProbe;
pub use self::redis::RedisProbe;
pub use self::sql::SqlProbe;
pub use self::tcp::TcpProbe;

use crate::config::{CheckConfig, ProbeConfig};
use crate::health::HealthChecker;
use anyhow::Result;
use std::sync::Arc;

/// Builds the probe described by a configured check.
pub fn build_probe(check: &CheckConfig) -> Result<Arc<dyn HealthChecker>> {
    let config = check.checker_config();

    let probe: Arc<dyn HealthChecker> = match &check.probe {
        ProbeConfig::Http { url } => Arc::new(HttpProbe::new(url.clone(), config)?),
        ProbeConfig::Tcp { address } => Arc::new(TcpProbe::new(address.clone(), config)),
        ProbeConfig::Redis { url } => Arc::new(RedisProbe::new(url, config)?),
        ProbeConfig::Sql { url } => Arc::new(SqlProbe::new(url, config)?),
    };

    Ok(probe)
}
