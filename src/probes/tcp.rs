// src/probes/tcp.rs
use crate::health::{CheckResult, CheckerConfig, HealthChecker, ProbeError};
use async_trait::async_trait;
use std::time::Instant;
use tokio::net::TcpStream;
use tokio::time::timeout;
use tracing::{debug, warn};

/// Dials a TCP address (database, cache or broker port) and closes the
/// connection straight away.
pub struct TcpProbe {
    address: String,
    config: CheckerConfig,
}

impl TcpProbe {
    pub fn new(address: impl Into<String>, config: CheckerConfig) -> Self {
        Self {
            address: address.into(),
            config,
        }
    }
}

#[async_trait]
impl HealthChecker for TcpProbe {
    async fn check_health(&self) -> CheckResult {
        let start = Instant::now();
        let result = timeout(self.config.timeout, TcpStream::connect(&self.address)).await;
        let duration = start.elapsed();

        match result {
            Ok(Ok(_stream)) => {
                debug!(address = %self.address, ?duration, "TCP health check successful");
                CheckResult::up(duration)
            }
            Ok(Err(e)) => {
                warn!(address = %self.address, error = %e, "TCP health check failed");
                CheckResult::down(ProbeError::Connect(e.to_string()), duration)
            }
            Err(_) => {
                warn!(address = %self.address, timeout = ?self.config.timeout, "TCP health check timed out");
                CheckResult::down(ProbeError::Timeout(self.config.timeout), duration)
            }
        }
    }

    fn kind(&self) -> &'static str {
        "tcp"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::health::HealthStatus;
    use std::time::Duration;
    use tokio::net::TcpListener;

    fn config() -> CheckerConfig {
        CheckerConfig::new(Duration::from_secs(1), Duration::from_secs(10))
    }

    #[tokio::test]
    async fn test_listening_port_is_up() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let probe = TcpProbe::new(addr.to_string(), config());
        let result = probe.check_health().await;

        assert_eq!(result.status, HealthStatus::Up);
    }

    #[tokio::test]
    async fn test_closed_port_is_down() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let probe = TcpProbe::new(addr.to_string(), config());
        let result = probe.check_health().await;

        assert_eq!(result.status, HealthStatus::Down);
        assert!(matches!(result.error, Some(ProbeError::Connect(_))));
    }
}
