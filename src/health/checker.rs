// src/health/checker.rs
use async_trait::async_trait;
use std::time::Duration;

use super::status::CheckResult;

/// A single health test against one dependency.
///
/// Implementations bound their own execution time with the timeout they were
/// constructed with, measure elapsed time themselves and keep no state
/// between calls.
#[async_trait]
pub trait HealthChecker: Send + Sync {
    async fn check_health(&self) -> CheckResult;

    /// Short label used in logs, e.g. `"http"` or `"tcp"`.
    fn kind(&self) -> &'static str;
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProbeError {
    #[error("timed out after {0:?}")]
    Timeout(Duration),

    #[error("{0}")]
    Connect(String),

    #[error("received status code {0}")]
    UnexpectedStatus(u16),

    #[error("{0}")]
    Request(String),

    #[error("check panicked: {0}")]
    Panicked(String),
}
