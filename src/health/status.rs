// src/health/status.rs
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

use super::checker::ProbeError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HealthStatus {
    Up,
    Down,
}

impl HealthStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            HealthStatus::Up => "UP",
            HealthStatus::Down => "DOWN",
        }
    }
}

/// Which aggregate a check contributes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckClass {
    Readiness,
    Liveness,
}

impl CheckClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            CheckClass::Readiness => "readiness",
            CheckClass::Liveness => "liveness",
        }
    }
}

impl fmt::Display for CheckClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-checker timing configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CheckerConfig {
    pub timeout: Duration,
    pub interval: Duration,
}

impl CheckerConfig {
    pub fn new(timeout: Duration, interval: Duration) -> Self {
        Self { timeout, interval }
    }
}

/// Outcome of a single probe call. Never stored directly.
#[derive(Debug, Clone)]
pub struct CheckResult {
    pub status: HealthStatus,
    pub error: Option<ProbeError>,
    pub duration: Duration,
}

impl CheckResult {
    pub fn up(duration: Duration) -> Self {
        Self {
            status: HealthStatus::Up,
            error: None,
            duration,
        }
    }

    pub fn down(error: ProbeError, duration: Duration) -> Self {
        Self {
            status: HealthStatus::Down,
            error: Some(error),
            duration,
        }
    }

    pub fn is_up(&self) -> bool {
        self.status == HealthStatus::Up
    }
}

/// Stored snapshot for one `(name, class)` pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusEntry {
    pub name: String,
    pub status: HealthStatus,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub error: String,
    pub duration: String,
}

impl StatusEntry {
    pub fn from_result(name: &str, result: &CheckResult) -> Self {
        Self {
            name: name.to_string(),
            status: result.status,
            error: result
                .error
                .as_ref()
                .map(|e| e.to_string())
                .unwrap_or_default(),
            duration: format_duration(result.duration),
        }
    }

    pub fn is_down(&self) -> bool {
        self.status == HealthStatus::Down
    }
}

/// Renders elapsed time the way humans read it, e.g. `12.4ms`.
pub fn format_duration(duration: Duration) -> String {
    format!("{:?}", duration)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AggregateStatus {
    Healthy,
    Unhealthy,
}

/// Body served by the health endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthReport {
    pub status: AggregateStatus,
    pub checks: Vec<StatusEntry>,
}

impl HealthReport {
    pub fn from_entries(mut entries: Vec<StatusEntry>) -> Self {
        entries.sort_by(|a, b| a.name.cmp(&b.name));

        let status = if entries.iter().any(StatusEntry::is_down) {
            AggregateStatus::Unhealthy
        } else {
            AggregateStatus::Healthy
        };

        Self {
            status,
            checks: entries,
        }
    }

    pub fn is_healthy(&self) -> bool {
        self.status == AggregateStatus::Healthy
    }
}
