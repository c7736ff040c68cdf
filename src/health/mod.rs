// src/health/mod.rs
mod checker;
mod service;
mod status;
mod store;

pub use checker::{HealthChecker, ProbeError};
pub use service::HealthService;
pub use status::{
    format_duration, AggregateStatus, CheckClass, CheckResult, CheckerConfig, HealthReport,
    HealthStatus, StatusEntry,
};
pub use store::{StatusKey, StatusStore};
