// src/metrics/collector.rs
use crate::health::{CheckClass, CheckResult, HealthStatus};
use anyhow::Result;
use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounterVec, IntGauge, IntGaugeVec, Opts, Registry,
    TextEncoder,
};
use std::sync::Arc;

pub struct MetricsRegistry {
    registry: Registry,
    collector: Arc<MetricsCollector>,
}

impl MetricsRegistry {
    pub fn new() -> Result<Self> {
        let registry = Registry::new();
        let collector = Arc::new(MetricsCollector::new(&registry)?);

        Ok(Self {
            registry,
            collector,
        })
    }

    pub fn collector(&self) -> Arc<MetricsCollector> {
        self.collector.clone()
    }

    /// Text exposition format of every registered metric.
    pub fn gather(&self) -> Result<Vec<u8>> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        Ok(buffer)
    }
}

pub struct MetricsCollector {
    pub checks_total: IntCounterVec,
    pub check_duration_seconds: HistogramVec,
    pub check_status: IntGaugeVec,
    pub registered_checkers: IntGauge,
}

impl MetricsCollector {
    pub fn new(registry: &Registry) -> Result<Self> {
        let checks_total = IntCounterVec::new(
            Opts::new("health_checks_total", "Total number of health checks performed"),
            &["checker", "status"],
        )?;
        registry.register(Box::new(checks_total.clone()))?;

        let check_duration_seconds = HistogramVec::new(
            HistogramOpts::new(
                "health_check_duration_seconds",
                "Health check duration in seconds",
            ),
            &["checker"],
        )?;
        registry.register(Box::new(check_duration_seconds.clone()))?;

        let check_status = IntGaugeVec::new(
            Opts::new(
                "health_check_status",
                "Latest health check status (1=UP, 0=DOWN)",
            ),
            &["checker", "class"],
        )?;
        registry.register(Box::new(check_status.clone()))?;

        let registered_checkers = IntGauge::new(
            "health_registered_checkers",
            "Number of distinct registered checkers",
        )?;
        registry.register(Box::new(registered_checkers.clone()))?;

        Ok(Self {
            checks_total,
            check_duration_seconds,
            check_status,
            registered_checkers,
        })
    }

    pub fn record_check(&self, checker: &str, classes: &[CheckClass], result: &CheckResult) {
        self.checks_total
            .with_label_values(&[checker, result.status.as_str()])
            .inc();

        self.check_duration_seconds
            .with_label_values(&[checker])
            .observe(result.duration.as_secs_f64());

        let value = match result.status {
            HealthStatus::Up => 1,
            HealthStatus::Down => 0,
        };
        for class in classes {
            self.check_status
                .with_label_values(&[checker, class.as_str()])
                .set(value);
        }
    }

    pub fn set_registered_checkers(&self, count: usize) {
        self.registered_checkers.set(count as i64);
    }
}
