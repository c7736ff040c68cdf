// src/health/service.rs
use crate::metrics::MetricsCollector;
use futures::FutureExt;
use std::any::Any;
use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, MissedTickBehavior};
use tracing::{debug, error, info, warn};

use super::checker::{HealthChecker, ProbeError};
use super::status::{CheckClass, CheckResult, CheckerConfig, HealthReport, StatusEntry};
use super::store::StatusStore;

#[derive(Clone)]
struct Registration {
    checker: Arc<dyn HealthChecker>,
    config: CheckerConfig,
}

/// One probe invocation per tick, fanned out to every class in `classes`.
#[derive(Clone)]
struct ScheduledCheck {
    name: String,
    checker: Arc<dyn HealthChecker>,
    interval: Duration,
    classes: Vec<CheckClass>,
}

/// Holds the readiness and liveness registrations and drives periodic checks
/// into a shared [`StatusStore`].
pub struct HealthService {
    readiness_checkers: HashMap<String, Registration>,
    liveness_checkers: HashMap<String, Registration>,
    store: Arc<StatusStore>,
    metrics: Option<Arc<MetricsCollector>>,
    shutdown_tx: watch::Sender<bool>,
    shutdown_rx: watch::Receiver<bool>,
}

impl HealthService {
    pub fn new(store: Arc<StatusStore>) -> Self {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        Self {
            readiness_checkers: HashMap::new(),
            liveness_checkers: HashMap::new(),
            store,
            metrics: None,
            shutdown_tx,
            shutdown_rx,
        }
    }

    pub fn with_metrics(mut self, metrics: Arc<MetricsCollector>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn register_readiness(
        &mut self,
        name: impl Into<String>,
        checker: Arc<dyn HealthChecker>,
        config: CheckerConfig,
    ) {
        self.readiness_checkers
            .insert(name.into(), Registration { checker, config });
    }

    pub fn register_liveness(
        &mut self,
        name: impl Into<String>,
        checker: Arc<dyn HealthChecker>,
        config: CheckerConfig,
    ) {
        self.liveness_checkers
            .insert(name.into(), Registration { checker, config });
    }

    pub fn store(&self) -> Arc<StatusStore> {
        self.store.clone()
    }

    /// Number of distinct names across both tables.
    pub fn checker_count(&self) -> usize {
        self.schedule().len()
    }

    /// Runs every registered checker once. A name registered in both tables
    /// is probed once and its result written to both classes.
    pub async fn check_all_health(&self) {
        let plan = self.schedule();
        debug!("Running full health check pass over {} checkers", plan.len());

        for check in &plan {
            run_check(check, &self.store, self.metrics.as_deref()).await;
        }
    }

    pub fn get_readiness_statuses(&self) -> Vec<StatusEntry> {
        self.store.get_by_class(CheckClass::Readiness)
    }

    pub fn get_liveness_statuses(&self) -> Vec<StatusEntry> {
        self.store.get_by_class(CheckClass::Liveness)
    }

    pub fn report(&self, class: CheckClass) -> HealthReport {
        HealthReport::from_entries(self.store.get_by_class(class))
    }

    /// Performs an immediate full pass, then spawns one task per distinct
    /// name that re-checks it on its own interval until [`shutdown`] is
    /// called.
    ///
    /// [`shutdown`]: HealthService::shutdown
    pub async fn start_background_check(&self) -> Vec<JoinHandle<()>> {
        self.check_all_health().await;

        let plan = self.schedule();
        let mut handles = Vec::with_capacity(plan.len());

        for check in plan {
            if check.interval.is_zero() {
                warn!(
                    checker = %check.name,
                    "Interval is zero, checker will not be rescheduled"
                );
                continue;
            }

            if let (Some(readiness), Some(liveness)) = (
                self.readiness_checkers.get(&check.name),
                self.liveness_checkers.get(&check.name),
            ) {
                if readiness.config.interval != liveness.config.interval {
                    warn!(
                        checker = %check.name,
                        readiness_interval = ?readiness.config.interval,
                        liveness_interval = ?liveness.config.interval,
                        "Checker registered with different intervals, using the readiness interval"
                    );
                }
            }

            info!(
                checker = %check.name,
                kind = check.checker.kind(),
                interval = ?check.interval,
                "Starting scheduled health check"
            );

            let store = self.store.clone();
            let metrics = self.metrics.clone();
            let shutdown_rx = self.shutdown_rx.clone();
            handles.push(tokio::spawn(run_schedule(check, store, metrics, shutdown_rx)));
        }

        handles
    }

    /// Signals every scheduled task to stop. In-flight probes finish first.
    pub fn shutdown(&self) {
        let _ = self.shutdown_tx.send(true);
    }

    fn schedule(&self) -> Vec<ScheduledCheck> {
        let mut plan = Vec::with_capacity(self.readiness_checkers.len());

        for (name, registration) in &self.readiness_checkers {
            let mut classes = vec![CheckClass::Readiness];
            if self.liveness_checkers.contains_key(name) {
                classes.push(CheckClass::Liveness);
            }

            plan.push(ScheduledCheck {
                name: name.clone(),
                checker: registration.checker.clone(),
                interval: registration.config.interval,
                classes,
            });
        }

        for (name, registration) in &self.liveness_checkers {
            if self.readiness_checkers.contains_key(name) {
                continue;
            }

            plan.push(ScheduledCheck {
                name: name.clone(),
                checker: registration.checker.clone(),
                interval: registration.config.interval,
                classes: vec![CheckClass::Liveness],
            });
        }

        plan
    }
}

async fn run_schedule(
    check: ScheduledCheck,
    store: Arc<StatusStore>,
    metrics: Option<Arc<MetricsCollector>>,
    mut shutdown_rx: watch::Receiver<bool>,
) {
    // The startup pass already covered the first tick.
    let start = tokio::time::Instant::now() + check.interval;
    let mut ticker = interval_at(start, check.interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        if *shutdown_rx.borrow() {
            break;
        }

        tokio::select! {
            _ = ticker.tick() => {
                debug!(checker = %check.name, "Performing scheduled health check");
                run_check(&check, &store, metrics.as_deref()).await;
            }
            changed = shutdown_rx.changed() => {
                if changed.is_err() {
                    break;
                }
            }
        }
    }

    info!(checker = %check.name, "Scheduled health check stopped");
}

async fn run_check(check: &ScheduledCheck, store: &StatusStore, metrics: Option<&MetricsCollector>) {
    let started = Instant::now();

    let result = match AssertUnwindSafe(check.checker.check_health())
        .catch_unwind()
        .await
    {
        Ok(result) => result,
        Err(panic) => {
            let message = panic_message(panic.as_ref());
            error!(checker = %check.name, %message, "Health check panicked");
            CheckResult::down(ProbeError::Panicked(message), started.elapsed())
        }
    };

    if result.is_up() {
        debug!(checker = %check.name, duration = ?result.duration, "Checker is UP");
    } else {
        let error = result.error.as_ref().map(|e| e.to_string()).unwrap_or_default();
        warn!(checker = %check.name, %error, duration = ?result.duration, "Checker is DOWN");
    }

    let entry = StatusEntry::from_result(&check.name, &result);
    for class in &check.classes {
        store.set_status(&check.name, *class, entry.clone());
    }

    if let Some(metrics) = metrics {
        metrics.record_check(&check.name, &check.classes, &result);
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
