//! Prometheus metrics for the monitor loop
//!
//! Tracked series:
//! - `modwatch_cycles_total{outcome}` and `modwatch_cycle_duration_seconds`
//! - `modwatch_catalog_batch_failures_total`
//! - `modwatch_items_reconciled_total{classification}`
//! - `modwatch_notifications_total{status}`
//! - `modwatch_tracked_items`
//!
//! Metrics live in a crate-owned [`Registry`]. Until `init_metrics()` has
//! run, every recording function is a no-op and `encode_metrics()` returns
//! an empty string.

use prometheus::{
    Counter, CounterVec, Gauge, Histogram, HistogramOpts, Opts, Registry, TextEncoder,
};
use std::sync::OnceLock;

use crate::models::Classification;

struct MonitorMetrics {
    registry: Registry,
    cycles: CounterVec,
    cycle_duration: Histogram,
    batch_failures: Counter,
    classifications: CounterVec,
    notifications: CounterVec,
    tracked_items: Gauge,
}

static MONITOR_METRICS: OnceLock<MonitorMetrics> = OnceLock::new();

impl MonitorMetrics {
    fn build() -> prometheus::Result<Self> {
        let registry = Registry::new();

        let cycles = CounterVec::new(
            Opts::new("modwatch_cycles_total", "Monitor cycles by outcome"),
            &["outcome"],
        )?;
        let cycle_duration = Histogram::with_opts(
            HistogramOpts::new(
                "modwatch_cycle_duration_seconds",
                "Time spent in one fetch/reconcile/notify cycle",
            )
            .buckets(vec![0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0, 120.0, 300.0]),
        )?;
        let batch_failures = Counter::new(
            "modwatch_catalog_batch_failures_total",
            "Catalog lookup batches that failed entirely",
        )?;
        let classifications = CounterVec::new(
            Opts::new(
                "modwatch_items_reconciled_total",
                "Reconciled items by classification",
            ),
            &["classification"],
        )?;
        let notifications = CounterVec::new(
            Opts::new("modwatch_notifications_total", "Notification deliveries by status"),
            &["status"],
        )?;
        let tracked_items = Gauge::new("modwatch_tracked_items", "Configured tracked item ids")?;

        registry.register(Box::new(cycles.clone()))?;
        registry.register(Box::new(cycle_duration.clone()))?;
        registry.register(Box::new(batch_failures.clone()))?;
        registry.register(Box::new(classifications.clone()))?;
        registry.register(Box::new(notifications.clone()))?;
        registry.register(Box::new(tracked_items.clone()))?;

        Ok(Self {
            registry,
            cycles,
            cycle_duration,
            batch_failures,
            classifications,
            notifications,
            tracked_items,
        })
    }
}

/// Register all metrics; later calls are no-ops
///
/// ```ignore
/// if let Err(e) = modwatch::metrics::init_metrics() {
///     tracing::warn!("Metrics initialization failed: {e}");
/// }
/// ```
pub fn init_metrics() -> prometheus::Result<()> {
    if MONITOR_METRICS.get().is_some() {
        return Ok(());
    }

    let metrics = MonitorMetrics::build()?;
    if MONITOR_METRICS.set(metrics).is_ok() {
        tracing::debug!("Prometheus metrics registered");
    }
    Ok(())
}

/// Render all metrics in the Prometheus text exposition format
pub fn encode_metrics() -> prometheus::Result<String> {
    match MONITOR_METRICS.get() {
        Some(m) => TextEncoder::new().encode_to_string(&m.registry.gather()),
        None => Ok(String::new()),
    }
}

pub fn record_cycle(success: bool, duration_secs: f64) {
    let Some(m) = MONITOR_METRICS.get() else {
        return;
    };

    let outcome = if success { "success" } else { "error" };
    m.cycles.with_label_values(&[outcome]).inc();
    m.cycle_duration.observe(duration_secs);
}

/// Record a catalog batch that produced no results
pub fn record_batch_failure() {
    if let Some(m) = MONITOR_METRICS.get() {
        m.batch_failures.inc();
    }
}

pub fn record_classification(classification: Classification) {
    if let Some(m) = MONITOR_METRICS.get() {
        m.classifications
            .with_label_values(&[classification.as_str()])
            .inc();
    }
}

pub fn record_notification(delivered: bool) {
    if let Some(m) = MONITOR_METRICS.get() {
        let status = if delivered { "delivered" } else { "failed" };
        m.notifications.with_label_values(&[status]).inc();
    }
}

pub fn set_tracked_items(count: usize) {
    if let Some(m) = MONITOR_METRICS.get() {
        m.tracked_items.set(count as f64);
    }
}
