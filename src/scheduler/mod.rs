//! Monitor loop
//!
//! A [`Monitor`] runs the fetch → reconcile → notify cycle, either once or
//! repeatedly with a fixed interval between cycles:
//!
//! ```text
//!   ┌──────────┐   ┌─────────────┐   ┌──────────┐
//!   │  fetch   │──►│  reconcile  │──►│  notify  │──► wait interval ──┐
//!   └──────────┘   └─────────────┘   └──────────┘                    │
//!        ▲                 │ error                                    │
//!        │                 └──────────────────► wait cooldown ───────┤
//!        └───────────────────────────────────────────────────────────┘
//! ```
//!
//! Shutdown is observed only while waiting between cycles. A cycle that has
//! started always runs to completion. In continuous mode each cycle runs on
//! its own task, so a panicking cycle is treated like a failed one.

use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Context;
use chrono::{DateTime, Utc};
use tokio::sync::watch;

use crate::catalog::{CatalogClient, SteamWorkshopSource};
use crate::config::Config;
use crate::error::{ModwatchErrorTrait, Result};
use crate::metrics;
use crate::models::CycleReport;
use crate::notifications::{Notifier, WebhookSink};
use crate::reconciler::Reconciler;
use crate::storage::SharedItemRepository;
use crate::utils::dedup_ids;

/// Default pause after a failed cycle
pub const DEFAULT_COOLDOWN: Duration = Duration::from_secs(60);

/// Default spacing between cycles in continuous mode
pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(3600);

/// Source of the current time; read once per cycle
pub type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

/// Drives update checks for a fixed population of tracked ids
pub struct Monitor {
    tracked_ids: Vec<String>,
    catalog: CatalogClient,
    reconciler: Reconciler,
    notifier: Notifier,
    cooldown: Duration,
    clock: Clock,
}

impl Monitor {
    /// Create a monitor; duplicate and blank ids are dropped
    pub fn new(
        tracked_ids: Vec<String>,
        catalog: CatalogClient,
        reconciler: Reconciler,
        notifier: Notifier,
    ) -> Self {
        let tracked_ids = dedup_ids(tracked_ids);
        metrics::set_tracked_items(tracked_ids.len());

        Self {
            tracked_ids,
            catalog,
            reconciler,
            notifier,
            cooldown: DEFAULT_COOLDOWN,
            clock: Arc::new(Utc::now),
        }
    }

    /// Wire up the production monitor from configuration
    ///
    /// # Errors
    ///
    /// Fails if the tracked id list cannot be resolved or an endpoint
    /// in the configuration is unusable.
    pub fn from_config(config: &Config, repo: SharedItemRepository) -> anyhow::Result<Self> {
        let tracked_ids = config.tracked_ids()?;

        let source = SteamWorkshopSource::with_config(
            &config.catalog.api_url,
            &config.catalog.api_key,
            config.request_timeout(),
        )
        .context("Failed to create catalog client")?;
        let catalog = CatalogClient::new(Arc::new(source))
            .with_batch_size(config.catalog.batch_size)
            .with_batch_delay(config.batch_delay());

        let reconciler =
            Reconciler::new(repo).with_detail_url_template(&config.catalog.detail_url_template);

        let sink = WebhookSink::new(&config.notifier.webhook_url, config.webhook_timeout())
            .context("Failed to create webhook sink")?;
        let notifier = Notifier::new(Box::new(sink)).with_template(config.notifier.message.clone());

        Ok(Self::new(tracked_ids, catalog, reconciler, notifier).with_cooldown(config.cooldown()))
    }

    /// Set the pause after a failed cycle
    pub fn with_cooldown(mut self, cooldown: Duration) -> Self {
        self.cooldown = cooldown;
        self
    }

    /// Replace the wall clock used for `last_checked` and message timestamps
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    /// Get the tracked ids in lookup order
    pub fn tracked_ids(&self) -> &[String] {
        &self.tracked_ids
    }

    /// Run one fetch → reconcile → notify pass
    ///
    /// Failed lookup batches and failed notifications do not fail the
    /// cycle; they are logged and reflected in the report.
    ///
    /// # Errors
    ///
    /// Returns an error if the state store fails during reconciliation.
    pub async fn run_cycle(&self) -> Result<CycleReport> {
        let started = Instant::now();
        let now = (self.clock)();
        tracing::info!(tracked = self.tracked_ids.len(), "Checking for mod updates");

        let fetched = self.catalog.fetch(&self.tracked_ids).await;

        let reconciliation = match self.reconciler.reconcile(&fetched.results, now.timestamp()) {
            Ok(reconciliation) => reconciliation,
            Err(e) => {
                metrics::record_cycle(false, started.elapsed().as_secs_f64());
                return Err(e);
            }
        };

        let mut report = reconciliation.report;
        report.tracked = self.tracked_ids.len();
        report.batches = fetched.batches;
        report.failed_batches = fetched.failed_batches;

        if report.all_batches_failed() {
            tracing::warn!(
                batches = report.batches,
                "Every catalog batch failed, nothing was reconciled this cycle"
            );
        }

        if reconciliation.events.is_empty() {
            tracing::info!("No mod updates detected");
        } else {
            let status = self.notifier.notify(&reconciliation.events, now).await;
            report.notified = status.is_some_and(|s| s.delivered);
        }

        let elapsed = started.elapsed();
        metrics::record_cycle(true, elapsed.as_secs_f64());
        tracing::info!(
            observed = report.observed,
            skipped = report.skipped,
            new = report.new_items,
            changed = report.changed,
            unchanged = report.unchanged,
            failed_batches = report.failed_batches,
            elapsed_ms = elapsed.as_millis() as u64,
            "Update check finished"
        );

        Ok(report)
    }

    /// Run exactly one cycle
    ///
    /// # Errors
    ///
    /// Propagates any cycle error to the caller.
    pub async fn run_once(&self) -> Result<CycleReport> {
        self.run_cycle().await
    }

    /// Run cycles until `shutdown` turns `true`
    ///
    /// Successful cycles are followed by `interval`, failed or panicked ones
    /// by the cooldown. A closed shutdown channel also stops the loop.
    pub async fn run_continuous(
        self: Arc<Self>,
        interval: Duration,
        mut shutdown: watch::Receiver<bool>,
    ) {
        tracing::info!(
            interval_secs = interval.as_secs(),
            tracked = self.tracked_ids.len(),
            "Starting continuous monitoring"
        );

        loop {
            if *shutdown.borrow() {
                break;
            }

            let monitor = Arc::clone(&self);
            let outcome = tokio::spawn(async move { monitor.run_cycle().await }).await;

            let wait = match outcome {
                Ok(Ok(_)) => interval,
                Ok(Err(e)) => {
                    tracing::error!(
                        error = %e,
                        category = %e.category(),
                        recoverable = e.is_recoverable(),
                        cooldown_secs = self.cooldown.as_secs(),
                        "Update check failed, cooling down"
                    );
                    self.cooldown
                }
                Err(e) => {
                    metrics::record_cycle(false, 0.0);
                    tracing::error!(
                        error = %e,
                        cooldown_secs = self.cooldown.as_secs(),
                        "Update check aborted, cooling down"
                    );
                    self.cooldown
                }
            };

            tracing::debug!(wait_secs = wait.as_secs(), "Waiting for next check");
            if wait_or_shutdown(wait, &mut shutdown).await {
                break;
            }
        }

        tracing::info!("Monitoring stopped");
    }
}

/// Sleep for `duration`; returns `true` as soon as shutdown is requested
async fn wait_or_shutdown(duration: Duration, shutdown: &mut watch::Receiver<bool>) -> bool {
    let deadline = tokio::time::Instant::now() + duration;

    loop {
        tokio::select! {
            _ = tokio::time::sleep_until(deadline) => return false,
            changed = shutdown.changed() => match changed {
                Ok(()) if *shutdown.borrow() => return true,
                Ok(()) => continue,
                Err(_) => return true,
            },
        }
    }
}
