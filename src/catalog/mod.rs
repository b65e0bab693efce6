//! Batched catalog lookups
//!
//! This module turns the full tracked-id population into bounded lookup
//! requests against a [`CatalogSource`] and flattens the answers into one
//! ordered list of [`LookupResult`]s:
//! - Batches of at most [`MAX_BATCH_SIZE`] ids, issued serially
//! - A fixed spacing delay between batches, failed or not
//! - A failed batch contributes no results; the rest of the cycle proceeds

pub mod steam;

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

use crate::metrics;
use crate::models::LookupResult;
use crate::utils::error::CatalogError;

pub use steam::SteamWorkshopSource;

/// Upper bound the remote service accepts per lookup request
pub const MAX_BATCH_SIZE: usize = 100;

/// Default spacing between consecutive lookup requests
pub const DEFAULT_BATCH_DELAY: Duration = Duration::from_secs(1);

/// A remote batch lookup service
///
/// One call is one remote request. Implementations return a result for
/// every entry the service answered, in response order.
#[async_trait]
pub trait CatalogSource: Send + Sync {
    /// Get the source name (for logging)
    fn name(&self) -> &str;

    /// Look up one batch of ids
    async fn lookup(&self, ids: &[String]) -> Result<Vec<LookupResult>, CatalogError>;
}

/// Everything one fetch pass produced
#[derive(Debug, Clone, Default)]
pub struct FetchOutcome {
    /// Per-id results, batch order then response order
    pub results: Vec<LookupResult>,

    /// Number of lookup requests issued
    pub batches: usize,

    /// Number of lookup requests that failed entirely
    pub failed_batches: usize,
}

/// Batching client in front of a catalog source
pub struct CatalogClient {
    source: Arc<dyn CatalogSource>,
    batch_size: usize,
    batch_delay: Duration,
}

impl CatalogClient {
    /// Create a client with the default batch size and spacing
    pub fn new(source: Arc<dyn CatalogSource>) -> Self {
        Self {
            source,
            batch_size: MAX_BATCH_SIZE,
            batch_delay: DEFAULT_BATCH_DELAY,
        }
    }

    /// Set the batch size, clamped to `1..=MAX_BATCH_SIZE`
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.clamp(1, MAX_BATCH_SIZE);
        self
    }

    /// Set the spacing delay between batches
    pub fn with_batch_delay(mut self, delay: Duration) -> Self {
        self.batch_delay = delay;
        self
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Fetch the latest details for every id
    ///
    /// Never fails as a whole: a batch whose request fails is logged and
    /// skipped, and its ids are simply absent from the results.
    pub async fn fetch(&self, ids: &[String]) -> FetchOutcome {
        let mut outcome = FetchOutcome::default();
        let total_batches = ids.len().div_ceil(self.batch_size);

        for (index, batch) in ids.chunks(self.batch_size).enumerate() {
            if index > 0 && !self.batch_delay.is_zero() {
                tokio::time::sleep(self.batch_delay).await;
            }

            outcome.batches += 1;
            tracing::debug!(
                source = self.source.name(),
                batch = index + 1,
                total = total_batches,
                size = batch.len(),
                "Looking up catalog batch"
            );

            match self.source.lookup(batch).await {
                Ok(results) => {
                    tracing::debug!(
                        batch = index + 1,
                        returned = results.len(),
                        "Catalog batch completed"
                    );
                    outcome.results.extend(results);
                }
                Err(e) => {
                    outcome.failed_batches += 1;
                    metrics::record_batch_failure();
                    tracing::warn!(
                        source = self.source.name(),
                        batch = index + 1,
                        total = total_batches,
                        size = batch.len(),
                        error = %e,
                        recoverable = e.is_recoverable(),
                        "Catalog batch failed, skipping its ids this cycle"
                    );
                }
            }
        }

        outcome
    }
}
