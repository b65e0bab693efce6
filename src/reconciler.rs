//! Change detection against stored item state
//!
//! The reconciler walks one cycle's lookup results in order and, for each
//! successful result, decides whether the item is seen for the first time,
//! has a newer version than recorded, or is unchanged. Every decision is
//! persisted immediately; only changed items produce a [`ChangeEvent`].
//!
//! | Stored record | Observed `last_updated` | Outcome |
//! |---------------|-------------------------|---------|
//! | absent        | any                     | create record, no event |
//! | present       | > stored                | overwrite record, emit event |
//! | present       | <= stored               | advance `last_checked` only |

use crate::error::Result;
use crate::metrics;
use crate::models::{ChangeEvent, Classification, CycleReport, LookupResult};
use crate::storage::SharedItemRepository;

/// Default template for an item's detail page
pub const DEFAULT_DETAIL_URL: &str = "https://steamcommunity.com/sharedfiles/filedetails/?id={id}";

/// Placeholder substituted by the item id in a detail URL template
const ID_PLACEHOLDER: &str = "{id}";

/// Compares fresh lookup results with the state store
pub struct Reconciler {
    repo: SharedItemRepository,
    detail_url_template: String,
}

/// Change-set and bookkeeping for one reconciliation pass
#[derive(Debug, Clone, Default)]
pub struct Reconciliation {
    pub events: Vec<ChangeEvent>,
    pub report: CycleReport,
}

impl Reconciler {
    /// Create a reconciler with the Steam Workshop detail URL
    pub fn new(repo: SharedItemRepository) -> Self {
        Self {
            repo,
            detail_url_template: DEFAULT_DETAIL_URL.to_string(),
        }
    }

    /// Use a different detail URL template; `{id}` is replaced by the item id
    pub fn with_detail_url_template(mut self, template: impl Into<String>) -> Self {
        self.detail_url_template = template.into();
        self
    }

    /// Detail page for an item
    pub fn detail_url(&self, id: &str) -> String {
        self.detail_url_template.replace(ID_PLACEHOLDER, id)
    }

    /// Reconcile one cycle's results, stamping observed records with `now`
    ///
    /// # Errors
    ///
    /// A state store failure aborts the pass. Records written before the
    /// failure stay written; the next cycle reconciles the rest.
    pub fn reconcile(&self, results: &[LookupResult], now: i64) -> Result<Reconciliation> {
        let mut outcome = Reconciliation::default();

        for result in results {
            if !result.success {
                outcome.report.skipped += 1;
                tracing::debug!(id = %result.id, "Catalog reported no details, skipping");
                continue;
            }

            outcome.report.observed += 1;
            let classification = self.classify_and_store(result, now, &mut outcome.events)?;
            outcome.report.record(classification);
            metrics::record_classification(classification);
        }

        Ok(outcome)
    }

    fn classify_and_store(
        &self,
        result: &LookupResult,
        now: i64,
        events: &mut Vec<ChangeEvent>,
    ) -> Result<Classification> {
        let Some(stored) = self.repo.get(&result.id)? else {
            self.repo
                .upsert(&result.id, result.last_updated, &result.display_name, now)?;
            tracing::info!(
                id = %result.id,
                name = %result.display_name,
                "Added new mod to tracking"
            );
            return Ok(Classification::New);
        };

        if stored.last_updated < result.last_updated {
            let last_checked = now.max(stored.last_checked);
            self.repo.upsert(
                &result.id,
                result.last_updated,
                &result.display_name,
                last_checked,
            )?;
            tracing::info!(
                id = %result.id,
                name = %result.display_name,
                previous = stored.last_updated,
                current = result.last_updated,
                "Mod update detected"
            );
            events.push(ChangeEvent {
                id: result.id.clone(),
                display_name: result.display_name.clone(),
                updated_at: result.last_updated,
                detail_url: self.detail_url(&result.id),
            });
            return Ok(Classification::Changed);
        }

        if stored.last_updated > result.last_updated {
            tracing::debug!(
                id = %result.id,
                stored = stored.last_updated,
                observed = result.last_updated,
                "Catalog reported an older version than stored, ignoring"
            );
        }

        self.repo.touch_checked(&result.id, now)?;
        Ok(Classification::Unchanged)
    }
}
