// Core data structures for the modwatch monitor

use serde::{Deserialize, Serialize};

/// Persisted version state of one tracked item
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemRecord {
    pub id: String,
    pub last_updated: i64, // epoch seconds, as reported by the catalog
    pub display_name: String,
    pub last_checked: i64, // epoch seconds of the last cycle that observed the id
}

/// Per-id result of a catalog lookup
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LookupResult {
    pub success: bool,
    pub id: String,
    pub display_name: String,
    pub last_updated: i64,
}

impl LookupResult {
    /// Build a result, applying the `Mod <id>` / `0` fallbacks for missing fields
    pub fn new(
        success: bool,
        id: impl Into<String>,
        display_name: Option<String>,
        last_updated: Option<i64>,
    ) -> Self {
        let id = id.into();
        let display_name = display_name
            .filter(|name| !name.trim().is_empty())
            .unwrap_or_else(|| fallback_name(&id));

        Self {
            success,
            id,
            display_name,
            last_updated: last_updated.unwrap_or(0),
        }
    }

    /// Shorthand for a successful lookup
    pub fn found(id: impl Into<String>, display_name: impl Into<String>, last_updated: i64) -> Self {
        Self::new(true, id, Some(display_name.into()), Some(last_updated))
    }
}

/// Synthesized label for an item the catalog returned without a title
pub fn fallback_name(id: &str) -> String {
    format!("Mod {id}")
}

/// An item that has a newer version than previously recorded
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeEvent {
    pub id: String,
    pub display_name: String,
    pub updated_at: i64,
    pub detail_url: String,
}

/// How the reconciler classified one lookup result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Classification {
    /// First observation; a record was created
    New,
    /// Observed version is newer than the stored one
    Changed,
    /// Observed version is not newer; only `last_checked` advanced
    Unchanged,
}

impl Classification {
    /// Get string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::New => "new",
            Self::Changed => "changed",
            Self::Unchanged => "unchanged",
        }
    }
}

impl std::fmt::Display for Classification {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Summary of one fetch + reconcile + notify pass
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CycleReport {
    pub tracked: usize,
    pub batches: usize,
    pub failed_batches: usize,
    pub observed: usize,
    pub skipped: usize,
    pub new_items: usize,
    pub changed: usize,
    pub unchanged: usize,
    pub notified: bool,
}

impl CycleReport {
    /// Count one classification
    pub fn record(&mut self, classification: Classification) {
        match classification {
            Classification::New => self.new_items += 1,
            Classification::Changed => self.changed += 1,
            Classification::Unchanged => self.unchanged += 1,
        }
    }

    /// Whether every issued batch failed
    pub fn all_batches_failed(&self) -> bool {
        self.batches > 0 && self.failed_batches == self.batches
    }
}
