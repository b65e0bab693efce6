//! modwatch - Steam Workshop mod update monitor
//!
//! Periodically looks up the latest published versions of a fixed set of
//! Workshop items, compares them with durable local state, and posts a
//! webhook message whenever items have been updated.
//!
//! # Architecture
//!
//! The library is organized into several modules:
//!
//! - [`config`] - Configuration loading and validation
//! - [`catalog`] - Batched lookups against the Workshop details API
//! - [`reconciler`] - Change detection against stored state
//! - [`notifications`] - Update message formatting and webhook delivery
//! - [`scheduler`] - One-shot and continuous monitor loop
//! - [`storage`] - SQLite state store
//! - [`models`] - Core data structures and types
//! - [`metrics`] - Prometheus counters for the loop
//! - [`utils`] - Common utilities and helpers
//!
//! # Example
//!
//! ```no_run
//! use modwatch::config::Config;
//! use modwatch::scheduler::Monitor;
//! use modwatch::storage::create_sqlite_repository;
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load()?;
//!     config.validate()?;
//!     let repo = create_sqlite_repository(&config.storage.sqlite_path)?;
//!     let monitor = Monitor::from_config(&config, repo)?;
//!     monitor.run_once().await?;
//!     Ok(())
//! }
//! ```

pub mod catalog;
pub mod config;
pub mod error;
pub mod metrics;
pub mod models;
pub mod notifications;
pub mod reconciler;
pub mod scheduler;
pub mod storage;
pub mod utils;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::catalog::{CatalogClient, CatalogSource, SteamWorkshopSource};
    pub use crate::config::Config;
    pub use crate::error::{Error, ErrorCategory, ModwatchErrorTrait, Result};
    pub use crate::models::{ChangeEvent, CycleReport, ItemRecord, LookupResult};
    pub use crate::notifications::{MessageSink, Notifier, WebhookSink};
    pub use crate::reconciler::Reconciler;
    pub use crate::scheduler::Monitor;
    pub use crate::storage::{ItemRepository, SharedItemRepository};
}

// Direct re-exports for convenience
pub use models::{ChangeEvent, CycleReport, ItemRecord, LookupResult};
