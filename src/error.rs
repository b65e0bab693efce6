//! Crate-wide error type
//!
//! Lookup and delivery failures have their own enums
//! ([`crate::utils::error::CatalogError`],
//! [`crate::notifications::ChannelError`]) because the loop degrades them
//! locally: a failed batch is skipped and a failed message is dropped. Only
//! state store and internal failures reach a cycle boundary as an [`Error`].
//!
//! ```rust,ignore
//! use modwatch::error::{Error, ModwatchErrorTrait};
//!
//! fn report(err: &Error) {
//!     if err.is_recoverable() {
//!         tracing::warn!(category = %err.category(), "Will retry next cycle: {err}");
//!     } else {
//!         tracing::error!(category = %err.category(), "{err}");
//!     }
//! }
//! ```

use rusqlite::ErrorCode;
use thiserror::Error;

/// Shared behaviour of modwatch errors
pub trait ModwatchErrorTrait: std::error::Error {
    /// Whether the next cycle may succeed without operator action
    fn is_recoverable(&self) -> bool;

    /// Coarse area the error came from, for logs and metrics labels
    fn category(&self) -> ErrorCategory;
}

/// Where an error originated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// State store
    Store,
    Internal,
}

impl ErrorCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Store => "store",
            Self::Internal => "internal",
        }
    }
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unified error type for the modwatch crate
#[derive(Error, Debug)]
pub enum Error {
    /// Store could not be opened, created, or failed its integrity check
    #[error("State store unavailable at {path}: {reason}")]
    StoreUnavailable { path: String, reason: String },

    /// A query against an open store failed
    #[error("State store query failed: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ModwatchErrorTrait for Error {
    fn is_recoverable(&self) -> bool {
        match self {
            Self::Database(rusqlite::Error::SqliteFailure(failure, _)) => matches!(
                failure.code,
                ErrorCode::DatabaseBusy | ErrorCode::DatabaseLocked
            ),
            Self::Database(_) | Self::StoreUnavailable { .. } | Self::Internal(_) => false,
        }
    }

    fn category(&self) -> ErrorCategory {
        match self {
            Self::StoreUnavailable { .. } | Self::Database(_) => ErrorCategory::Store,
            Self::Internal(_) => ErrorCategory::Internal,
        }
    }
}

impl Error {
    pub fn store_unavailable(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::StoreUnavailable {
            path: path.into(),
            reason: reason.into(),
        }
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
