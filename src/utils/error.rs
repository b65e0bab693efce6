//! Error types for catalog lookups
//!
//! A `CatalogError` always describes the failure of one whole lookup request.
//! The catalog client degrades it to "no results for that batch".

use thiserror::Error;

/// Errors that can occur during a catalog lookup request
#[derive(Error, Debug)]
pub enum CatalogError {
    /// HTTP request error
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Request timeout
    #[error("Request timeout")]
    Timeout,

    /// Server rejected the request with a non-success status code
    #[error("Server error: {0}")]
    ServerError(u16),

    /// Response body did not have the expected shape
    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    /// Invalid endpoint URL
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}

impl CatalogError {
    /// Check if the next cycle might succeed where this one failed
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::Http(_) | Self::Timeout => true,
            Self::ServerError(code) => *code == 429 || *code >= 500,
            Self::MalformedResponse(_) => true,
            Self::InvalidUrl(_) => false,
        }
    }
}
