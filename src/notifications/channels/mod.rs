//! Message sinks for update notifications
//!
//! A [`MessageSink`] takes a finished [`WebhookPayload`] and makes exactly
//! one attempt to deliver it. [`webhook::WebhookSink`] is the production sink.

pub mod webhook;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;

use crate::notifications::message::WebhookPayload;

pub type ChannelResult<T> = Result<T, ChannelError>;

/// Why a message could not be delivered
#[derive(Debug, thiserror::Error)]
pub enum ChannelError {
    /// Connection, TLS, or timeout failure before a response arrived
    #[error("Webhook request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Invalid webhook configuration: {0}")]
    InvalidConfig(String),

    /// Endpoint answered with a non-success status
    #[error("HTTP {status}: {body}")]
    Rejected { status: u16, body: String },

    #[error("Failed to build HTTP client: {0}")]
    Client(String),
}

/// Outcome of one delivery attempt
#[derive(Debug, Clone, Serialize)]
pub struct DeliveryStatus {
    pub delivered: bool,
    pub sink: String,
    /// HTTP status the endpoint answered with, if it answered
    pub http_status: Option<u16>,
    /// Failure reason for undelivered messages
    pub error: Option<String>,
    pub attempted_at: DateTime<Utc>,
}

impl DeliveryStatus {
    pub fn delivered(sink: impl Into<String>, http_status: u16) -> Self {
        Self {
            delivered: true,
            sink: sink.into(),
            http_status: Some(http_status),
            error: None,
            attempted_at: Utc::now(),
        }
    }

    pub fn failed(sink: impl Into<String>, err: &ChannelError) -> Self {
        let http_status = match err {
            ChannelError::Rejected { status, .. } => Some(*status),
            ChannelError::Transport(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        };

        Self {
            delivered: false,
            sink: sink.into(),
            http_status,
            error: Some(err.to_string()),
            attempted_at: Utc::now(),
        }
    }
}

impl fmt::Display for DeliveryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.error, self.http_status) {
            (Some(error), _) => write!(f, "{} not delivered: {error}", self.sink),
            (None, Some(status)) => write!(f, "{} delivered (HTTP {status})", self.sink),
            (None, None) => write!(f, "{} delivered", self.sink),
        }
    }
}

/// Destination for update messages
///
/// One `deliver` call is one outbound request. Implementations must not
/// retry; the notifier treats any error as a lost message.
#[async_trait]
pub trait MessageSink: Send + Sync {
    /// Sink name used in logs
    fn name(&self) -> &str;

    async fn deliver(&self, payload: &WebhookPayload) -> ChannelResult<DeliveryStatus>;
}
