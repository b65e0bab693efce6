//! Discord-compatible webhook sink
//!
//! Posts the update message as JSON. One attempt per message, bounded by a
//! request timeout; any non-2xx answer counts as a failed delivery.

use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use url::Url;

use super::{ChannelError, ChannelResult, DeliveryStatus, MessageSink};
use crate::notifications::message::WebhookPayload;

/// Delivery timeout used by [`WebhookSink::from_url`]
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Webhook message sink
///
/// ```rust,ignore
/// let sink = WebhookSink::new("https://discord.com/api/webhooks/...", Duration::from_secs(10))?;
/// sink.deliver(&payload).await?;
/// ```
pub struct WebhookSink {
    url: Url,
    client: Client,
}

impl WebhookSink {
    /// Create a sink for an http(s) endpoint
    ///
    /// # Errors
    ///
    /// `ChannelError::InvalidConfig` for an unparsable or non-http(s) URL or
    /// a zero timeout.
    pub fn new(url: &str, timeout: Duration) -> ChannelResult<Self> {
        let url = Url::parse(url)
            .map_err(|e| ChannelError::InvalidConfig(format!("webhook URL {url:?}: {e}")))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ChannelError::InvalidConfig(format!(
                "webhook URL must be http or https, got {}",
                url.scheme()
            )));
        }
        if timeout.is_zero() {
            return Err(ChannelError::InvalidConfig(
                "webhook timeout must be greater than 0".to_string(),
            ));
        }

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ChannelError::Client(e.to_string()))?;

        Ok(Self { url, client })
    }

    /// Create a sink with the default timeout
    pub fn from_url(url: &str) -> ChannelResult<Self> {
        Self::new(url, DEFAULT_TIMEOUT)
    }

    pub fn url(&self) -> &str {
        self.url.as_str()
    }
}

#[async_trait]
impl MessageSink for WebhookSink {
    fn name(&self) -> &str {
        "webhook"
    }

    async fn deliver(&self, payload: &WebhookPayload) -> ChannelResult<DeliveryStatus> {
        let response = self
            .client
            .post(self.url.clone())
            .json(payload)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ChannelError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        tracing::debug!(status = %status, "Webhook accepted message");
        Ok(DeliveryStatus::delivered(self.name(), status.as_u16()))
    }
}
