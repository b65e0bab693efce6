//! Update notifications
//!
//! Turns a cycle's change-set into one webhook message and delivers it.
//!
//! ```text
//!   Vec<ChangeEvent> ──► MessageTemplate ──► WebhookPayload ──► MessageSink
//!                         (cap at 10,                           (one attempt,
//!                          "N more",                             failures logged
//!                          advisory)                             and dropped)
//! ```
//!
//! Delivery is best-effort. A failed delivery is not retried and cannot be
//! regenerated later, since the reconciled state no longer reports the
//! change as new.

pub mod channels;
pub mod message;

use chrono::{DateTime, Utc};

use crate::metrics;
use crate::models::ChangeEvent;

// Re-exports
pub use channels::webhook::WebhookSink;
pub use channels::{ChannelError, DeliveryStatus, MessageSink};
pub use message::{MessageTemplate, WebhookPayload, MAX_LISTED_ITEMS};

/// Formats change-sets and hands them to a sink
pub struct Notifier {
    sink: Box<dyn MessageSink>,
    template: MessageTemplate,
}

impl Notifier {
    /// Create a notifier with the default message texts
    pub fn new(sink: Box<dyn MessageSink>) -> Self {
        Self {
            sink,
            template: MessageTemplate::default(),
        }
    }

    /// Use custom message texts
    pub fn with_template(mut self, template: MessageTemplate) -> Self {
        self.template = template;
        self
    }

    /// Notify about a change-set
    ///
    /// Returns `None` without contacting the sink when `events` is empty.
    /// Delivery failures are logged and reported as a failed
    /// [`DeliveryStatus`]; they never propagate.
    pub async fn notify(&self, events: &[ChangeEvent], at: DateTime<Utc>) -> Option<DeliveryStatus> {
        if events.is_empty() {
            return None;
        }

        let payload = self.template.build_payload(events, at);

        let status = match self.sink.deliver(&payload).await {
            Ok(status) => {
                tracing::info!(
                    sink = self.sink.name(),
                    updates = events.len(),
                    "Notification sent"
                );
                status
            }
            Err(e) => {
                tracing::error!(
                    sink = self.sink.name(),
                    updates = events.len(),
                    error = %e,
                    "Failed to send notification, dropping it"
                );
                DeliveryStatus::failed(self.sink.name(), &e)
            }
        };

        metrics::record_notification(status.delivered);
        Some(status)
    }
}
