//! Webhook message layout for a change-set
//!
//! One message per cycle, shaped as a Discord-compatible embed:
//!
//! ```json
//! {
//!   "content": "@here Mod updates detected!",
//!   "embeds": [{
//!     "title": "🔄 Workshop Mod Updates Detected!",
//!     "description": "**2 mod(s) have been updated**",
//!     "color": 65280,
//!     "timestamp": "2025-10-06T12:00:00+00:00",
//!     "footer": {"text": "Workshop Mod Monitor"},
//!     "fields": [
//!       {"name": "📦 Community Framework", "value": "**Updated:** ...", "inline": true},
//!       {"name": "⚠️ Action Required", "value": "...", "inline": false}
//!     ]
//!   }]
//! }
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::ChangeEvent;
use crate::utils::{format_epoch, truncate_text};

/// Maximum number of items listed individually
pub const MAX_LISTED_ITEMS: usize = 10;

/// Webhook limit for embed field names
const FIELD_NAME_LIMIT: usize = 256;

/// Webhook limit for embed field values
const FIELD_VALUE_LIMIT: usize = 1024;

/// Top-level webhook body
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WebhookPayload {
    pub content: String,
    pub embeds: Vec<Embed>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Embed {
    pub title: String,
    pub description: String,
    pub color: u32,
    pub timestamp: String,
    pub footer: EmbedFooter,
    pub fields: Vec<EmbedField>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbedFooter {
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbedField {
    pub name: String,
    pub value: String,
    pub inline: bool,
}

impl EmbedField {
    fn new(name: impl AsRef<str>, value: impl AsRef<str>, inline: bool) -> Self {
        Self {
            name: truncate_text(name.as_ref(), FIELD_NAME_LIMIT),
            value: truncate_text(value.as_ref(), FIELD_VALUE_LIMIT),
            inline,
        }
    }
}

/// Fixed texts of the update message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MessageTemplate {
    /// Attention-getting prefix sent as plain content
    pub content: String,

    /// Embed title
    pub title: String,

    /// Embed footer text
    pub footer: String,

    /// Advisory note appended after the item list
    pub advisory: String,

    /// Embed side color (0xRRGGBB)
    pub color: u32,
}

impl Default for MessageTemplate {
    fn default() -> Self {
        Self {
            content: "@here Mod updates detected!".to_string(),
            title: "🔄 Workshop Mod Updates Detected!".to_string(),
            footer: "Workshop Mod Monitor".to_string(),
            advisory: "Your server may need to be restarted to apply these mod updates."
                .to_string(),
            color: 0x00ff00,
        }
    }
}

impl MessageTemplate {
    /// Build the message for a change-set
    ///
    /// Lists at most [`MAX_LISTED_ITEMS`] items, then one "N more" entry,
    /// then the advisory note.
    pub fn build_payload(&self, events: &[ChangeEvent], at: DateTime<Utc>) -> WebhookPayload {
        let mut fields: Vec<EmbedField> = events
            .iter()
            .take(MAX_LISTED_ITEMS)
            .map(item_field)
            .collect();

        if events.len() > MAX_LISTED_ITEMS {
            fields.push(EmbedField::new(
                "➕ Additional Updates",
                format!(
                    "And {} more mods were updated.",
                    events.len() - MAX_LISTED_ITEMS
                ),
                false,
            ));
        }

        fields.push(EmbedField::new("⚠️ Action Required", &self.advisory, false));

        WebhookPayload {
            content: self.content.clone(),
            embeds: vec![Embed {
                title: self.title.clone(),
                description: format!("**{} mod(s) have been updated**", events.len()),
                color: self.color,
                timestamp: at.to_rfc3339(),
                footer: EmbedFooter {
                    text: self.footer.clone(),
                },
                fields,
            }],
        }
    }
}

fn item_field(event: &ChangeEvent) -> EmbedField {
    EmbedField::new(
        format!("📦 {}", event.display_name),
        format!(
            "**Updated:** {} UTC\n**ID:** `{}`\n[View on Workshop]({})",
            format_epoch(event.updated_at),
            event.id,
            event.detail_url
        ),
        true,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn events(n: usize) -> Vec<ChangeEvent> {
        (0..n)
            .map(|i| ChangeEvent {
                id: format!("{i}"),
                display_name: format!("Mod Number {i}"),
                updated_at: 1_700_000_000,
                detail_url: format!("https://example.com/?id={i}"),
            })
            .collect()
    }

    fn fields(payload: &WebhookPayload) -> &[EmbedField] {
        &payload.embeds[0].fields
    }

    #[test]
    fn test_small_change_set_lists_everything() {
        let payload = MessageTemplate::default().build_payload(&events(3), Utc::now());

        assert_eq!(payload.embeds.len(), 1);
        let fields = fields(&payload);
        // 3 items + advisory, no summary entry
        assert_eq!(fields.len(), 4);
        assert!(fields[..3].iter().all(|f| f.inline && f.name.starts_with("📦")));
        assert!(!fields.iter().any(|f| f.name.contains("Additional")));
        assert_eq!(payload.embeds[0].description, "**3 mod(s) have been updated**");
    }

    #[test]
    fn test_large_change_set_is_capped() {
        let payload = MessageTemplate::default().build_payload(&events(15), Utc::now());

        let fields = fields(&payload);
        assert_eq!(fields.len(), MAX_LISTED_ITEMS + 2);
        assert_eq!(fields.iter().filter(|f| f.name.starts_with("📦")).count(), 10);
        assert_eq!(fields[10].name, "➕ Additional Updates");
        assert_eq!(fields[10].value, "And 5 more mods were updated.");
        assert!(!fields[10].inline);
        assert_eq!(fields[11].name, "⚠️ Action Required");
        assert_eq!(payload.embeds[0].description, "**15 mod(s) have been updated**");
    }

    #[test]
    fn test_exactly_ten_has_no_summary() {
        let payload = MessageTemplate::default().build_payload(&events(10), Utc::now());
        assert_eq!(fields(&payload).len(), 11);
    }

    #[test]
    fn test_item_field_content() {
        let field = item_field(&ChangeEvent {
            id: "2579252958".to_string(),
            display_name: "Community Framework".to_string(),
            updated_at: 1_700_000_000,
            detail_url: "https://steamcommunity.com/sharedfiles/filedetails/?id=2579252958"
                .to_string(),
        });

        assert_eq!(field.name, "📦 Community Framework");
        assert_eq!(
            field.value,
            "**Updated:** 2023-11-14 22:13:20 UTC\n**ID:** `2579252958`\n\
             [View on Workshop](https://steamcommunity.com/sharedfiles/filedetails/?id=2579252958)"
        );
    }

    #[test]
    fn test_long_names_are_truncated() {
        let mut long = events(1);
        long[0].display_name = "x".repeat(400);
        let payload = MessageTemplate::default().build_payload(&long, Utc::now());
        assert_eq!(fields(&payload)[0].name.chars().count(), FIELD_NAME_LIMIT);
    }

    #[test]
    fn test_payload_serialization_shape() {
        let payload = MessageTemplate::default().build_payload(&events(1), Utc::now());
        let json = serde_json::to_value(&payload).unwrap();

        assert_eq!(json["content"], "@here Mod updates detected!");
        assert_eq!(json["embeds"][0]["color"], 0x00ff00);
        assert!(json["embeds"][0]["footer"]["text"].is_string());
        assert_eq!(json["embeds"][0]["fields"][0]["inline"], true);
    }
}
