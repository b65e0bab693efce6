//! Common test utilities

use std::path::Path;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

use modwatch::config::Config;
use modwatch::models::ChangeEvent;
use serde_json::{json, Value};
use wiremock::{Request, Respond, ResponseTemplate};

/// Path the mocked Workshop details endpoint is mounted on
#[allow(dead_code)]
pub const DETAILS_PATH: &str = "/ISteamRemoteStorage/GetPublishedFileDetails/v1/";

/// Path the mocked webhook is mounted on
#[allow(dead_code)]
pub const WEBHOOK_PATH: &str = "/api/webhooks/1/token";

/// Generate `n` distinct ten-digit item ids
#[allow(dead_code)]
pub fn item_ids(n: usize) -> Vec<String> {
    (0..n).map(|i| (3_000_000_000u64 + i as u64).to_string()).collect()
}

/// Extract `publishedfileids[i]` values from a form-encoded request body
#[allow(dead_code)]
pub fn form_ids(body: &[u8]) -> Vec<String> {
    url::form_urlencoded::parse(body)
        .filter(|(key, _)| key.starts_with("publishedfileids["))
        .map(|(_, value)| value.into_owned())
        .collect()
}

/// Build a details response body
#[allow(dead_code)]
pub fn details_body(entries: &[(&str, &str, i64)]) -> Value {
    let details: Vec<Value> = entries
        .iter()
        .map(|(id, title, time_updated)| {
            json!({
                "publishedfileid": id,
                "result": 1,
                "title": title,
                "time_updated": time_updated,
            })
        })
        .collect();

    json!({
        "response": {
            "result": 1,
            "resultcount": details.len(),
            "publishedfiledetails": details,
        }
    })
}

/// Responder answering every requested id with one shared version
#[allow(dead_code)]
#[derive(Clone, Default)]
pub struct EchoDetails {
    pub time_updated: Arc<AtomicI64>,
}

#[allow(dead_code)]
impl EchoDetails {
    pub fn at(time_updated: i64) -> Self {
        Self {
            time_updated: Arc::new(AtomicI64::new(time_updated)),
        }
    }

    pub fn set(&self, time_updated: i64) {
        self.time_updated.store(time_updated, Ordering::SeqCst);
    }
}

impl Respond for EchoDetails {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        let version = self.time_updated.load(Ordering::SeqCst);
        let ids = form_ids(&request.body);
        let titles: Vec<String> = ids.iter().map(|id| format!("Workshop Mod {id}")).collect();
        let entries: Vec<(&str, &str, i64)> = ids
            .iter()
            .zip(&titles)
            .map(|(id, title)| (id.as_str(), title.as_str(), version))
            .collect();

        ResponseTemplate::new(200).set_body_json(details_body(&entries))
    }
}

/// Configuration pointing both endpoints at mock servers
#[allow(dead_code)]
pub fn test_config(catalog_uri: &str, webhook_uri: &str, ids: Vec<String>, db: &Path) -> Config {
    let content = format!(
        r#"
        [catalog]
        api_key = "TESTKEY"
        api_url = "{catalog_uri}{DETAILS_PATH}"
        batch_delay_ms = 0

        [notifier]
        webhook_url = "{webhook_uri}{WEBHOOK_PATH}"

        [scheduler]
        cooldown_secs = 1
        "#
    );

    let mut config: Config = toml::from_str(&content).unwrap();
    config.tracked.ids = ids;
    config.storage.sqlite_path = db.to_path_buf();
    config.validate().unwrap();
    config
}

/// Create `n` change events
#[allow(dead_code)]
pub fn change_events(n: usize) -> Vec<ChangeEvent> {
    item_ids(n)
        .into_iter()
        .enumerate()
        .map(|(i, id)| ChangeEvent {
            display_name: format!("Mod Number {i}"),
            updated_at: 1_700_000_000 + i as i64,
            detail_url: format!("https://steamcommunity.com/sharedfiles/filedetails/?id={id}"),
            id,
        })
        .collect()
}
