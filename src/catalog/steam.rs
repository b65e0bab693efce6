//! Steam Workshop catalog source
//!
//! Looks up published file details through
//! `ISteamRemoteStorage/GetPublishedFileDetails/v1`. The endpoint takes a
//! form-encoded POST:
//!
//! ```text
//! key=<api key>&itemcount=2&format=json
//!     &publishedfileids[0]=2579252958&publishedfileids[1]=1559212036
//! ```
//!
//! and answers with
//!
//! ```json
//! {"response": {"result": 1, "resultcount": 2, "publishedfiledetails": [
//!     {"publishedfileid": "2579252958", "result": 1, "title": "...", "time_updated": 1700000000},
//!     {"publishedfileid": "1559212036", "result": 9}
//! ]}}
//! ```

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

use super::CatalogSource;
use crate::models::LookupResult;
use crate::utils::error::CatalogError;

/// Public Steam Web API endpoint for published file details
pub const DEFAULT_API_URL: &str =
    "https://api.steampowered.com/ISteamRemoteStorage/GetPublishedFileDetails/v1/";

/// Per-request timeout for lookups
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// `result` value Steam uses for a successful per-item lookup
const RESULT_OK: i64 = 1;

#[derive(Debug, Deserialize)]
struct DetailsEnvelope {
    response: Option<DetailsResponse>,
}

#[derive(Debug, Deserialize)]
struct DetailsResponse {
    publishedfiledetails: Option<Vec<FileDetails>>,
}

#[derive(Debug, Deserialize)]
struct FileDetails {
    #[serde(default)]
    publishedfileid: String,
    #[serde(default)]
    result: i64,
    title: Option<String>,
    time_updated: Option<i64>,
}

impl From<FileDetails> for LookupResult {
    fn from(details: FileDetails) -> Self {
        LookupResult::new(
            details.result == RESULT_OK,
            details.publishedfileid,
            details.title,
            details.time_updated,
        )
    }
}

/// Catalog source backed by the Steam Web API
pub struct SteamWorkshopSource {
    client: Client,
    api_url: String,
    api_key: String,
}

impl SteamWorkshopSource {
    /// Create a source against the public Steam endpoint
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Http` if the HTTP client cannot be created
    pub fn new(api_key: impl Into<String>) -> Result<Self, CatalogError> {
        Self::with_config(DEFAULT_API_URL, api_key, DEFAULT_TIMEOUT)
    }

    /// Create a source with a custom endpoint and timeout (mock servers, proxies)
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::InvalidUrl` for a non-http(s) endpoint and
    /// `CatalogError::Http` if the HTTP client cannot be created
    pub fn with_config(
        api_url: impl Into<String>,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, CatalogError> {
        let api_url = api_url.into();
        match url::Url::parse(&api_url) {
            Ok(parsed) if matches!(parsed.scheme(), "http" | "https") => {}
            _ => return Err(CatalogError::InvalidUrl(api_url)),
        }

        let client = Client::builder().timeout(timeout).gzip(true).build()?;

        Ok(Self {
            client,
            api_url,
            api_key: api_key.into(),
        })
    }

    /// Build the form fields for one lookup request
    fn build_form(&self, ids: &[String]) -> Vec<(String, String)> {
        let mut form = Vec::with_capacity(ids.len() + 3);
        form.push(("key".to_string(), self.api_key.clone()));
        form.push(("itemcount".to_string(), ids.len().to_string()));
        form.push(("format".to_string(), "json".to_string()));
        form.extend(
            ids.iter()
                .enumerate()
                .map(|(i, id)| (format!("publishedfileids[{i}]"), id.clone())),
        );
        form
    }

    fn map_send_error(err: reqwest::Error) -> CatalogError {
        if err.is_timeout() {
            CatalogError::Timeout
        } else {
            CatalogError::Http(err)
        }
    }
}

/// Flatten a decoded response into per-id results
fn parse_details(envelope: DetailsEnvelope) -> Result<Vec<LookupResult>, CatalogError> {
    let details = envelope
        .response
        .ok_or_else(|| CatalogError::MalformedResponse("missing `response` object".to_string()))?
        .publishedfiledetails
        .ok_or_else(|| {
            CatalogError::MalformedResponse("missing `publishedfiledetails` list".to_string())
        })?;

    Ok(details
        .into_iter()
        .filter(|d| {
            let has_id = !d.publishedfileid.trim().is_empty();
            if !has_id {
                tracing::debug!(result = d.result, "Dropping file details without an id");
            }
            has_id
        })
        .map(LookupResult::from)
        .collect())
}

#[async_trait]
impl CatalogSource for SteamWorkshopSource {
    fn name(&self) -> &str {
        "steam-workshop"
    }

    async fn lookup(&self, ids: &[String]) -> Result<Vec<LookupResult>, CatalogError> {
        let form = self.build_form(ids);

        let response = self
            .client
            .post(&self.api_url)
            .form(&form)
            .send()
            .await
            .map_err(Self::map_send_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(CatalogError::ServerError(status.as_u16()));
        }

        let body = response.text().await.map_err(Self::map_send_error)?;
        let envelope: DetailsEnvelope = serde_json::from_str(&body)
            .map_err(|e| CatalogError::MalformedResponse(e.to_string()))?;

        parse_details(envelope)
    }
}
