//! Configuration management for the modwatch monitor
//!
//! Configuration comes either from a TOML file (path in `MODWATCH_CONFIG`)
//! or from `MODWATCH_*` environment variables. Credentials and the tracked
//! id list are always supplied here, never compiled in.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::catalog::{steam::DEFAULT_API_URL, MAX_BATCH_SIZE};
use crate::notifications::MessageTemplate;
use crate::reconciler::DEFAULT_DETAIL_URL;
use crate::scheduler::{DEFAULT_COOLDOWN, DEFAULT_INTERVAL};
use crate::utils::dedup_ids;

/// Environment variable naming a TOML config file
pub const CONFIG_PATH_ENV: &str = "MODWATCH_CONFIG";

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Catalog lookup configuration
    pub catalog: CatalogConfig,

    /// Notification configuration
    pub notifier: NotifierConfig,

    /// Tracked item ids
    #[serde(default)]
    pub tracked: TrackedConfig,

    /// State store configuration
    #[serde(default)]
    pub storage: StorageConfig,

    /// Loop timing configuration
    #[serde(default)]
    pub scheduler: SchedulerConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Catalog service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogConfig {
    /// Steam Web API key
    pub api_key: String,

    /// Lookup endpoint
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Ids per lookup request (1..=100)
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Spacing between lookup requests in milliseconds
    #[serde(default = "default_batch_delay_ms")]
    pub batch_delay_ms: u64,

    /// Lookup request timeout in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Detail page template, `{id}` is replaced by the item id
    #[serde(default = "default_detail_url")]
    pub detail_url_template: String,
}

/// Notification sink configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotifierConfig {
    /// Webhook endpoint
    pub webhook_url: String,

    /// Delivery timeout in seconds
    #[serde(default = "default_webhook_timeout")]
    pub timeout_secs: u64,

    /// Message texts
    #[serde(default)]
    pub message: MessageTemplate,
}

/// Tracked id sources; both are merged, inline ids first
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TrackedConfig {
    /// Inline ids
    #[serde(default)]
    pub ids: Vec<String>,

    /// File with ids, one per line (`#` starts a comment)
    pub file: Option<PathBuf>,
}

/// State store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// SQLite database path
    pub sqlite_path: PathBuf,
}

/// Loop timing configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Seconds between cycles in continuous mode
    pub interval_secs: u64,

    /// Seconds to wait after a failed cycle
    pub cooldown_secs: u64,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// Log format (text, json)
    pub format: String,
}

fn default_api_url() -> String {
    DEFAULT_API_URL.to_string()
}

fn default_batch_size() -> usize {
    MAX_BATCH_SIZE
}

fn default_batch_delay_ms() -> u64 {
    1000
}

fn default_request_timeout() -> u64 {
    30
}

fn default_detail_url() -> String {
    DEFAULT_DETAIL_URL.to_string()
}

fn default_webhook_timeout() -> u64 {
    10
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            sqlite_path: PathBuf::from("mod_updates.db"),
        }
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            interval_secs: DEFAULT_INTERVAL.as_secs(),
            cooldown_secs: DEFAULT_COOLDOWN.as_secs(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: String::from("info"),
            format: String::from("text"),
        }
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.trim().parse::<T>().ok())
}

impl Config {
    /// Load from the file named by `MODWATCH_CONFIG`, or from the environment
    pub fn load() -> Result<Self> {
        match std::env::var(CONFIG_PATH_ENV) {
            Ok(path) if !path.trim().is_empty() => Self::from_file(Path::new(path.trim())),
            _ => Self::from_env(),
        }
    }

    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("MODWATCH_STEAM_API_KEY").unwrap_or_default();
        let webhook_url = std::env::var("MODWATCH_WEBHOOK_URL").unwrap_or_default();

        let ids = std::env::var("MODWATCH_TRACKED_IDS")
            .map(|v| parse_id_list(&v))
            .unwrap_or_default();
        let file = std::env::var("MODWATCH_TRACKED_FILE")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .map(PathBuf::from);

        let sqlite_path = std::env::var("MODWATCH_DB_PATH")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| StorageConfig::default().sqlite_path);

        let defaults = SchedulerConfig::default();
        let interval_secs = env_parse("MODWATCH_INTERVAL_SECS").unwrap_or(defaults.interval_secs);
        let cooldown_secs = env_parse("MODWATCH_COOLDOWN_SECS").unwrap_or(defaults.cooldown_secs);

        let log_level =
            std::env::var("MODWATCH_LOG_LEVEL").unwrap_or_else(|_| String::from("info"));
        let log_format =
            std::env::var("MODWATCH_LOG_FORMAT").unwrap_or_else(|_| String::from("text"));

        Ok(Self {
            catalog: CatalogConfig {
                api_key,
                api_url: std::env::var("MODWATCH_API_URL").unwrap_or_else(|_| default_api_url()),
                batch_size: env_parse("MODWATCH_BATCH_SIZE").unwrap_or_else(default_batch_size),
                batch_delay_ms: env_parse("MODWATCH_BATCH_DELAY_MS")
                    .unwrap_or_else(default_batch_delay_ms),
                request_timeout_secs: default_request_timeout(),
                detail_url_template: default_detail_url(),
            },
            notifier: NotifierConfig {
                webhook_url,
                timeout_secs: default_webhook_timeout(),
                message: MessageTemplate::default(),
            },
            tracked: TrackedConfig { ids, file },
            storage: StorageConfig { sqlite_path },
            scheduler: SchedulerConfig {
                interval_secs,
                cooldown_secs,
            },
            logging: LoggingConfig {
                level: log_level,
                format: log_format,
            },
        })
    }

    /// Load configuration from a file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse TOML config file: {}", path.display()))?;

        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.catalog.api_key.trim().is_empty() {
            anyhow::bail!("catalog.api_key is empty (set MODWATCH_STEAM_API_KEY)");
        }

        validate_http_url("catalog.api_url", &self.catalog.api_url)?;
        validate_http_url("notifier.webhook_url", &self.notifier.webhook_url)?;

        if !(1..=MAX_BATCH_SIZE).contains(&self.catalog.batch_size) {
            anyhow::bail!("catalog.batch_size must be between 1 and {MAX_BATCH_SIZE}");
        }

        if !self.catalog.detail_url_template.contains("{id}") {
            anyhow::bail!("catalog.detail_url_template must contain an {{id}} placeholder");
        }

        if self.catalog.request_timeout_secs == 0 || self.notifier.timeout_secs == 0 {
            anyhow::bail!("request timeouts must be greater than 0");
        }

        if self.scheduler.interval_secs == 0 {
            anyhow::bail!("scheduler.interval_secs must be greater than 0");
        }

        if self.scheduler.cooldown_secs == 0 {
            anyhow::bail!("scheduler.cooldown_secs must be at least 1");
        }

        if self.storage.sqlite_path.as_os_str().to_string_lossy().trim().is_empty() {
            anyhow::bail!("storage.sqlite_path is empty (set MODWATCH_DB_PATH)");
        }

        if self.tracked.ids.is_empty() && self.tracked.file.is_none() {
            anyhow::bail!(
                "no tracked ids configured (set MODWATCH_TRACKED_IDS or MODWATCH_TRACKED_FILE)"
            );
        }

        Ok(())
    }

    /// Resolve the tracked id population: inline ids, then the id file, deduplicated
    pub fn tracked_ids(&self) -> Result<Vec<String>> {
        let mut ids = self.tracked.ids.clone();

        if let Some(path) = &self.tracked.file {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read tracked id file: {}", path.display()))?;
            ids.extend(parse_id_list(&content));
        }

        let ids = dedup_ids(ids);
        if ids.is_empty() {
            anyhow::bail!("tracked id list is empty");
        }

        Ok(ids)
    }

    /// Get the continuous-mode interval as Duration
    #[must_use]
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.scheduler.interval_secs)
    }

    /// Get the after-error cooldown as Duration
    #[must_use]
    pub fn cooldown(&self) -> Duration {
        Duration::from_secs(self.scheduler.cooldown_secs)
    }

    /// Get the inter-batch spacing as Duration
    #[must_use]
    pub fn batch_delay(&self) -> Duration {
        Duration::from_millis(self.catalog.batch_delay_ms)
    }

    /// Get the lookup request timeout as Duration
    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.catalog.request_timeout_secs)
    }

    /// Get the webhook delivery timeout as Duration
    #[must_use]
    pub fn webhook_timeout(&self) -> Duration {
        Duration::from_secs(self.notifier.timeout_secs)
    }
}

fn validate_http_url(field: &str, value: &str) -> Result<()> {
    let parsed = url::Url::parse(value).with_context(|| format!("{field} is not a valid URL"))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        anyhow::bail!("{field} must use http or https");
    }
    Ok(())
}

/// Split an id list on newlines, commas, and whitespace; `#` starts a comment
pub fn parse_id_list(content: &str) -> Vec<String> {
    content
        .lines()
        .map(|line| line.split('#').next().unwrap_or_default())
        .flat_map(|line| line.split(|c: char| c == ',' || c.is_whitespace()))
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(String::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const MINIMAL: &str = r#"
        [catalog]
        api_key = "KEY"

        [notifier]
        webhook_url = "https://discord.com/api/webhooks/1/abc"

        [tracked]
        ids = ["2579252958", "1559212036"]
    "#;

    fn minimal() -> Config {
        toml::from_str(MINIMAL).unwrap()
    }

    #[test]
    fn test_minimal_file_gets_defaults() {
        let config = minimal();
        assert!(config.validate().is_ok());
        assert_eq!(config.catalog.batch_size, 100);
        assert_eq!(config.catalog.api_url, DEFAULT_API_URL);
        assert_eq!(config.interval(), Duration::from_secs(3600));
        assert_eq!(config.cooldown(), Duration::from_secs(60));
        assert_eq!(config.batch_delay(), Duration::from_secs(1));
        assert_eq!(config.request_timeout(), Duration::from_secs(30));
        assert_eq!(config.notifier.timeout_secs, 10);
        assert_eq!(config.storage.sqlite_path, PathBuf::from("mod_updates.db"));
    }

    #[test]
    fn test_validation_failures() {
        let mut config = minimal();
        config.catalog.api_key = "  ".to_string();
        assert!(config.validate().is_err());

        let mut config = minimal();
        config.notifier.webhook_url = "discord.com/webhook".to_string();
        assert!(config.validate().is_err());

        let mut config = minimal();
        config.catalog.batch_size = 101;
        assert!(config.validate().is_err());

        let mut config = minimal();
        config.scheduler.interval_secs = 0;
        assert!(config.validate().is_err());

        let mut config = minimal();
        config.scheduler.cooldown_secs = 0;
        assert!(config.validate().is_err());

        let mut config = minimal();
        config.storage.sqlite_path = PathBuf::new();
        assert!(config.validate().is_err());

        let mut config = minimal();
        config.tracked.ids.clear();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_sections_use_defaults() {
        let config: Config = toml::from_str(&format!(
            "{MINIMAL}\n[scheduler]\ncooldown_secs = 5\n\n[storage]\n\n[logging]\nformat = \"json\"\n"
        ))
        .unwrap();

        assert_eq!(config.scheduler.cooldown_secs, 5);
        assert_eq!(config.scheduler.interval_secs, 3600);
        assert_eq!(config.storage.sqlite_path, PathBuf::from("mod_updates.db"));
        assert_eq!(config.logging.format, "json");
        assert_eq!(config.logging.level, "info");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_id_list() {
        let ids = parse_id_list("# server mods\n2579252958\n\n3413364741, 2628707698 # CF\n");
        assert_eq!(ids, vec!["2579252958", "3413364741", "2628707698"]);
    }

    #[test]
    fn test_tracked_ids_merges_file_and_dedups() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "1559212036\n3").unwrap();

        let mut config = minimal();
        config.tracked.file = Some(file.path().to_path_buf());

        assert_eq!(
            config.tracked_ids().unwrap(),
            vec!["2579252958", "1559212036", "3"]
        );
    }

    #[test]
    fn test_tracked_ids_missing_file() {
        let mut config = minimal();
        config.tracked.file = Some(PathBuf::from("/nonexistent/ids.txt"));
        assert!(config.tracked_ids().is_err());
    }

    #[test]
    fn test_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{MINIMAL}\n[scheduler]\ninterval_secs = 600\ncooldown_secs = 5\n").unwrap();

        let config = Config::from_file(file.path()).unwrap();
        assert_eq!(config.scheduler.interval_secs, 600);
        assert_eq!(config.scheduler.cooldown_secs, 5);
    }

    #[test]
    #[serial]
    fn test_from_env() {
        std::env::set_var("MODWATCH_STEAM_API_KEY", "ENVKEY");
        std::env::set_var("MODWATCH_WEBHOOK_URL", "https://example.com/hook");
        std::env::set_var("MODWATCH_TRACKED_IDS", "1,2, 3");
        std::env::set_var("MODWATCH_BATCH_SIZE", "50");
        std::env::set_var("MODWATCH_INTERVAL_SECS", "not-a-number");
        std::env::set_var("MODWATCH_DB_PATH", "");

        let config = Config::from_env().unwrap();

        for key in [
            "MODWATCH_STEAM_API_KEY",
            "MODWATCH_WEBHOOK_URL",
            "MODWATCH_TRACKED_IDS",
            "MODWATCH_BATCH_SIZE",
            "MODWATCH_INTERVAL_SECS",
            "MODWATCH_DB_PATH",
        ] {
            std::env::remove_var(key);
        }

        assert_eq!(config.catalog.api_key, "ENVKEY");
        assert_eq!(config.catalog.batch_size, 50);
        assert_eq!(config.tracked.ids, vec!["1", "2", "3"]);
        assert_eq!(config.scheduler.interval_secs, 3600);
        assert_eq!(config.storage.sqlite_path, PathBuf::from("mod_updates.db"));
        assert!(config.validate().is_ok());
    }

    #[test]
    #[serial]
    fn test_load_prefers_config_file() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{MINIMAL}").unwrap();
        std::env::set_var(CONFIG_PATH_ENV, file.path());

        let config = Config::load();
        std::env::remove_var(CONFIG_PATH_ENV);

        assert_eq!(config.unwrap().catalog.api_key, "KEY");
    }
}
