//! Tests for config loading

use std::io::Write;
use std::path::Path;

use modwatch::config::Config;
use modwatch::notifications::MessageTemplate;
use tempfile::NamedTempFile;

#[test]
fn test_example_config_parses_and_validates() {
    let config = Config::from_file(Path::new("config.example.toml"))
        .expect("config.example.toml should parse");

    assert!(config.validate().is_ok());
    assert_eq!(config.catalog.batch_size, 100);
    assert_eq!(config.catalog.batch_delay_ms, 1000);
    assert_eq!(config.scheduler.interval_secs, 3600);
    assert_eq!(config.scheduler.cooldown_secs, 60);
    assert_eq!(config.notifier.message, MessageTemplate::default());
    assert_eq!(config.logging.format, "text");
    assert_eq!(config.tracked_ids().unwrap().len(), 3);
}

#[test]
fn test_tracked_file_is_merged() {
    let mut ids = NamedTempFile::new().unwrap();
    writeln!(ids, "# extra mods").unwrap();
    writeln!(ids, "2116157322").unwrap();
    writeln!(ids, "3413364741 # new map").unwrap();

    let content = format!(
        r#"
        [catalog]
        api_key = "KEY"

        [notifier]
        webhook_url = "https://example.com/hook"

        [tracked]
        ids = ["2579252958", "2116157322"]
        file = "{}"
        "#,
        ids.path().display()
    );
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();

    let config = Config::from_file(file.path()).unwrap();
    assert!(config.validate().is_ok());
    assert_eq!(
        config.tracked_ids().unwrap(),
        vec!["2579252958", "2116157322", "3413364741"]
    );
}

#[test]
fn test_missing_required_section_is_rejected() {
    let mut file = NamedTempFile::new().unwrap();
    write!(file, "[catalog]\napi_key = \"KEY\"\n").unwrap();

    assert!(Config::from_file(file.path()).is_err());
}

#[test]
fn test_missing_file_is_rejected() {
    assert!(Config::from_file(Path::new("does-not-exist.toml")).is_err());
}
