//! Integration tests for configuration loading and validation

use std::path::PathBuf;

use tabauth_core::config::toml_config::{entries_path, load_config_from_path, save_config_to_path};
use tabauth_core::config::{AppConfig, DEFAULT_TICK_INTERVAL_MS};
use tabauth_core::error::{ConfigError, TabAuthError};
use tempfile::tempdir;

#[test]
fn test_valid_config() {
    let config = AppConfig::new("alice".to_string());
    assert!(config.validate().is_ok());
    assert_eq!(config.tick_interval_ms, DEFAULT_TICK_INTERVAL_MS);
    assert!(!config.strict_secrets);
}

#[test]
fn test_empty_user_id() {
    let config = AppConfig::new("  ".to_string());
    assert_eq!(config.validate().unwrap_err(), "User id cannot be empty");
}

#[test]
fn test_load_full_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(
        &path,
        r#"
user_id = "alice"
entries_file = "/srv/tabauth/entries.toml"
strict_secrets = true
tick_interval_ms = 500
"#,
    )
    .unwrap();

    let config = load_config_from_path(&path).unwrap();
    assert_eq!(config.user_id, "alice");
    assert!(config.strict_secrets);
    assert_eq!(config.tick_interval_ms, 500);
    assert_eq!(
        entries_path(&config).unwrap(),
        PathBuf::from("/srv/tabauth/entries.toml")
    );
}

#[test]
fn test_invalid_file_rejected_on_load() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, "user_id = \"alice\"\ntick_interval_ms = 0\n").unwrap();

    let err = load_config_from_path(&path).unwrap_err();
    assert!(matches!(
        err,
        TabAuthError::Config(ConfigError::ValidationError { .. })
    ));
}

#[test]
fn test_malformed_toml() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, "user_id = ").unwrap();

    assert!(matches!(
        load_config_from_path(&path).unwrap_err(),
        TabAuthError::Toml(_)
    ));
}

#[test]
fn test_saved_file_omits_unset_entries_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("config.toml");
    save_config_to_path(&AppConfig::new("alice".to_string()), &path).unwrap();

    let contents = std::fs::read_to_string(&path).unwrap();
    assert!(contents.contains("user_id = \"alice\""));
    assert!(!contents.contains("entries_file"));
}
