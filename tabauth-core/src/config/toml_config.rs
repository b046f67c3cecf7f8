//! TOML configuration file I/O
//!
//! Handles loading and saving the configuration to/from TOML files
//! in the user's configuration directory.

use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::config::AppConfig;
use crate::error::{ConfigError, TabAuthError};
use crate::store::ENTRIES_FILE_NAME;

/// Default configuration file name
const CONFIG_FILE_NAME: &str = "config.toml";

/// Environment variable overriding the configuration directory
pub const CONFIG_DIR_ENV: &str = "TABAUTH_CONFIG_DIR";

/// Get the default configuration directory
///
/// Returns ~/.config/tabauth, or TABAUTH_CONFIG_DIR if set
pub fn get_config_dir() -> Result<PathBuf, TabAuthError> {
    if let Ok(config_dir) = std::env::var(CONFIG_DIR_ENV) {
        return Ok(PathBuf::from(config_dir));
    }

    let home = std::env::var("HOME").map_err(|_| {
        TabAuthError::Config(ConfigError::IoError {
            message: "HOME environment variable not set".to_string(),
        })
    })?;

    Ok(PathBuf::from(home).join(".config").join("tabauth"))
}

/// Get the default configuration file path
pub fn get_config_path() -> Result<PathBuf, TabAuthError> {
    Ok(get_config_dir()?.join(CONFIG_FILE_NAME))
}

/// Check if a configuration file exists
pub fn config_exists() -> Result<bool, TabAuthError> {
    Ok(get_config_path()?.exists())
}

/// Load configuration from the default TOML file
pub fn load_config() -> Result<AppConfig, TabAuthError> {
    load_config_from_path(get_config_path()?)
}

/// Load configuration from a specific TOML file
pub fn load_config_from_path<P: AsRef<Path>>(path: P) -> Result<AppConfig, TabAuthError> {
    let contents = std::fs::read_to_string(&path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => TabAuthError::Config(ConfigError::LoadFailed {
            path: path.as_ref().to_string_lossy().to_string(),
        }),
        _ => TabAuthError::Config(ConfigError::IoError {
            message: format!("Failed to read config file: {}", e),
        }),
    })?;

    let config: AppConfig = toml::from_str(&contents)?;

    config
        .validate()
        .map_err(|e| TabAuthError::Config(ConfigError::ValidationError { message: e }))?;

    debug!("Loaded configuration from {:?}", path.as_ref());
    Ok(config)
}

/// Save configuration to the default TOML file
pub fn save_config(config: &AppConfig) -> Result<(), TabAuthError> {
    save_config_to_path(config, get_config_path()?)
}

/// Save configuration to a specific TOML file
pub fn save_config_to_path<P: AsRef<Path>>(config: &AppConfig, path: P) -> Result<(), TabAuthError> {
    config
        .validate()
        .map_err(|e| TabAuthError::Config(ConfigError::ValidationError { message: e }))?;

    if let Some(parent) = path.as_ref().parent() {
        std::fs::create_dir_all(parent).map_err(|e| {
            TabAuthError::Config(ConfigError::IoError {
                message: format!("Failed to create config directory: {}", e),
            })
        })?;
    }

    let contents = toml::to_string_pretty(config)?;
    std::fs::write(&path, contents).map_err(|e| {
        TabAuthError::Config(ConfigError::IoError {
            message: format!("Failed to write config file: {}", e),
        })
    })?;

    info!("Saved configuration to {:?}", path.as_ref());
    Ok(())
}

/// Resolve where the entries file lives
///
/// Relative `entries_file` values are taken relative to the config directory.
pub fn entries_path(config: &AppConfig) -> Result<PathBuf, TabAuthError> {
    let config_dir = get_config_dir()?;
    Ok(match &config.entries_file {
        Some(path) if path.is_absolute() => path.clone(),
        Some(path) => config_dir.join(path),
        None => config_dir.join(ENTRIES_FILE_NAME),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_config_roundtrip() {
        let temp_dir = tempdir().unwrap();
        let config_path = temp_dir.path().join("nested").join("config.toml");

        let mut original = AppConfig::new("user-42".to_string());
        original.strict_secrets = true;
        original.entries_file = Some(PathBuf::from("/var/lib/tabauth/entries.toml"));

        save_config_to_path(&original, &config_path).unwrap();
        let loaded = load_config_from_path(&config_path).unwrap();

        assert_eq!(original, loaded);
    }

    #[test]
    fn test_missing_file_is_load_failed() {
        let temp_dir = tempdir().unwrap();
        let err = load_config_from_path(temp_dir.path().join("absent.toml")).unwrap_err();
        assert!(matches!(
            err,
            TabAuthError::Config(ConfigError::LoadFailed { .. })
        ));
    }

    #[test]
    fn test_invalid_config_not_saved() {
        let temp_dir = tempdir().unwrap();
        let path = temp_dir.path().join("config.toml");
        assert!(save_config_to_path(&AppConfig::default(), &path).is_err());
        assert!(!path.exists());
    }
}
