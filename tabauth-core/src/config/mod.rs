//! Configuration module
//!
//! Handles loading and saving authenticator configuration from TOML files.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

pub mod toml_config;

/// Default display refresh period in milliseconds
pub const DEFAULT_TICK_INTERVAL_MS: u64 = 1000;

/// Slowest refresh that still catches every 30-second window
const MAX_TICK_INTERVAL_MS: u64 = 30_000;

fn default_tick_interval_ms() -> u64 {
    DEFAULT_TICK_INTERVAL_MS
}

/// Authenticator configuration
///
/// Secrets never live here; they belong to the entry store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Owner of the entries this client reads and writes
    pub user_id: String,

    /// Entries file; defaults to `entries.toml` next to the config file
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entries_file: Option<PathBuf>,

    /// Reject manually entered secrets that are not well-formed Base32
    #[serde(default)]
    pub strict_secrets: bool,

    /// How often code displays refresh
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,
}

impl AppConfig {
    /// Create a new configuration with defaults for everything but the user
    pub fn new(user_id: String) -> Self {
        Self {
            user_id,
            entries_file: None,
            strict_secrets: false,
            tick_interval_ms: DEFAULT_TICK_INTERVAL_MS,
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.user_id.trim().is_empty() {
            return Err("User id cannot be empty".to_string());
        }

        if self.user_id.chars().any(char::is_whitespace) {
            return Err("User id cannot contain whitespace".to_string());
        }

        if self.tick_interval_ms == 0 {
            return Err("Tick interval cannot be zero".to_string());
        }

        if self.tick_interval_ms > MAX_TICK_INTERVAL_MS {
            return Err(format!(
                "Tick interval cannot exceed {} ms",
                MAX_TICK_INTERVAL_MS
            ));
        }

        Ok(())
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::new(String::new())
    }
}
