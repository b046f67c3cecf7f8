//! Setup command implementation
//!
//! Interactive command for first-time configuration.

use std::path::PathBuf;

use tabauth_core::config::toml_config::{self, entries_path};
use tabauth_core::config::{AppConfig, DEFAULT_TICK_INTERVAL_MS};
use tabauth_core::error::{ConfigError, TabAuthError};
use tabauth_core::store::TomlEntryStore;

use crate::cli::prompt::{prompt_optional, prompt_required, prompt_yes_no};

/// Run the setup command
pub fn run_setup() -> Result<(), TabAuthError> {
    println!("🔐 tabauth Setup");
    println!("================");
    println!();
    println!("Configuration will be saved to {}", toml_config::get_config_path()?.display());
    println!();

    // Check if already configured
    if let Ok(true) = toml_config::config_exists() {
        println!("⚠️  Existing configuration detected.");
        if !prompt_yes_no("Overwrite existing setup?", false)? {
            println!("Setup cancelled.");
            return Ok(());
        }
        println!();
    }

    let config = collect_config()?;

    config.validate().map_err(|e| {
        TabAuthError::Config(ConfigError::ValidationError {
            message: format!("Configuration validation failed: {}", e),
        })
    })?;

    println!();
    println!("💾 Saving configuration...");
    toml_config::save_config(&config)?;

    // Opening validates an existing entries file before we report success
    let store = TomlEntryStore::open(entries_path(&config)?)?;

    println!("✅ Setup complete!");
    println!("Entries are stored in {}", store.path().display());
    println!();
    println!("You can now use:");
    println!("  tabauth add      - Add an account by secret");
    println!("  tabauth scan     - Add an account from a QR code image");
    println!("  tabauth codes    - Show current codes");

    Ok(())
}

/// Collect configuration interactively
fn collect_config() -> Result<AppConfig, TabAuthError> {
    let default_user = std::env::var("USER").unwrap_or_default();
    let user_id = prompt_required("User id", &default_user)?;

    let entries_file = prompt_optional("Entries file (blank for the default location)", "")?;
    let strict_secrets = prompt_yes_no("Reject secrets that are not valid Base32?", false)?;

    let tick_interval_ms: u64 = prompt_optional(
        "Code refresh interval in milliseconds",
        &DEFAULT_TICK_INTERVAL_MS.to_string(),
    )?
    .parse()
    .map_err(|_| {
        TabAuthError::Config(ConfigError::ValidationError {
            message: "Invalid refresh interval".to_string(),
        })
    })?;

    Ok(AppConfig {
        user_id,
        entries_file: (!entries_file.is_empty()).then(|| PathBuf::from(entries_file)),
        strict_secrets,
        tick_interval_ms,
    })
}
