//! CLI command implementations
//!
//! This module contains the implementation of all CLI subcommands plus the
//! pieces they share: opening the entry store and turning errors into exit codes.

use regex::Regex;
use tabauth_core::config::toml_config::{entries_path, load_config};
use tabauth_core::config::AppConfig;
use tabauth_core::error::{PipelineError, StoreError, TabAuthError};
use tabauth_core::store::TomlEntryStore;

pub mod codes;
pub mod entries;
pub mod prompt;
pub mod scan;
pub mod setup;

/// Store messages that mean the backing table was never created
const MISSING_TABLE_PATTERN: &str = r"(?i)schema cache|could not find the table";

/// Loaded configuration plus the store it points at
pub struct Session {
    pub config: AppConfig,
    pub store: TomlEntryStore,
}

/// Load the configuration and open the entry store
pub fn open_session() -> Result<Session, TabAuthError> {
    let config = load_config()?;
    let store = TomlEntryStore::open(entries_path(&config)?)?;
    Ok(Session { config, store })
}

/// Map an error to the process exit code
///
/// 2 for configuration and input problems, 1 for runtime failures.
pub fn exit_code(error: &TabAuthError) -> i32 {
    match error {
        TabAuthError::Config(_) | TabAuthError::Toml(_) | TabAuthError::TomlSerialize(_) => 2,
        TabAuthError::Otp(_) | TabAuthError::OtpAuth(_) | TabAuthError::Raster(_) => 2,
        TabAuthError::Store(store_error) => store_exit_code(store_error),
        TabAuthError::Pipeline(pipeline_error) => match pipeline_error {
            PipelineError::NoImage
            | PipelineError::NotAnImage
            | PipelineError::UnsupportedFormat
            | PipelineError::Raster(_)
            | PipelineError::OtpAuth(_) => 2,
            PipelineError::Busy | PipelineError::QrNotFound => 1,
            PipelineError::SaveFailed(store_error) => store_exit_code(store_error),
        },
        TabAuthError::Io(_) => 1,
    }
}

fn store_exit_code(error: &StoreError) -> i32 {
    match error {
        StoreError::MissingSecret | StoreError::NotFound { .. } | StoreError::ReorderMismatch => 2,
        StoreError::ReadFailed { .. } | StoreError::WriteFailed { .. } => 1,
    }
}

/// Remediation hint for store errors caused by missing storage
pub fn storage_hint(error: &TabAuthError) -> Option<&'static str> {
    let store_error = match error {
        TabAuthError::Store(e) | TabAuthError::Pipeline(PipelineError::SaveFailed(e)) => e,
        _ => return None,
    };
    let message = store_error.to_string();
    let missing_table = Regex::new(MISSING_TABLE_PATTERN)
        .map(|re| re.is_match(&message))
        .unwrap_or(false);

    missing_table.then_some(
        "hint: the authenticator storage has not been created yet. Run `tabauth setup` and try again",
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use tabauth_core::error::{ConfigError, OtpAuthError};

    #[test]
    fn test_exit_codes() {
        let config = TabAuthError::Config(ConfigError::LoadFailed {
            path: "x".to_string(),
        });
        assert_eq!(exit_code(&config), 2);
        assert_eq!(exit_code(&PipelineError::QrNotFound.into()), 1);
        assert_eq!(
            exit_code(&PipelineError::OtpAuth(OtpAuthError::MissingSecret).into()),
            2
        );
        assert_eq!(exit_code(&StoreError::MissingSecret.into()), 2);
        assert_eq!(
            exit_code(
                &StoreError::WriteFailed {
                    message: "disk full".to_string()
                }
                .into()
            ),
            1
        );
    }

    #[test]
    fn test_storage_hint_matches_missing_table() {
        let err: TabAuthError = StoreError::ReadFailed {
            message: "Could not find the table 'public.authenticator_entries' in the Schema Cache"
                .to_string(),
        }
        .into();
        assert!(storage_hint(&err).is_some());

        let saved: TabAuthError = PipelineError::SaveFailed(StoreError::WriteFailed {
            message: "schema cache stale".to_string(),
        })
        .into();
        assert!(storage_hint(&saved).is_some());

        let other: TabAuthError = StoreError::ReadFailed {
            message: "permission denied".to_string(),
        }
        .into();
        assert!(storage_hint(&other).is_none());
    }
}
