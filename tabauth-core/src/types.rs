//! Type definitions and wrappers for secure data handling
//!
//! This module provides type-safe wrappers for sensitive data using the
//! secrecy crate to prevent accidental exposure in logs or debug output,
//! plus the authenticator records shared by the store and the pipeline.

use secrecy::{ExposeSecret, Secret};
use serde::{Deserialize, Serialize};

use crate::auth::base32;
use crate::error::OtpError;

/// Issuer used when neither the QR payload nor the user supplies one
pub const DEFAULT_ISSUER: &str = "Unknown";

/// Account name used when neither the QR payload nor the user supplies one
pub const DEFAULT_ACCOUNT_NAME: &str = "Account";

/// Wrapper for a Base32-encoded authenticator secret
///
/// This type ensures OTP secrets are never accidentally logged or exposed
/// in debug output.
#[derive(Clone, Debug)]
pub struct OtpSecret(Secret<String>);

impl OtpSecret {
    /// Create a new OtpSecret from a Base32-encoded string
    pub fn new(secret: String) -> Self {
        Self(Secret::new(secret))
    }

    /// Expose the secret value (use with caution!)
    ///
    /// This should only be called when absolutely necessary,
    /// such as when passing to cryptographic functions or persisting it.
    pub fn expose(&self) -> &str {
        self.0.expose_secret()
    }

    /// Decode into raw key bytes, skipping characters outside the alphabet
    pub fn key_bytes(&self) -> Vec<u8> {
        base32::decode_base32(self.expose())
    }

    /// Validate that the secret is well-formed Base32
    pub fn validate_base32(&self) -> Result<(), OtpError> {
        base32::decode_base32_strict(self.expose()).map(|_| ())
    }
}

impl From<String> for OtpSecret {
    fn from(secret: String) -> Self {
        Self::new(secret)
    }
}

impl From<&str> for OtpSecret {
    fn from(secret: &str) -> Self {
        Self::new(secret.to_string())
    }
}

/// Wrapper for generated TOTP tokens
///
/// Generated OTP tokens should also be treated as sensitive data
/// and never logged, even though they have a short lifetime.
#[derive(Clone, Debug)]
pub struct TotpToken(Secret<String>);

impl TotpToken {
    /// Create a new TotpToken from a generated token string
    pub fn new(token: String) -> Self {
        Self(Secret::new(token))
    }

    /// Expose the token value (use with caution!)
    pub fn expose(&self) -> &str {
        self.0.expose_secret()
    }
}

impl From<String> for TotpToken {
    fn from(token: String) -> Self {
        Self::new(token)
    }
}

/// Persisted authenticator account
///
/// Owned by the entry store. The code generator only ever reads `secret`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthenticatorEntry {
    pub id: String,
    pub user_id: String,
    pub issuer: String,
    pub account_name: String,
    pub secret: String,
    pub sort_order: i64,
    /// RFC 3339 timestamp
    pub created_at: String,
    /// RFC 3339 timestamp
    pub updated_at: String,
}

impl AuthenticatorEntry {
    /// The entry secret, wrapped for code generation
    pub fn otp_secret(&self) -> OtpSecret {
        OtpSecret::new(self.secret.clone())
    }

    /// Case-insensitive match against issuer or account name
    ///
    /// A blank query matches everything.
    pub fn matches(&self, query: &str) -> bool {
        let query = query.trim().to_lowercase();
        query.is_empty()
            || self.issuer.to_lowercase().contains(&query)
            || self.account_name.to_lowercase().contains(&query)
    }
}

/// Fields needed to create an entry
#[derive(Clone, Debug)]
pub struct NewEntry {
    pub issuer: String,
    pub account_name: String,
    pub secret: OtpSecret,
}

impl NewEntry {
    /// Build a new entry, trimming fields and applying the issuer/account defaults
    pub fn new(issuer: &str, account_name: &str, secret: &str) -> Self {
        Self {
            issuer: or_default(issuer, DEFAULT_ISSUER),
            account_name: or_default(account_name, DEFAULT_ACCOUNT_NAME),
            secret: OtpSecret::new(secret.trim().to_string()),
        }
    }
}

/// Result of parsing an `otpauth://` URI
#[derive(Clone, Debug)]
pub struct ParsedOtpAuth {
    pub issuer: String,
    pub account_name: String,
    pub secret: OtpSecret,
}

impl From<ParsedOtpAuth> for NewEntry {
    fn from(parsed: ParsedOtpAuth) -> Self {
        NewEntry::new(&parsed.issuer, &parsed.account_name, parsed.secret.expose())
    }
}

/// Trimmed value, or `default` when blank
pub(crate) fn or_default(value: &str, default: &str) -> String {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        default.to_string()
    } else {
        trimmed.to_string()
    }
}
