//! TOTP (Time-based One-Time Password) generation
//!
//! Implements RFC 6238 with SHA-1, a 30-second step and 6 digits, the only
//! parameters authenticator QR codes are expected to carry here.

use std::time::{SystemTime, UNIX_EPOCH};

use serde::Serialize;

use crate::auth::hmac::{sign_counter, DIGEST_LEN};
use crate::error::OtpError;
use crate::types::{OtpSecret, TotpToken};

/// RFC 6238 default time step
pub const TOTP_STEP_SECONDS: u64 = 30;

/// Number of digits in a generated code
pub const TOTP_DIGITS: usize = 6;

/// Shown in place of a code that could not be generated
pub const CODE_PLACEHOLDER: &str = "------";

const MODULUS: u32 = 1_000_000;

/// A code together with the seconds it stays valid
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TotpCode {
    pub code: String,
    pub seconds_remaining: u64,
}

impl TotpCode {
    /// Whether the code is about to roll over
    pub fn is_expiring(&self) -> bool {
        self.seconds_remaining <= 5
    }
}

/// Current Unix time in whole seconds
pub fn unix_now() -> Result<u64, OtpError> {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .map_err(|_| OtpError::TimeError)
}

/// RFC 4226 dynamic truncation to a 31-bit integer
pub fn dynamic_truncate(digest: &[u8; DIGEST_LEN]) -> u32 {
    let offset = (digest[DIGEST_LEN - 1] & 0x0f) as usize;
    u32::from_be_bytes([
        digest[offset] & 0x7f,
        digest[offset + 1],
        digest[offset + 2],
        digest[offset + 3],
    ])
}

/// Generate the 6-digit code for `secret` at `unix_seconds`
///
/// Malformed secrets are decoded leniently and still yield a code; only a
/// zero step or a failing HMAC primitive is an error.
pub fn generate_code(
    secret: &OtpSecret,
    step_seconds: u64,
    unix_seconds: u64,
) -> Result<TotpToken, OtpError> {
    if step_seconds == 0 {
        return Err(OtpError::InvalidStep);
    }

    let key = secret.key_bytes();
    let counter = unix_seconds / step_seconds;
    let digest = sign_counter(&key, counter)?;
    let code = dynamic_truncate(&digest) % MODULUS;

    Ok(TotpToken::new(format!("{:0width$}", code, width = TOTP_DIGITS)))
}

/// Generate the code for the current system time
pub fn generate_code_now(secret: &OtpSecret, step_seconds: u64) -> Result<TotpToken, OtpError> {
    generate_code(secret, step_seconds, unix_now()?)
}

/// Seconds left in the current window, always within `1..=step_seconds`
pub fn time_remaining(step_seconds: u64, unix_seconds: u64) -> u64 {
    if step_seconds == 0 {
        return 0;
    }
    step_seconds - (unix_seconds % step_seconds)
}

/// Seconds left in the current window of the system clock
pub fn time_remaining_now(step_seconds: u64) -> Result<u64, OtpError> {
    Ok(time_remaining(step_seconds, unix_now()?))
}

/// Code and countdown for display, with the placeholder on failure
pub fn current_code(secret: &OtpSecret, step_seconds: u64, unix_seconds: u64) -> TotpCode {
    let code = match generate_code(secret, step_seconds, unix_seconds) {
        Ok(token) => token.expose().to_string(),
        Err(e) => {
            tracing::warn!("TOTP generation failed: {}", e);
            CODE_PLACEHOLDER.to_string()
        }
    };
    TotpCode {
        code,
        seconds_remaining: time_remaining(step_seconds, unix_seconds),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RFC_SECRET: &str = "GEZDGNBVGY3TQOJQGEZDGNBVGY3TQOJQ";

    fn code_at(secret: &str, t: u64) -> String {
        generate_code(&OtpSecret::from(secret), TOTP_STEP_SECONDS, t)
            .unwrap()
            .expose()
            .to_string()
    }

    #[test]
    fn test_rfc6238_sha1_vectors() {
        // RFC 6238 Appendix B, last six digits of the 8-digit values
        let vectors = [
            (59u64, "287082"),
            (1111111109, "081804"),
            (1111111111, "050471"),
            (1234567890, "005924"),
            (2000000000, "279037"),
            (20000000000, "353130"),
        ];
        for (t, expected) in vectors {
            assert_eq!(code_at(RFC_SECRET, t), expected, "T = {}", t);
        }
    }

    #[test]
    fn test_dynamic_truncate_rfc4226_example() {
        // RFC 4226 section 5.4
        let digest = [
            0x1f, 0x86, 0x98, 0x69, 0x0e, 0x02, 0xca, 0x16, 0x61, 0x85, 0x50, 0xef, 0x7f, 0x19,
            0xda, 0x8e, 0x94, 0x5b, 0x55, 0x5a,
        ];
        assert_eq!(dynamic_truncate(&digest), 0x50ef7f19);
        assert_eq!(dynamic_truncate(&digest) % MODULUS, 872921);
    }

    #[test]
    fn test_stable_within_window() {
        let first = code_at(RFC_SECRET, 1_700_000_010);
        for t in 1_700_000_010..1_700_000_040 {
            assert_eq!(code_at(RFC_SECRET, t), first);
        }
        assert_ne!(code_at(RFC_SECRET, 1_700_000_040), first);
    }

    #[test]
    fn test_malformed_secret_still_generates() {
        let code = code_at("not base32 at all!!", 59);
        assert_eq!(code.len(), 6);
        assert!(code.chars().all(|c| c.is_ascii_digit()));

        let empty = code_at("!!!", 59);
        assert_eq!(empty.len(), 6);
    }

    #[test]
    fn test_zero_step_rejected() {
        let err = generate_code(&OtpSecret::from(RFC_SECRET), 0, 59).unwrap_err();
        assert_eq!(err, OtpError::InvalidStep);
    }

    #[test]
    fn test_time_remaining_bounds() {
        assert_eq!(time_remaining(30, 0), 30);
        assert_eq!(time_remaining(30, 1), 29);
        assert_eq!(time_remaining(30, 29), 1);
        assert_eq!(time_remaining(30, 30), 30);
        for t in 1_700_000_000..1_700_000_100 {
            let r = time_remaining(30, t);
            assert!((1..=30).contains(&r));
        }
    }

    #[test]
    fn test_current_code_placeholder_on_error() {
        let code = current_code(&OtpSecret::from(RFC_SECRET), 0, 59);
        assert_eq!(code.code, CODE_PLACEHOLDER);
    }

    #[test]
    fn test_current_code_expiring() {
        let code = current_code(&OtpSecret::from(RFC_SECRET), 30, 55);
        assert_eq!(code.code, "287082");
        assert_eq!(code.seconds_remaining, 5);
        assert!(code.is_expiring());
    }
}
