//! `otpauth://` URI parsing
//!
//! Key URI format as emitted by authenticator QR codes:
//! `otpauth://totp/Issuer:account?secret=BASE32&issuer=Issuer`

use tracing::{debug, warn};
use url::Url;

use crate::auth::totp::{TOTP_DIGITS, TOTP_STEP_SECONDS};
use crate::error::OtpAuthError;
use crate::types::{OtpSecret, ParsedOtpAuth, DEFAULT_ACCOUNT_NAME, DEFAULT_ISSUER};

const SCHEME_PREFIX: &str = "otpauth://";

/// Neutral base substituted for the scheme so the rest parses as a URL
const PARSE_BASE: &str = "https://x/";

/// Parse an otpauth payload into issuer, account name and secret
pub fn parse_otpauth(payload: &str) -> Result<ParsedOtpAuth, OtpAuthError> {
    let payload = payload.trim();
    if !payload.starts_with(SCHEME_PREFIX) {
        return Err(OtpAuthError::InvalidPayload);
    }

    let rewritten = format!("{}{}", PARSE_BASE, &payload[SCHEME_PREFIX.len()..]);
    let url = Url::parse(&rewritten).map_err(|e| OtpAuthError::Malformed {
        reason: e.to_string(),
    })?;

    let mut secret = None;
    let mut issuer_param = None;
    for (key, value) in url.query_pairs() {
        match key.to_ascii_lowercase().as_str() {
            "secret" if !value.trim().is_empty() => secret = Some(value.into_owned()),
            "issuer" if !value.trim().is_empty() => issuer_param = Some(value.into_owned()),
            "algorithm" if !value.eq_ignore_ascii_case("sha1") => {
                warn!("QR requests algorithm {}, codes are generated with SHA1", value);
            }
            "digits" if value.parse::<usize>().ok() != Some(TOTP_DIGITS) => {
                warn!("QR requests {} digits, codes have {}", value, TOTP_DIGITS);
            }
            "period" if value.parse::<u64>().ok() != Some(TOTP_STEP_SECONDS) => {
                warn!(
                    "QR requests a {}s period, codes use {}s",
                    value, TOTP_STEP_SECONDS
                );
            }
            _ => {}
        }
    }

    let secret = secret.ok_or(OtpAuthError::MissingSecret)?;
    let label = decode_label(url.path())?;

    let (label_issuer, account) = match label.split_once(':') {
        Some((issuer, account)) => (issuer, account.trim()),
        None => (label.as_str(), label.as_str()),
    };
    let issuer = issuer_param.as_deref().unwrap_or(label_issuer);

    let parsed = ParsedOtpAuth {
        issuer: non_empty_or(issuer, DEFAULT_ISSUER),
        account_name: non_empty_or(account, DEFAULT_ACCOUNT_NAME),
        secret: OtpSecret::new(secret),
    };
    debug!(
        "Parsed otpauth URI for issuer={} account={}",
        parsed.issuer, parsed.account_name
    );
    Ok(parsed)
}

/// Strip the `/totp/` (or bare `/`) prefix from the path and percent-decode it
fn decode_label(path: &str) -> Result<String, OtpAuthError> {
    let stripped = if path.len() >= 5 && path[..5].eq_ignore_ascii_case("/totp") {
        let rest = &path[5..];
        rest.strip_prefix('/').unwrap_or(rest)
    } else {
        path.strip_prefix('/').unwrap_or(path)
    };

    urlencoding::decode(stripped)
        .map(|label| label.into_owned())
        .map_err(|e| OtpAuthError::Malformed {
            reason: format!("label is not valid UTF-8: {}", e),
        })
}

fn non_empty_or(value: &str, default: &str) -> String {
    if value.is_empty() {
        default.to_string()
    } else {
        value.to_string()
    }
}
