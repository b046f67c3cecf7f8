//! Base32 secret decoding (RFC 4648 alphabet, padding optional)
//!
//! Authenticator apps hand out secrets in every shape: lowercase, grouped in
//! blocks of four, with or without `=` padding. Decoding follows these rules:
//! 1. Remove all whitespace characters
//! 2. Fold to uppercase
//! 3. Decode with the RFC 4648 alphabet, ignoring non-zero trailing bits
//!
//! [`decode_base32`] skips characters outside the alphabet. [`decode_base32_strict`]
//! reports them instead and is meant for validating user input.

use data_encoding::{DecodeError, DecodeKind, Encoding, BASE32_NOPAD};
use tracing::warn;

use crate::error::OtpError;

/// Stand-in for non-ASCII characters so byte positions match char positions
const FOREIGN_SYMBOL: u8 = b'?';

/// Unpadded RFC 4648 Base32 that tolerates non-zero trailing bits
fn secret_encoding() -> Encoding {
    let mut spec = BASE32_NOPAD.specification();
    spec.check_trailing_bits = false;
    spec.encoding().unwrap_or_else(|_| BASE32_NOPAD.clone())
}

/// Remove whitespace and fold case
fn clean(input: &str) -> String {
    input
        .chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_uppercase)
        .collect()
}

fn is_symbol(c: char) -> bool {
    c.is_ascii_uppercase() || ('2'..='7').contains(&c)
}

/// Cut a symbol count down to the nearest length RFC 4648 can decode
///
/// Counts of 1, 3 or 6 modulo 8 leave fewer than 8 bits in the last group.
fn decodable_len(len: usize) -> usize {
    match len % 8 {
        1 | 3 | 6 => len - 1,
        _ => len,
    }
}

/// Decode a Base32 secret, silently skipping characters outside the alphabet
///
/// Never fails. A string without a single valid character decodes to an
/// empty key, which the HMAC signer accepts.
pub fn decode_base32(input: &str) -> Vec<u8> {
    let mut symbols: Vec<u8> = clean(input)
        .chars()
        .filter(|&c| is_symbol(c))
        .map(|c| c as u8)
        .collect();
    symbols.truncate(decodable_len(symbols.len()));

    match secret_encoding().decode(&symbols) {
        Ok(bytes) => bytes,
        Err(e) => {
            warn!("Lenient Base32 decode failed: {}", e);
            Vec::new()
        }
    }
}

/// Report a bad character before a bad length, then decode
fn decode_symbols(symbols: &[u8]) -> Result<Vec<u8>, DecodeError> {
    let encoding = secret_encoding();
    let mut completed = symbols.to_vec();
    completed.resize(symbols.len().div_ceil(8) * 8, b'A');
    encoding.decode(&completed)?;
    encoding.decode(symbols)
}

/// Decode a Base32 secret, rejecting anything but alphabet characters,
/// whitespace and trailing `=` padding
///
/// The secret must also have a valid RFC 4648 length and decode to at least
/// one byte. `position` in the error counts characters of the original input.
pub fn decode_base32_strict(input: &str) -> Result<Vec<u8>, OtpError> {
    let trimmed = input.trim_end_matches(|c: char| c == '=' || c.is_whitespace());

    let origin: Vec<(usize, char)> = trimmed
        .chars()
        .enumerate()
        .filter(|(_, c)| !c.is_whitespace())
        .collect();
    let symbols: Vec<u8> = origin
        .iter()
        .map(|&(_, c)| {
            if c.is_ascii() {
                c.to_ascii_uppercase() as u8
            } else {
                FOREIGN_SYMBOL
            }
        })
        .collect();

    let bytes = decode_symbols(&symbols).map_err(|e| match e.kind {
        DecodeKind::Symbol => match origin.get(e.position) {
            Some(&(position, character)) => OtpError::InvalidBase32Char { character, position },
            None => OtpError::InvalidBase32Length {
                length: symbols.len(),
            },
        },
        _ => OtpError::InvalidBase32Length {
            length: symbols.len(),
        },
    })?;

    if bytes.is_empty() {
        return Err(OtpError::EmptySecret);
    }
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_removes_whitespace() {
        assert_eq!(clean("JBSW Y3DP\tEHPK\n3PXP"), "JBSWY3DPEHPK3PXP");
    }

    #[test]
    fn test_clean_uppercases() {
        assert_eq!(clean("jbsw y3dp"), "JBSWY3DP");
    }

    #[test]
    fn test_decode_hello() {
        assert_eq!(decode_base32("JBSWY3DPEE"), b"Hello!");
    }

    #[test]
    fn test_decode_rfc6238_secret() {
        assert_eq!(
            decode_base32("GEZDGNBVGY3TQOJQGEZDGNBVGY3TQOJQ"),
            b"12345678901234567890"
        );
    }

    #[test]
    fn test_decode_lowercase_and_spaces() {
        let upper = decode_base32("JBSWY3DPEHPK3PXP");
        assert_eq!(decode_base32("jbsw y3dp ehpk 3pxp"), upper);
        assert_eq!(decode_base32("JbSwY3DpEhPk3PxP"), upper);
        assert_eq!(upper.len(), 10);
    }

    #[test]
    fn test_decode_skips_invalid_characters() {
        // '1', '8', '-' and '=' are outside the alphabet
        assert_eq!(decode_base32("JBSW-Y3DP-EE=="), b"Hello!");
        assert_eq!(decode_base32("JB1SWY38DPEE"), b"Hello!");
    }

    #[test]
    fn test_decode_discards_partial_group() {
        // 3 symbols = 15 bits -> one byte, 7 bits dropped
        assert_eq!(decode_base32("MZX").len(), 1);
        assert_eq!(decode_base32("M").len(), 0);
    }

    #[test]
    fn test_decode_no_valid_characters() {
        assert!(decode_base32("!!!@@@").is_empty());
        assert!(decode_base32("").is_empty());
    }

    #[test]
    fn test_strict_accepts_padding_and_spaces() {
        assert_eq!(decode_base32_strict("jbsw y3dp ee======").unwrap(), b"Hello!");
    }

    #[test]
    fn test_strict_reports_position() {
        let err = decode_base32_strict("JBSW!Y3DP").unwrap_err();
        assert_eq!(
            err,
            OtpError::InvalidBase32Char {
                character: '!',
                position: 4
            }
        );
    }

    #[test]
    fn test_strict_rejects_digits_outside_alphabet() {
        assert!(matches!(
            decode_base32_strict("ABC1"),
            Err(OtpError::InvalidBase32Char { character: '1', .. })
        ));
    }

    #[test]
    fn test_strict_rejects_empty() {
        assert_eq!(decode_base32_strict("  ==").unwrap_err(), OtpError::EmptySecret);
    }

    #[test]
    fn test_strict_rejects_short_or_misaligned_length() {
        // 5 bits cannot hold a byte; 3 symbols is no RFC 4648 length
        assert_eq!(
            decode_base32_strict("A").unwrap_err(),
            OtpError::InvalidBase32Length { length: 1 }
        );
        assert_eq!(
            decode_base32_strict("abc==").unwrap_err(),
            OtpError::InvalidBase32Length { length: 3 }
        );
        assert_eq!(decode_base32_strict("ME").unwrap(), b"a");
    }

    #[test]
    fn test_strict_character_error_wins_over_length() {
        assert_eq!(
            decode_base32_strict("JBSW0Y3DP").unwrap_err(),
            OtpError::InvalidBase32Char {
                character: '0',
                position: 4
            }
        );
        assert!(matches!(
            decode_base32_strict("JBSWé"),
            Err(OtpError::InvalidBase32Char { character: 'é', position: 4 })
        ));
    }

    #[test]
    fn test_decodable_len() {
        assert_eq!(decodable_len(1), 0);
        assert_eq!(decodable_len(3), 2);
        assert_eq!(decodable_len(6), 5);
        assert_eq!(decodable_len(7), 7);
        assert_eq!(decodable_len(16), 16);
    }

    #[test]
    fn test_lenient_ignores_trailing_bits() {
        // 'F' leaves a non-zero bit after the last full byte
        assert_eq!(decode_base32("JBSWY3DPEF"), b"Hello!");
    }
}
