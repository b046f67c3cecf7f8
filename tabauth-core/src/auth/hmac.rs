//! HMAC-SHA1 counter signing
//!
//! The HMAC primitive itself comes from the `hmac` and `sha1` crates. This
//! module owns the part TOTP cares about: encoding the time-step counter as
//! the 8-byte big-endian message from RFC 4226.

use crate::error::OtpError;
use hmac::{Hmac, Mac};
use sha1::Sha1;

type HmacSha1 = Hmac<Sha1>;

/// Length of an HMAC-SHA1 digest in bytes
pub const DIGEST_LEN: usize = 20;

/// Encode a time step as the HOTP counter message
///
/// The high 4 bytes stay zero and the time step, truncated to 32 bits, fills
/// the low 4 bytes. 32 bits of 30-second steps last until the year 6053.
pub fn counter_bytes(time_step: u64) -> [u8; 8] {
    let mut buf = [0u8; 8];
    buf[4..].copy_from_slice(&(time_step as u32).to_be_bytes());
    buf
}

/// Compute HMAC-SHA1 over `message`
///
/// Zero-length keys are accepted (RFC 2104 pads them to the block size).
pub fn hmac_sha1(key: &[u8], message: &[u8]) -> Result<[u8; DIGEST_LEN], OtpError> {
    let mut mac = HmacSha1::new_from_slice(key).map_err(|_| OtpError::HmacFailed)?;
    mac.update(message);
    let digest = mac.finalize().into_bytes();

    let mut result = [0u8; DIGEST_LEN];
    result.copy_from_slice(&digest);
    Ok(result)
}

/// Sign a TOTP time step with the decoded secret
pub fn sign_counter(key: &[u8], time_step: u64) -> Result<[u8; DIGEST_LEN], OtpError> {
    hmac_sha1(key, &counter_bytes(time_step))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counter_bytes_layout() {
        assert_eq!(counter_bytes(0), [0; 8]);
        assert_eq!(counter_bytes(1), [0, 0, 0, 0, 0, 0, 0, 1]);
        assert_eq!(
            counter_bytes(0x0123_4567),
            [0, 0, 0, 0, 0x01, 0x23, 0x45, 0x67]
        );
    }

    #[test]
    fn test_counter_bytes_truncates_to_32_bits() {
        assert_eq!(
            counter_bytes(0x1_0000_0002),
            [0, 0, 0, 0, 0, 0, 0, 2]
        );
    }

    #[test]
    fn test_hmac_sha1_rfc2202_test_case_1() {
        // key = 0x0b repeated 20 times, data = "Hi There"
        let key = [0x0b; 20];
        let result = hmac_sha1(&key, b"Hi There").unwrap();

        let expected = [
            0xb6, 0x17, 0x31, 0x86, 0x55, 0x05, 0x72, 0x64, 0xe2, 0x8b, 0xc0, 0xb6, 0xfb, 0x37,
            0x8c, 0x8e, 0xf1, 0x46, 0xbe, 0x00,
        ];
        assert_eq!(result, expected);
    }

    #[test]
    fn test_hmac_sha1_rfc2202_test_case_2() {
        let result = hmac_sha1(b"Jefe", b"what do ya want for nothing?").unwrap();

        let expected = [
            0xef, 0xfc, 0xdf, 0x6a, 0xe5, 0xeb, 0x2f, 0xa2, 0xd2, 0x74, 0x16, 0xd5, 0xf1, 0x84,
            0xdf, 0x9c, 0x25, 0x9a, 0x7c, 0x79,
        ];
        assert_eq!(result, expected);
    }

    #[test]
    fn test_hmac_sha1_empty_key() {
        // An all-invalid Base32 secret decodes to an empty key
        assert!(hmac_sha1(b"", &counter_bytes(1)).is_ok());
    }

    #[test]
    fn test_sign_counter_rfc4226_intermediate_values() {
        // RFC 4226 Appendix D
        let expected = [
            "cc93cf18508d94934c64b65d8ba7667fb7cde4b0",
            "75a48a19d4cbe100644e8ac1397eea747a2d33ab",
            "0bacb7fa082fef30782211938bc1c5e70416ff44",
        ];
        for (count, hex_digest) in expected.iter().enumerate() {
            let digest = sign_counter(b"12345678901234567890", count as u64).unwrap();
            assert_eq!(hex::encode(digest), *hex_digest, "count {}", count);
        }
    }
}
