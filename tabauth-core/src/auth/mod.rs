//! Authentication module
//!
//! Base32 secret decoding, HMAC counter signing, TOTP generation and the
//! refresh ticker that drives code displays.

pub mod base32;
pub mod hmac;
pub mod ticker;
pub mod totp;
