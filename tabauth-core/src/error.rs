//! Error types for the tabauth authenticator
//!
//! This module defines all error types used throughout the application,
//! providing consistent error handling and user-friendly error messages.

use thiserror::Error;

/// Main error type for the tabauth application
#[derive(Error, Debug)]
pub enum TabAuthError {
    /// Errors related to configuration loading/parsing
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Errors related to OTP/TOTP operations
    #[error("OTP error: {0}")]
    Otp(#[from] OtpError),

    /// Errors related to otpauth URI parsing
    #[error("otpauth error: {0}")]
    OtpAuth(#[from] OtpAuthError),

    /// Errors while turning an image source into pixels
    #[error("Image error: {0}")]
    Raster(#[from] RasterError),

    /// Errors reported by the entry store
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Errors from the QR acquisition pipeline
    #[error("Scan error: {0}")]
    Pipeline(#[from] PipelineError),

    /// Generic I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// TOML parsing errors
    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    /// TOML serialization errors
    #[error("TOML serialization error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),
}

/// Configuration-related errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to load configuration file: {path}")]
    LoadFailed { path: String },

    #[error("Missing required configuration field: {field}")]
    MissingField { field: String },

    #[error("Configuration validation error: {message}")]
    ValidationError { message: String },

    #[error("I/O error: {message}")]
    IoError { message: String },
}

/// OTP/TOTP operation errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum OtpError {
    #[error("Invalid Base32 character '{character}' at position {position}")]
    InvalidBase32Char { character: char, position: usize },

    #[error("Invalid Base32 length: {length} symbols")]
    InvalidBase32Length { length: usize },

    #[error("Secret contains no Base32 data")]
    EmptySecret,

    #[error("HMAC-SHA1 computation failed")]
    HmacFailed,

    #[error("Time step must be greater than zero")]
    InvalidStep,

    #[error("System time error")]
    TimeError,
}

/// otpauth URI parsing errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum OtpAuthError {
    #[error("Invalid otpauth payload")]
    InvalidPayload,

    #[error("No secret in QR")]
    MissingSecret,

    #[error("Malformed otpauth URI: {reason}")]
    Malformed { reason: String },
}

/// Image acquisition and rasterization errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RasterError {
    /// The source could not be read back as pixels because access was denied
    #[error("Image access denied: {reason}. Load a local copy of the image instead")]
    Security { reason: String },

    #[error("SVG images cannot be scanned for QR codes")]
    Unsupported,

    #[error("Could not decode image: {reason}")]
    Decode { reason: String },

    #[error("Invalid screen capture data: {reason}")]
    InvalidDataUri { reason: String },

    #[error("Image has no pixels")]
    Empty,
}

/// Entry store errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("Please enter a secret")]
    MissingSecret,

    #[error("Entry not found: {id}")]
    NotFound { id: String },

    #[error("Reorder list does not match stored entries")]
    ReorderMismatch,

    #[error("Failed to read entries: {message}")]
    ReadFailed { message: String },

    #[error("Failed to write entries: {message}")]
    WriteFailed { message: String },
}

/// Acquisition pipeline errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PipelineError {
    #[error("No image loaded")]
    NoImage,

    #[error("Selected file is not an image")]
    NotAnImage,

    #[error("A decode is already in progress")]
    Busy,

    #[error("SVG images are not supported for scanning")]
    UnsupportedFormat,

    #[error("QR code not found. Try selecting the code region or a clearer image")]
    QrNotFound,

    #[error(transparent)]
    Raster(#[from] RasterError),

    #[error(transparent)]
    OtpAuth(#[from] OtpAuthError),

    #[error("Failed to save account: {0}")]
    SaveFailed(StoreError),
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, TabAuthError>;
