//! QR code scanning
//!
//! Rasterizes image sources and runs the matrix decoder over them.

pub mod decoder;
pub mod raster;

pub use decoder::{decode_region, DecodeOutcome, DecodePass, QrMatrixDecoder, RqrrDecoder};
pub use raster::{CropRect, DisplayRect, DisplaySize};
