//! QR payload extraction with fallback passes
//!
//! The matrix decoder sees, in order, stopping at the first hit:
//! 1. the region as-is
//! 2. the region with RGB inverted (light-on-dark codes)
//! 3. for regions over 1000px on a side, both again after shrinking the
//!    longest side to 800px (large noisy screenshots)

use image::RgbaImage;
use tracing::{debug, info};

use crate::qr::raster::{self, CropRect};

/// Regions with a side above this get the downscale passes
pub const DOWNSCALE_TRIGGER: u32 = 1000;

/// Longest side after downscaling
pub const DOWNSCALE_TARGET: u32 = 800;

/// Decodes a QR payload from a pixel buffer, or reports nothing found
pub trait QrMatrixDecoder {
    fn decode(&self, image: &RgbaImage) -> Option<String>;
}

/// Matrix decoder backed by `rqrr`
#[derive(Debug, Clone, Copy, Default)]
pub struct RqrrDecoder;

impl QrMatrixDecoder for RqrrDecoder {
    fn decode(&self, image: &RgbaImage) -> Option<String> {
        let mut prepared = rqrr::PreparedImage::prepare_from_greyscale(
            image.width() as usize,
            image.height() as usize,
            |x, y| luma(image.get_pixel(x as u32, y as u32).0),
        );

        for grid in prepared.detect_grids() {
            match grid.decode() {
                Ok((_meta, content)) => return Some(content),
                Err(e) => debug!("QR grid found but failed to decode: {:?}", e),
            }
        }
        None
    }
}

/// Greyscale from RGB, alpha ignored
fn luma([r, g, b, _]: [u8; 4]) -> u8 {
    ((77 * u32::from(r) + 150 * u32::from(g) + 29 * u32::from(b)) >> 8) as u8
}

/// Which fallback pass produced the payload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodePass {
    AsIs,
    Inverted,
    Downscaled,
    DownscaledInverted,
}

/// A successfully decoded payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodeOutcome {
    pub payload: String,
    pub pass: DecodePass,
}

/// Try the as-is then the inverted buffer
fn try_both<D>(decoder: &D, image: &RgbaImage, passes: [DecodePass; 2]) -> Option<DecodeOutcome>
where
    D: QrMatrixDecoder + ?Sized,
{
    if let Some(payload) = decoder.decode(image) {
        return Some(DecodeOutcome {
            payload,
            pass: passes[0],
        });
    }
    decoder.decode(&raster::invert(image)).map(|payload| DecodeOutcome {
        payload,
        pass: passes[1],
    })
}

/// Run the fallback chain over `image`, restricted to `crop` when it is usable
///
/// `None` means no QR pattern was found in any pass.
pub fn decode_region<D>(decoder: &D, image: &RgbaImage, crop: Option<CropRect>) -> Option<DecodeOutcome>
where
    D: QrMatrixDecoder + ?Sized,
{
    let region = raster::region(image, crop);
    let (width, height) = region.dimensions();

    let outcome = try_both(decoder, &region, [DecodePass::AsIs, DecodePass::Inverted])
        .or_else(|| {
            if width <= DOWNSCALE_TRIGGER && height <= DOWNSCALE_TRIGGER {
                return None;
            }
            debug!(
                "Retrying {}x{} region downscaled to {}px",
                width, height, DOWNSCALE_TARGET
            );
            let small = raster::downscale(&region, DOWNSCALE_TARGET);
            try_both(
                decoder,
                &small,
                [DecodePass::Downscaled, DecodePass::DownscaledInverted],
            )
        });

    match &outcome {
        Some(o) => info!("QR decoded on {:?} pass", o.pass),
        None => info!("No QR found in {}x{} region", width, height),
    }
    outcome
}
