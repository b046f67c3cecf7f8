//! Turning image sources into RGBA pixel buffers
//!
//! Covers reading the source (file, dropped bytes, screen-capture data URI),
//! SVG detection, crop mapping from displayed to source coordinates, and the
//! pixel transforms used by the decoder fallback passes.

use std::path::Path;

use data_encoding::BASE64;
use image::imageops::{self, FilterType};
use image::RgbaImage;
use tracing::debug;

use crate::error::RasterError;

/// A crop is only honored when both sides exceed this many source pixels
pub const MIN_CROP_SIDE: u32 = 10;

/// Media type browsers report for SVG files
pub const SVG_MEDIA_TYPE: &str = "image/svg+xml";

/// Rectangle in source image pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CropRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl CropRect {
    /// Whether the crop is large enough to be used instead of the full image
    pub fn is_usable(&self) -> bool {
        self.width > MIN_CROP_SIDE && self.height > MIN_CROP_SIDE
    }
}

/// Rectangle in displayed (on-screen) coordinates
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DisplayRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl DisplayRect {
    /// Rectangle spanned by a click-drag from `start` to `end`, in either direction
    pub fn from_drag(start: (f64, f64), end: (f64, f64)) -> Self {
        Self {
            x: start.0.min(end.0),
            y: start.1.min(end.1),
            width: (end.0 - start.0).abs(),
            height: (end.1 - start.1).abs(),
        }
    }
}

/// Size the image is displayed at
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DisplaySize {
    pub width: f64,
    pub height: f64,
}

/// Map a displayed selection to source pixels using the natural/displayed ratio
///
/// The result is rounded and clamped to the image bounds. Returns `None` when
/// the display size is degenerate or the selection falls outside the image.
pub fn map_display_crop(
    rect: DisplayRect,
    displayed: DisplaySize,
    natural: (u32, u32),
) -> Option<CropRect> {
    if displayed.width <= 0.0 || displayed.height <= 0.0 {
        return None;
    }
    let scale_x = f64::from(natural.0) / displayed.width;
    let scale_y = f64::from(natural.1) / displayed.height;

    let to_px = |v: f64, limit: u32| -> u32 { v.round().clamp(0.0, f64::from(limit)) as u32 };
    let x = to_px(rect.x * scale_x, natural.0);
    let y = to_px(rect.y * scale_y, natural.1);
    let right = to_px((rect.x + rect.width) * scale_x, natural.0);
    let bottom = to_px((rect.y + rect.height) * scale_y, natural.1);

    if right <= x || bottom <= y {
        return None;
    }
    Some(CropRect {
        x,
        y,
        width: right - x,
        height: bottom - y,
    })
}

/// Read raw bytes of an image file
///
/// Permission failures are reported as [`RasterError::Security`] since the
/// fix is to supply a readable local copy, not a clearer image.
pub fn read_image_file(path: &Path) -> Result<Vec<u8>, RasterError> {
    std::fs::read(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::PermissionDenied => RasterError::Security {
            reason: format!("cannot read {}", path.display()),
        },
        _ => RasterError::Decode {
            reason: format!("cannot read {}: {}", path.display(), e),
        },
    })
}

/// Split a base64 `data:` URI into its media type and payload
pub fn decode_data_uri(uri: &str) -> Result<(Option<String>, Vec<u8>), RasterError> {
    let invalid = |reason: &str| RasterError::InvalidDataUri {
        reason: reason.to_string(),
    };

    let rest = uri
        .trim()
        .strip_prefix("data:")
        .ok_or_else(|| invalid("missing data: prefix"))?;
    let (header, payload) = rest
        .split_once(',')
        .ok_or_else(|| invalid("missing ',' separator"))?;
    let media_type = header
        .strip_suffix(";base64")
        .ok_or_else(|| invalid("only base64 payloads are supported"))?;

    let bytes = BASE64
        .decode(payload.trim().as_bytes())
        .map_err(|e| RasterError::InvalidDataUri {
            reason: e.to_string(),
        })?;

    let media_type = (!media_type.is_empty()).then(|| media_type.to_ascii_lowercase());
    Ok((media_type, bytes))
}

/// Whether a source is SVG, judged by media type, file extension or content
pub fn is_svg(media_type: Option<&str>, path: Option<&Path>, bytes: &[u8]) -> bool {
    if media_type.is_some_and(|m| m.eq_ignore_ascii_case(SVG_MEDIA_TYPE)) {
        return true;
    }
    let svg_extension = path
        .and_then(|p| p.extension())
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("svg") || e.eq_ignore_ascii_case("svgz"));
    if svg_extension {
        return true;
    }

    let head = &bytes[..bytes.len().min(512)];
    let head = String::from_utf8_lossy(head);
    let head = head.trim_start_matches('\u{feff}').trim_start();
    head.starts_with("<svg") || (head.starts_with("<?xml") && head.contains("<svg"))
}

/// Decode image bytes into RGBA pixels
pub fn rasterize(bytes: &[u8]) -> Result<RgbaImage, RasterError> {
    let image = image::load_from_memory(bytes).map_err(|e| RasterError::Decode {
        reason: e.to_string(),
    })?;
    let rgba = image.to_rgba8();
    if rgba.width() == 0 || rgba.height() == 0 {
        return Err(RasterError::Empty);
    }
    debug!("Rasterized image {}x{}", rgba.width(), rgba.height());
    Ok(rgba)
}

/// The region to scan: the crop when usable, otherwise the full image
pub fn region(image: &RgbaImage, crop: Option<CropRect>) -> RgbaImage {
    match crop.filter(CropRect::is_usable) {
        Some(c) => {
            let x = c.x.min(image.width());
            let y = c.y.min(image.height());
            let width = c.width.min(image.width() - x);
            let height = c.height.min(image.height() - y);
            if width > MIN_CROP_SIDE && height > MIN_CROP_SIDE {
                imageops::crop_imm(image, x, y, width, height).to_image()
            } else {
                image.clone()
            }
        }
        None => image.clone(),
    }
}

/// Invert RGB channels, leaving alpha untouched
pub fn invert(image: &RgbaImage) -> RgbaImage {
    let mut out = image.clone();
    for pixel in out.pixels_mut() {
        for channel in &mut pixel.0[..3] {
            *channel = 255 - *channel;
        }
    }
    out
}

/// Shrink so the longest side is `max_side`, preserving aspect ratio
pub fn downscale(image: &RgbaImage, max_side: u32) -> RgbaImage {
    let longest = image.width().max(image.height());
    if longest <= max_side {
        return image.clone();
    }
    let scale = f64::from(max_side) / f64::from(longest);
    let width = ((f64::from(image.width()) * scale).round() as u32).max(1);
    let height = ((f64::from(image.height()) * scale).round() as u32).max(1);
    imageops::resize(image, width, height, FilterType::Triangle)
}
