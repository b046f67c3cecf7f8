//! Scan command implementation
//!
//! Imports an account from a QR code in an image file or a saved screen
//! capture, optionally restricted to a selected region.

use std::path::PathBuf;

use tabauth_core::error::TabAuthError;
use tabauth_core::pipeline::{AcquisitionPipeline, ImageSource};
use tabauth_core::qr::{DisplayRect, DisplaySize, RqrrDecoder};
use tracing::{info, warn};

use crate::cli::open_session;

/// Run the scan command
pub fn run_scan(
    image: PathBuf,
    crop: Option<DisplayRect>,
    display: Option<DisplaySize>,
    capture: bool,
) -> Result<(), TabAuthError> {
    let mut session = open_session()?;

    let source = if capture {
        ImageSource::ScreenCapture(std::fs::read_to_string(&image)?.trim().to_string())
    } else {
        ImageSource::File(image)
    };

    let mut pipeline = AcquisitionPipeline::headless();
    pipeline.load_image(source)?;

    let displayed = display.or_else(|| {
        pipeline.natural_size().map(|(width, height)| DisplaySize {
            width: f64::from(width),
            height: f64::from(height),
        })
    });
    if let (Some(rect), Some(displayed)) = (crop, displayed) {
        match pipeline.select_crop(rect, displayed)? {
            Some(region) if region.is_usable() => info!(
                "Scanning {}x{} region at ({}, {})",
                region.width, region.height, region.x, region.y
            ),
            Some(region) => warn!(
                "Selected region {}x{} is too small, scanning the whole image",
                region.width, region.height
            ),
            None => warn!("Selected region is outside the image, scanning the whole image"),
        }
    }

    let saved = pipeline.decode_and_save(&RqrrDecoder, &mut session.store, &session.config.user_id);
    pipeline.close();
    let entry = saved?;

    println!("✅ Added {} ({})", entry.issuer, entry.account_name);
    println!("   id: {}", entry.id);
    Ok(())
}

/// Parse `X,Y,W,H`
pub fn parse_crop(value: &str) -> Result<DisplayRect, String> {
    let parts = value
        .split(',')
        .map(|part| part.trim().parse::<f64>())
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| format!("invalid number in crop: {}", e))?;

    match parts.as_slice() {
        &[x, y, width, height] if width >= 0.0 && height >= 0.0 => Ok(DisplayRect {
            x,
            y,
            width,
            height,
        }),
        &[_, _, _, _] => Err("crop width and height cannot be negative".to_string()),
        _ => Err("crop must be X,Y,W,H".to_string()),
    }
}

/// Parse `WxH`
pub fn parse_display(value: &str) -> Result<DisplaySize, String> {
    let (width, height) = value
        .split_once(['x', 'X'])
        .ok_or_else(|| "display size must be WxH".to_string())?;
    let parse = |s: &str| {
        s.trim()
            .parse::<f64>()
            .map_err(|e| format!("invalid display size: {}", e))
    };
    let size = DisplaySize {
        width: parse(width)?,
        height: parse(height)?,
    };
    if size.width <= 0.0 || size.height <= 0.0 {
        return Err("display size must be positive".to_string());
    }
    Ok(size)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_crop() {
        assert_eq!(
            parse_crop("10, 20,300,200.5").unwrap(),
            DisplayRect {
                x: 10.0,
                y: 20.0,
                width: 300.0,
                height: 200.5
            }
        );
        assert!(parse_crop("1,2,3").is_err());
        assert!(parse_crop("1,2,-3,4").is_err());
        assert!(parse_crop("a,b,c,d").is_err());
    }

    #[test]
    fn test_parse_display() {
        let size = parse_display("800x600").unwrap();
        assert_eq!(size.width, 800.0);
        assert_eq!(size.height, 600.0);
        assert!(parse_display("800").is_err());
        assert!(parse_display("0x600").is_err());
    }
}
