//! QR acquisition pipeline
//!
//! Drives one "add account from image" attempt:
//!
//! ```text
//! Idle -> ImageLoaded -> (CropSelected) -> Decoding -> Idle          (saved)
//!                                                  \-> ImageLoaded  (failed, retry)
//! ```
//!
//! The loaded image stays in place after a failed decode so the user can
//! re-crop and retry without loading it again. Preview resources published
//! for the loaded image are released exactly once, whichever of replacement,
//! reset or successful save comes first.

use std::cell::Cell;
use std::fmt;
use std::path::PathBuf;
use std::rc::Rc;

use image::RgbaImage;
use tracing::{debug, info, warn};

use crate::error::PipelineError;
use crate::otpauth::parse_otpauth;
use crate::qr::decoder::{decode_region, QrMatrixDecoder};
use crate::qr::raster::{self, CropRect, DisplayRect, DisplaySize};
use crate::store::EntryStore;
use crate::types::{AuthenticatorEntry, ParsedOtpAuth};

/// Where an image came from
#[derive(Debug, Clone)]
pub enum ImageSource {
    /// Picked from disk
    File(PathBuf),
    /// Dropped onto the window, with the media type the host reported
    Dropped {
        bytes: Vec<u8>,
        media_type: Option<String>,
    },
    /// `data:` URI of a captured viewport
    ScreenCapture(String),
}

/// Publishes image previews and takes them back
///
/// Implemented by whatever renders the preview (object URLs in a browser
/// host, temp files, or nothing at all for a headless run).
pub trait PreviewHost {
    fn publish(&self, bytes: &[u8], media_type: Option<&str>) -> String;
    fn revoke(&self, handle: &str);
}

/// Host that renders nothing
#[derive(Debug, Default)]
pub struct NullPreviewHost {
    next: Cell<u64>,
}

impl PreviewHost for NullPreviewHost {
    fn publish(&self, _bytes: &[u8], _media_type: Option<&str>) -> String {
        let id = self.next.get();
        self.next.set(id + 1);
        format!("preview:{}", id)
    }

    fn revoke(&self, _handle: &str) {}
}

/// A published preview, revoked when dropped
pub struct PreviewGuard {
    host: Rc<dyn PreviewHost>,
    handle: String,
}

impl PreviewGuard {
    fn publish(host: &Rc<dyn PreviewHost>, bytes: &[u8], media_type: Option<&str>) -> Self {
        let handle = host.publish(bytes, media_type);
        Self {
            host: Rc::clone(host),
            handle,
        }
    }

    pub fn handle(&self) -> &str {
        &self.handle
    }
}

impl Drop for PreviewGuard {
    fn drop(&mut self) {
        debug!("Revoking preview {}", self.handle);
        self.host.revoke(&self.handle);
    }
}

impl fmt::Debug for PreviewGuard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PreviewGuard")
            .field("handle", &self.handle)
            .finish()
    }
}

/// Observable pipeline state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Idle,
    ImageLoaded,
    CropSelected(CropRect),
    Decoding,
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PipelineState::Idle => write!(f, "idle"),
            PipelineState::ImageLoaded => write!(f, "image loaded"),
            PipelineState::CropSelected(c) => {
                write!(f, "crop {}x{} at ({}, {})", c.width, c.height, c.x, c.y)
            }
            PipelineState::Decoding => write!(f, "decoding"),
        }
    }
}

#[derive(Debug)]
struct LoadedImage {
    preview: PreviewGuard,
    /// `None` for SVG sources, which are never rasterized
    pixels: Option<Rc<RgbaImage>>,
}

/// Work captured by [`AcquisitionPipeline::begin_decode`]
#[derive(Debug, Clone)]
pub struct DecodeJob {
    pixels: Rc<RgbaImage>,
    crop: Option<CropRect>,
}

impl DecodeJob {
    /// Decode the QR payload and parse it as an otpauth URI
    pub fn run<D>(&self, decoder: &D) -> Result<ParsedOtpAuth, PipelineError>
    where
        D: QrMatrixDecoder + ?Sized,
    {
        let outcome =
            decode_region(decoder, &self.pixels, self.crop).ok_or(PipelineError::QrNotFound)?;
        Ok(parse_otpauth(&outcome.payload)?)
    }
}

/// State machine for one image-to-entry acquisition
pub struct AcquisitionPipeline {
    host: Rc<dyn PreviewHost>,
    image: Option<LoadedImage>,
    crop: Option<CropRect>,
    decoding: bool,
    last_error: Option<PipelineError>,
}

impl AcquisitionPipeline {
    pub fn new(host: Rc<dyn PreviewHost>) -> Self {
        Self {
            host,
            image: None,
            crop: None,
            decoding: false,
            last_error: None,
        }
    }

    /// Pipeline without preview rendering
    pub fn headless() -> Self {
        Self::new(Rc::new(NullPreviewHost::default()))
    }

    pub fn state(&self) -> PipelineState {
        if self.decoding {
            return PipelineState::Decoding;
        }
        match (&self.image, self.crop) {
            (None, _) => PipelineState::Idle,
            (Some(_), Some(crop)) => PipelineState::CropSelected(crop),
            (Some(_), None) => PipelineState::ImageLoaded,
        }
    }

    /// Error of the last failed step, cleared by a new image or reset
    pub fn last_error(&self) -> Option<&PipelineError> {
        self.last_error.as_ref()
    }

    /// Natural pixel size of the loaded image (unknown for SVG)
    pub fn natural_size(&self) -> Option<(u32, u32)> {
        self.image
            .as_ref()
            .and_then(|img| img.pixels.as_ref())
            .map(|p| p.dimensions())
    }

    /// Handle of the current preview
    pub fn preview(&self) -> Option<&str> {
        self.image.as_ref().map(|img| img.preview.handle())
    }

    fn fail<T>(&mut self, error: PipelineError) -> Result<T, PipelineError> {
        warn!("Acquisition step failed: {}", error);
        self.last_error = Some(error.clone());
        Err(error)
    }

    /// Load an image, replacing (and releasing) any previous one
    ///
    /// On failure the previous image, if any, stays loaded.
    pub fn load_image(&mut self, source: ImageSource) -> Result<(), PipelineError> {
        if self.decoding {
            return Err(PipelineError::Busy);
        }

        let read = match source {
            ImageSource::File(path) => {
                raster::read_image_file(&path).map(|bytes| (bytes, None, Some(path)))
            }
            ImageSource::Dropped { bytes, media_type } => {
                if media_type
                    .as_deref()
                    .is_some_and(|m| !m.to_ascii_lowercase().starts_with("image/"))
                {
                    return self.fail(PipelineError::NotAnImage);
                }
                Ok((bytes, media_type, None))
            }
            ImageSource::ScreenCapture(uri) => {
                raster::decode_data_uri(&uri).map(|(media_type, bytes)| (bytes, media_type, None))
            }
        };
        let (bytes, media_type, path) = match read {
            Ok(parts) => parts,
            Err(e) => return self.fail(e.into()),
        };

        let pixels = if raster::is_svg(media_type.as_deref(), path.as_deref(), &bytes) {
            debug!("Loaded SVG source, scanning will be refused");
            None
        } else {
            match raster::rasterize(&bytes) {
                Ok(pixels) => Some(Rc::new(pixels)),
                Err(e) => return self.fail(e.into()),
            }
        };

        let preview = PreviewGuard::publish(&self.host, &bytes, media_type.as_deref());
        // Dropping the old image revokes its preview
        self.image = Some(LoadedImage { preview, pixels });
        self.crop = None;
        self.last_error = None;

        match self.natural_size() {
            Some((w, h)) => info!("Image loaded ({}x{})", w, h),
            None => info!("Image loaded"),
        }
        Ok(())
    }

    /// Select the region to scan from a click-drag on the displayed image
    ///
    /// Returns the crop in source pixels, or `None` if the selection does not
    /// map onto the image (which clears any previous crop).
    pub fn select_crop(
        &mut self,
        rect: DisplayRect,
        displayed: DisplaySize,
    ) -> Result<Option<CropRect>, PipelineError> {
        if self.decoding {
            return Err(PipelineError::Busy);
        }
        if self.image.is_none() {
            return Err(PipelineError::NoImage);
        }
        let crop = self
            .natural_size()
            .and_then(|natural| raster::map_display_crop(rect, displayed, natural));
        debug!("Crop selected: {:?}", crop);
        self.crop = crop;
        Ok(crop)
    }

    pub fn clear_crop(&mut self) {
        if !self.decoding {
            self.crop = None;
        }
    }

    /// Enter `Decoding`, refusing re-entry and SVG sources
    pub fn begin_decode(&mut self) -> Result<DecodeJob, PipelineError> {
        if self.decoding {
            return Err(PipelineError::Busy);
        }
        let pixels = match self.image.as_ref().map(|img| img.pixels.clone()) {
            None => return self.fail(PipelineError::NoImage),
            Some(None) => return self.fail(PipelineError::UnsupportedFormat),
            Some(Some(pixels)) => pixels,
        };

        self.decoding = true;
        self.last_error = None;
        Ok(DecodeJob {
            pixels,
            crop: self.crop,
        })
    }

    /// Leave `Decoding` with the outcome of a job
    ///
    /// Success discards all transient state; failure keeps the image for a retry.
    pub fn finish_decode(
        &mut self,
        result: Result<AuthenticatorEntry, PipelineError>,
    ) -> Result<AuthenticatorEntry, PipelineError> {
        self.decoding = false;
        match result {
            Ok(entry) => {
                info!("Saved {} from QR", entry.issuer);
                self.reset();
                Ok(entry)
            }
            Err(e) => self.fail(e),
        }
    }

    /// Decode the loaded image and persist the account it carries
    pub fn decode_and_save<D, S>(
        &mut self,
        decoder: &D,
        store: &mut S,
        user_id: &str,
    ) -> Result<AuthenticatorEntry, PipelineError>
    where
        D: QrMatrixDecoder + ?Sized,
        S: EntryStore + ?Sized,
    {
        let job = self.begin_decode()?;
        let result = job.run(decoder).and_then(|parsed| {
            store
                .create(user_id, parsed.into())
                .map_err(PipelineError::SaveFailed)
        });
        self.finish_decode(result)
    }

    /// Drop the image, crop and error, releasing the preview
    pub fn reset(&mut self) {
        self.image = None;
        self.crop = None;
        self.decoding = false;
        self.last_error = None;
    }

    /// Close the add-account flow
    pub fn close(&mut self) {
        debug!("Closing acquisition pipeline in state {}", self.state());
        self.reset();
    }
}
