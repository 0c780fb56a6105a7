//! Top-level pipeline: photo in, composited pop-out grid out.

use std::path::{Path, PathBuf};

use image::{DynamicImage, ImageFormat, RgbaImage};

use crate::compose::{self, CompositionState, GridOptions};
use crate::cutout::{extract_cutout, trim};
use crate::error::{Error, Result};
use crate::mask::{SegmentationQuality, Segmenter};
use crate::orient::Orientation;
use crate::sticker::StickerStyle;

/// Options controlling the full pipeline.
#[derive(Debug, Clone, Default)]
pub struct EngineOptions {
    /// Segmentation quality knob passed to the collaborator.
    pub quality: SegmentationQuality,
    /// Stroke and shadow treatment.
    pub style: StickerStyle,
    /// Background grid geometry.
    pub grid: GridOptions,
    /// Orientation tag of incoming subject photos.
    pub orientation: Orientation,
    /// Fixed placement; `None` picks an adaptive initial placement from
    /// the cutout's aspect ratio.
    pub placement: Option<CompositionState>,
}

/// A trimmed person cutout in upright pixel space, remembering the source
/// photo's orientation tag.
#[derive(Debug, Clone)]
pub struct PersonCutout {
    /// The cutout raster, upright.
    pub image: RgbaImage,
    /// Orientation of the source photo, re-applied by
    /// [`PersonCutout::oriented`].
    pub source_orientation: Orientation,
}

impl PersonCutout {
    /// Width over height of the upright cutout.
    #[must_use]
    pub fn aspect_ratio(&self) -> f64 {
        f64::from(self.image.width()) / f64::from(self.image.height())
    }

    /// The cutout transformed back into the source photo's orientation.
    #[must_use]
    pub fn oriented(&self) -> RgbaImage {
        self.source_orientation.from_upright(&self.image)
    }
}

/// Result of processing a single subject photo into a composite file.
#[derive(Debug)]
pub struct ProcessResult {
    /// Path of the subject photo.
    pub path: PathBuf,
    /// Whether processing succeeded.
    pub success: bool,
    /// Human-readable status message.
    pub message: String,
}

/// The pipeline engine, holding the segmentation collaborator and shared
/// options.
///
/// Create once and reuse for multiple photos. Segmentation requests are
/// single-attempt and never retried; when a caller races several requests,
/// the latest completed result for the latest requested photo wins and
/// superseded results must be discarded, not applied.
pub struct PopoutEngine {
    segmenter: Box<dyn Segmenter + Send + Sync>,
    options: EngineOptions,
}

impl PopoutEngine {
    /// Create an engine with default options.
    #[must_use]
    pub fn new(segmenter: Box<dyn Segmenter + Send + Sync>) -> Self {
        Self {
            segmenter,
            options: EngineOptions::default(),
        }
    }

    /// Create an engine with explicit options.
    #[must_use]
    pub fn with_options(
        segmenter: Box<dyn Segmenter + Send + Sync>,
        options: EngineOptions,
    ) -> Self {
        Self { segmenter, options }
    }

    /// The engine's options.
    #[must_use]
    pub fn options(&self) -> &EngineOptions {
        &self.options
    }

    /// Segment, extract, and trim the person cutout from a subject photo.
    ///
    /// The photo is normalized to upright pixel space before segmentation;
    /// the returned cutout carries the original orientation tag.
    ///
    /// # Errors
    ///
    /// Propagates the segmenter's failure ([`Error::InvalidImage`] or
    /// [`Error::NoSegmentationResult`]) and matte-extraction failures.
    pub fn cutout(&self, photo: &RgbaImage, orientation: Orientation) -> Result<PersonCutout> {
        let upright = orientation.to_upright(photo);
        let mask = self.segmenter.segment(&upright, self.options.quality)?;
        let raw = extract_cutout(&upright, &mask)?;
        Ok(PersonCutout {
            image: trim(&raw),
            source_orientation: orientation,
        })
    }

    /// Composite a cutout over a background raster at the given placement.
    ///
    /// # Errors
    ///
    /// Returns [`Error::RenderFailed`] on degenerate inputs.
    pub fn compose(
        &self,
        background: &RgbaImage,
        cutout: &PersonCutout,
        placement: &CompositionState,
    ) -> Result<RgbaImage> {
        compose::render(background, &cutout.image, placement, &self.options.style)
    }

    /// Process one subject photo end to end: load, segment, build the
    /// grid from `grid_photos`, composite, save to `output`.
    ///
    /// Returns a [`ProcessResult`] instead of an error so batch callers
    /// get a per-file report; failure reasons are carried in the message.
    #[must_use]
    pub fn process_file(
        &self,
        subject: &Path,
        grid_photos: &[PathBuf],
        output: &Path,
    ) -> ProcessResult {
        let mut result = ProcessResult {
            path: subject.to_path_buf(),
            success: false,
            message: String::new(),
        };

        let photo = match image::open(subject) {
            Ok(img) => img.to_rgba8(),
            Err(err) => {
                result.message = format!("failed to load: {err}");
                return result;
            }
        };

        let cutout = match self.cutout(&photo, self.options.orientation) {
            Ok(cutout) => cutout,
            Err(err) => {
                result.message = format!("processing failed: {err}");
                return result;
            }
        };

        let mut photos = Vec::with_capacity(grid_photos.len());
        for path in grid_photos {
            match image::open(path) {
                Ok(img) => photos.push(img.to_rgba8()),
                Err(err) => {
                    result.message = format!("failed to load {}: {err}", path.display());
                    return result;
                }
            }
        }

        let background = match compose::build_grid(&photos, &self.options.grid) {
            Ok(grid) => grid,
            Err(err) => {
                result.message = format!("processing failed: {err}");
                return result;
            }
        };

        let placement = self
            .options
            .placement
            .unwrap_or_else(|| CompositionState::adaptive(cutout.aspect_ratio()));

        let composite = match self.compose(&background, &cutout, &placement) {
            Ok(img) => img,
            Err(err) => {
                result.message = format!("processing failed: {err}");
                return result;
            }
        };

        if let Some(parent) = output.parent() {
            if !parent.exists() {
                if let Err(err) = std::fs::create_dir_all(parent) {
                    result.message = format!("failed to create output directory: {err}");
                    return result;
                }
            }
        }

        match save_image(&composite, output) {
            Ok(()) => {
                result.success = true;
                result.message = "composite saved".to_string();
            }
            Err(err) => {
                result.message = format!("failed to save: {err}");
            }
        }

        result
    }
}

/// Check if a file has a supported image extension.
#[must_use]
pub fn is_supported_image(path: &Path) -> bool {
    match path.extension().and_then(|e| e.to_str()) {
        Some(ext) => matches!(
            ext.to_lowercase().as_str(),
            "jpg" | "jpeg" | "png" | "webp" | "bmp"
        ),
        None => false,
    }
}

/// Save an RGBA image with format-specific encoder settings.
///
/// JPEG output flattens alpha (maximum quality); PNG, WebP, and BMP keep
/// the alpha channel.
///
/// # Errors
///
/// Returns an error if the format is unsupported or writing fails.
pub fn save_image(img: &RgbaImage, path: &Path) -> Result<()> {
    let format =
        ImageFormat::from_path(path).map_err(|e| Error::UnsupportedFormat(e.to_string()))?;

    match format {
        ImageFormat::Jpeg => {
            let flattened = DynamicImage::ImageRgba8(img.clone()).to_rgb8();
            let file = std::fs::File::create(path)?;
            let mut encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(file, 100);
            encoder.encode_image(&DynamicImage::ImageRgb8(flattened))?;
        }
        ImageFormat::Png | ImageFormat::WebP | ImageFormat::Bmp => {
            img.save(path)?;
        }
        _ => {
            return Err(Error::UnsupportedFormat(format!("{format:?}")));
        }
    }

    Ok(())
}
