//! Person-segmentation masks and the capability boundary that produces
//! them.
//!
//! The crate does not run a segmentation model itself. A [`Segmenter`]
//! collaborator accepts an upright bitmap and returns a single-channel
//! confidence raster, typically at a lower resolution than the source.
//! Both failure modes are distinct and terminal for the request: an
//! unreadable bitmap ([`crate::Error::InvalidImage`]) and a model that
//! found no person ([`crate::Error::NoSegmentationResult`]). Neither is
//! retried.

use std::path::PathBuf;

use image::{GrayImage, RgbaImage};

use crate::error::{Error, Result};

/// Confidence at or above this value counts as part of the person.
///
/// Deliberately strict so low-confidence model noise around the silhouette
/// is excluded from the bounding box.
pub const PERSON_THRESHOLD: u8 = 192;

/// Confidence at or above this value maps to fully opaque output; values
/// between [`PERSON_THRESHOLD`] and this one get a ramped edge alpha.
pub const HIGH_CONFIDENCE_THRESHOLD: u8 = 220;

/// Inclusive bounding box of above-threshold mask pixels, in mask space.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MaskBounds {
    /// Leftmost above-threshold column.
    pub min_x: u32,
    /// Topmost above-threshold row.
    pub min_y: u32,
    /// Rightmost above-threshold column (inclusive).
    pub max_x: u32,
    /// Bottom above-threshold row (inclusive).
    pub max_y: u32,
}

/// A single-channel segmentation confidence raster.
#[derive(Debug, Clone)]
pub struct SegmentationMask {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl SegmentationMask {
    /// Wrap a raw confidence buffer.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidImage`] if the dimensions are zero or do not
    /// match the buffer length.
    pub fn new(width: u32, height: u32, data: Vec<u8>) -> Result<Self> {
        if width == 0 || height == 0 || data.len() != (width as usize) * (height as usize) {
            return Err(Error::InvalidImage(format!(
                "mask buffer of {} bytes does not match {width}x{height}",
                data.len()
            )));
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    /// Build a mask from a grayscale image, one confidence byte per pixel.
    #[must_use]
    pub fn from_gray(image: &GrayImage) -> Self {
        Self {
            width: image.width(),
            height: image.height(),
            data: image.as_raw().clone(),
        }
    }

    /// Mask width in pixels.
    #[must_use]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Mask height in pixels.
    #[must_use]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Confidence at `(x, y)`.
    ///
    /// # Panics
    ///
    /// Panics if the coordinates are out of bounds.
    #[must_use]
    pub fn confidence(&self, x: u32, y: u32) -> u8 {
        assert!(x < self.width && y < self.height, "mask access out of bounds");
        self.data[(y as usize) * (self.width as usize) + (x as usize)]
    }

    /// Bounding box of all pixels with confidence at or above `threshold`,
    /// or `None` when no pixel qualifies.
    #[must_use]
    pub fn person_bounds(&self, threshold: u8) -> Option<MaskBounds> {
        let mut bounds: Option<MaskBounds> = None;
        for y in 0..self.height {
            let row = &self.data
                [(y as usize) * (self.width as usize)..((y as usize) + 1) * (self.width as usize)];
            for (x, &confidence) in row.iter().enumerate() {
                if confidence < threshold {
                    continue;
                }
                #[allow(clippy::cast_possible_truncation)]
                let x = x as u32;
                bounds = Some(match bounds {
                    None => MaskBounds {
                        min_x: x,
                        min_y: y,
                        max_x: x,
                        max_y: y,
                    },
                    Some(b) => MaskBounds {
                        min_x: b.min_x.min(x),
                        min_y: b.min_y.min(y),
                        max_x: b.max_x.max(x),
                        max_y: b.max_y.max(y),
                    },
                });
            }
        }
        bounds
    }
}

/// Model quality knob, passed through to the segmentation collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SegmentationQuality {
    /// Fastest, lowest mask resolution.
    Fast,
    /// Balanced speed and resolution.
    Balanced,
    /// Best mask quality; the pipeline default.
    #[default]
    Accurate,
}

/// The external person-segmentation capability.
///
/// Implementations receive an upright bitmap and either return a
/// confidence mask or fail. A request is single-attempt: the pipeline
/// never retries a failed segmentation, and callers racing multiple
/// requests must discard superseded results themselves.
pub trait Segmenter {
    /// Segment the principal person in `image`.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidImage`] when the bitmap cannot be processed and
    /// [`Error::NoSegmentationResult`] when no person is found.
    fn segment(&self, image: &RgbaImage, quality: SegmentationQuality)
        -> Result<SegmentationMask>;
}

/// A [`Segmenter`] that loads a precomputed mask raster from disk.
///
/// This is how an externally produced model output (e.g. from a
/// Vision-style API on another platform) enters the pipeline.
#[derive(Debug, Clone)]
pub struct MaskFileSegmenter {
    path: PathBuf,
}

impl MaskFileSegmenter {
    /// Use the mask stored at `path`.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl Segmenter for MaskFileSegmenter {
    fn segment(
        &self,
        _image: &RgbaImage,
        _quality: SegmentationQuality,
    ) -> Result<SegmentationMask> {
        let mask = image::open(&self.path)
            .map_err(|err| {
                Error::InvalidImage(format!("mask {}: {err}", self.path.display()))
            })?
            .to_luma8();
        Ok(SegmentationMask::from_gray(&mask))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_rejects_mismatched_buffer() {
        assert!(SegmentationMask::new(4, 4, vec![0; 15]).is_err());
        assert!(SegmentationMask::new(0, 4, vec![]).is_err());
        assert!(SegmentationMask::new(4, 4, vec![0; 16]).is_ok());
    }

    #[test]
    fn bounds_of_uniformly_low_mask_is_none() {
        let mask = SegmentationMask::new(8, 8, vec![PERSON_THRESHOLD - 1; 64]).unwrap();
        assert!(mask.person_bounds(PERSON_THRESHOLD).is_none());
    }

    #[test]
    fn single_pixel_bounds() {
        let mut data = vec![0u8; 64];
        data[3 * 8 + 5] = PERSON_THRESHOLD;
        let mask = SegmentationMask::new(8, 8, data).unwrap();
        let bounds = mask.person_bounds(PERSON_THRESHOLD).unwrap();
        assert_eq!(
            bounds,
            MaskBounds {
                min_x: 5,
                min_y: 3,
                max_x: 5,
                max_y: 3
            }
        );
    }

    #[test]
    fn bounds_span_scattered_pixels() {
        let mut data = vec![0u8; 100];
        data[10 + 2] = 255; // (2, 1)
        data[7 * 10 + 8] = 200; // (8, 7)
        data[4 * 10 + 4] = 150; // below threshold, ignored
        let mask = SegmentationMask::new(10, 10, data).unwrap();
        let bounds = mask.person_bounds(PERSON_THRESHOLD).unwrap();
        assert_eq!(
            bounds,
            MaskBounds {
                min_x: 2,
                min_y: 1,
                max_x: 8,
                max_y: 7
            }
        );
    }
}
