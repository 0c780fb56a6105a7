//! Matte extraction: from a photo and its segmentation mask to a trimmed
//! RGBA cutout of the person.
//!
//! The mask usually has a lower resolution than the photo, so the
//! above-threshold bounding box is mapped into image space through the
//! (generally non-integer) scale ratio and rounded outward to a pixel
//! grid. Each output pixel then nearest-samples its mask confidence:
//! at or above the person threshold the source RGB is copied and alpha is
//! forced opaque (with a short ramp just above the threshold), otherwise
//! the pixel stays fully transparent. The result is a hard-edged
//! silhouette, which keeps the later stroke rendering clean at the cost of
//! edge softness.
//!
//! The per-pixel pass is data-parallel over output rows: every row worker
//! reads the immutable mask and source and writes only its own row range,
//! so no synchronization is needed.

use image::RgbaImage;
use rayon::prelude::*;

use crate::error::{Error, Result};
use crate::geometry::Rect;
use crate::mask::{SegmentationMask, HIGH_CONFIDENCE_THRESHOLD, PERSON_THRESHOLD};

/// Alpha above this value counts as content when trimming transparent
/// margins.
pub const TRIM_ALPHA_THRESHOLD: u8 = 10;

/// Slope of the edge alpha ramp for confidences between the person and
/// high-confidence thresholds.
const EDGE_BLEND_FACTOR: f64 = 1.5;

/// Extract the person cutout from an upright source image.
///
/// # Errors
///
/// Returns [`Error::NoSegmentationResult`] when no mask pixel reaches the
/// person threshold or the mapped crop degenerates to zero area, and
/// [`Error::RenderFailed`] if the output buffer cannot be assembled.
pub fn extract_cutout(source: &RgbaImage, mask: &SegmentationMask) -> Result<RgbaImage> {
    let bounds = mask
        .person_bounds(PERSON_THRESHOLD)
        .ok_or(Error::NoSegmentationResult)?;

    let scale_x = f64::from(source.width()) / f64::from(mask.width());
    let scale_y = f64::from(source.height()) / f64::from(mask.height());

    let crop = Rect::new(
        f64::from(bounds.min_x) * scale_x,
        f64::from(bounds.min_y) * scale_y,
        f64::from(bounds.max_x - bounds.min_x + 1) * scale_x,
        f64::from(bounds.max_y - bounds.min_y + 1) * scale_y,
    )
    .integral();

    // Clip the integral rect to the source, then check it survived.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let crop_x = crop.min_x().max(0.0) as u32;
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let crop_y = crop.min_y().max(0.0) as u32;
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let crop_max_x = (crop.max_x() as u32).min(source.width());
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let crop_max_y = (crop.max_y() as u32).min(source.height());
    if crop_x >= crop_max_x || crop_y >= crop_max_y {
        return Err(Error::NoSegmentationResult);
    }
    let crop_w = crop_max_x - crop_x;
    let crop_h = crop_max_y - crop_y;

    let row_len = (crop_w as usize) * 4;
    let mut buffer = vec![0u8; row_len * (crop_h as usize)];

    buffer
        .par_chunks_mut(row_len)
        .enumerate()
        .for_each(|(dy, row)| {
            #[allow(clippy::cast_possible_truncation)]
            let source_y = crop_y + dy as u32;
            for dx in 0..crop_w {
                let source_x = crop_x + dx;

                // Nearest-sample the mask at the source pixel's position.
                #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
                let mask_x = (f64::from(source_x) / scale_x) as u32;
                #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
                let mask_y = (f64::from(source_y) / scale_y) as u32;
                if mask_x >= mask.width() || mask_y >= mask.height() {
                    continue;
                }

                let confidence = mask.confidence(mask_x, mask_y);
                if confidence < PERSON_THRESHOLD {
                    continue;
                }

                let px = source.get_pixel(source_x, source_y);
                let offset = (dx as usize) * 4;
                row[offset..offset + 3].copy_from_slice(&px.0[..3]);
                row[offset + 3] = if confidence >= HIGH_CONFIDENCE_THRESHOLD {
                    255
                } else {
                    // Short alpha ramp just above the threshold softens the
                    // silhouette edge without reintroducing model noise.
                    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
                    let ramped = (f64::from(confidence - PERSON_THRESHOLD) * EDGE_BLEND_FACTOR)
                        .min(255.0) as u8;
                    ramped
                };
            }
        });

    RgbaImage::from_raw(crop_w, crop_h, buffer)
        .ok_or_else(|| Error::RenderFailed("cutout buffer assembly".to_string()))
}

/// Crop an RGBA raster to the tight bounding box of pixels whose alpha
/// exceeds [`TRIM_ALPHA_THRESHOLD`].
///
/// Removes the transparent margin left by rounding the mask-space bounding
/// box onto the image pixel grid. A fully transparent raster is returned
/// unchanged.
#[must_use]
pub fn trim(image: &RgbaImage) -> RgbaImage {
    let mut min_x = image.width();
    let mut min_y = image.height();
    let mut max_x = 0u32;
    let mut max_y = 0u32;
    let mut any = false;

    for (x, y, px) in image.enumerate_pixels() {
        if px[3] > TRIM_ALPHA_THRESHOLD {
            min_x = min_x.min(x);
            min_y = min_y.min(y);
            max_x = max_x.max(x);
            max_y = max_y.max(y);
            any = true;
        }
    }

    if !any {
        return image.clone();
    }

    image::imageops::crop_imm(image, min_x, min_y, max_x - min_x + 1, max_y - min_y + 1)
        .to_image()
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    fn solid_source(width: u32, height: u32, color: [u8; 4]) -> RgbaImage {
        RgbaImage::from_pixel(width, height, Rgba(color))
    }

    #[test]
    fn all_below_threshold_mask_fails() {
        let source = solid_source(40, 40, [10, 20, 30, 255]);
        let mask = SegmentationMask::new(20, 20, vec![PERSON_THRESHOLD - 1; 400]).unwrap();
        match extract_cutout(&source, &mask) {
            Err(Error::NoSegmentationResult) => {}
            other => panic!("expected NoSegmentationResult, got {other:?}"),
        }
    }

    #[test]
    fn single_mask_pixel_yields_nonzero_output() {
        let source = solid_source(40, 40, [200, 100, 50, 255]);
        let mut data = vec![0u8; 400];
        data[10 * 20 + 10] = 255;
        let mask = SegmentationMask::new(20, 20, data).unwrap();

        let cutout = extract_cutout(&source, &mask).unwrap();
        // One mask pixel covers a 2x2 source region at this scale ratio.
        assert_eq!((cutout.width(), cutout.height()), (2, 2));
        for px in cutout.pixels() {
            assert_eq!(px.0, [200, 100, 50, 255]);
        }
    }

    #[test]
    fn below_threshold_pixels_stay_transparent() {
        // Left half person, right half background, mask at source resolution.
        let source = solid_source(10, 10, [9, 8, 7, 255]);
        let mut data = vec![0u8; 100];
        for y in 0..10 {
            for x in 0..5 {
                data[y * 10 + x] = 255;
            }
        }
        let mask = SegmentationMask::new(10, 10, data).unwrap();

        let cutout = extract_cutout(&source, &mask).unwrap();
        assert_eq!((cutout.width(), cutout.height()), (5, 10));
        for px in cutout.pixels() {
            assert_eq!(px.0[3], 255);
        }
    }

    #[test]
    fn edge_band_confidence_gets_ramped_alpha() {
        let source = solid_source(4, 4, [1, 2, 3, 255]);
        // Confidence 200 sits between the person and high thresholds.
        let mask = SegmentationMask::new(4, 4, vec![200; 16]).unwrap();
        let cutout = extract_cutout(&source, &mask).unwrap();
        let expected = (f64::from(200 - PERSON_THRESHOLD) * EDGE_BLEND_FACTOR) as i64;
        for px in cutout.pixels() {
            assert_eq!(i64::from(px.0[3]), expected);
        }
    }

    #[test]
    fn trim_removes_transparent_margin() {
        let mut image = RgbaImage::new(10, 10);
        image.put_pixel(3, 4, Rgba([255, 0, 0, 255]));
        image.put_pixel(6, 7, Rgba([0, 255, 0, 255]));
        let trimmed = trim(&image);
        assert_eq!((trimmed.width(), trimmed.height()), (4, 4));
        assert_eq!(trimmed.get_pixel(0, 0).0, [255, 0, 0, 255]);
        assert_eq!(trimmed.get_pixel(3, 3).0, [0, 255, 0, 255]);
    }

    #[test]
    fn trim_ignores_nearly_transparent_pixels() {
        let mut image = RgbaImage::new(6, 6);
        image.put_pixel(0, 0, Rgba([255, 255, 255, TRIM_ALPHA_THRESHOLD]));
        image.put_pixel(2, 2, Rgba([255, 255, 255, 200]));
        let trimmed = trim(&image);
        assert_eq!((trimmed.width(), trimmed.height()), (1, 1));
    }

    #[test]
    fn trim_of_fully_transparent_image_is_identity() {
        let image = RgbaImage::new(5, 5);
        let trimmed = trim(&image);
        assert_eq!((trimmed.width(), trimmed.height()), (5, 5));
    }
}
