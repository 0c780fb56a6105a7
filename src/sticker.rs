//! Stroke and shadow synthesis: turn a flat cutout into a "sticker" with a
//! white outline and a soft drop shadow.
//!
//! The alpha shape is dilated outward by a resolution-proportional stroke
//! width, producing an expanded silhouette. That silhouette becomes two
//! layers: solid white (the stroke) and semi-transparent black that is
//! Gaussian-blurred and offset diagonally (the shadow). Layer order,
//! bottom to top: shadow, stroke, original cutout.
//!
//! All proportions are tunable through [`StickerStyle`], but the
//! relationships are fixed: dilation happens before the blur, the blur
//! before the offset, the stroke draws over the shadow, and the sharp
//! cutout draws over both.

use image::{Rgba, RgbaImage};

use crate::error::{Error, Result};
use crate::raster;

/// Visual parameters of the sticker treatment.
///
/// The defaults keep the outline's visual weight consistent across photo
/// resolutions: the stroke is 0.8% of the cutout's largest dimension with
/// a 3 px floor, and the shadow's blur and offset follow the stroke.
#[derive(Debug, Clone)]
pub struct StickerStyle {
    /// Stroke width as a fraction of the cutout's largest dimension.
    pub stroke_ratio: f64,
    /// Minimum stroke width in pixels.
    pub min_stroke: f64,
    /// Shadow blur sigma as a multiple of the stroke width.
    pub shadow_blur_ratio: f64,
    /// Diagonal shadow offset as a multiple of the stroke width.
    pub shadow_offset_ratio: f64,
    /// Shadow opacity in `[0, 1]`.
    pub shadow_alpha: f64,
    /// Stroke color, white by default.
    pub stroke_color: [u8; 3],
}

impl Default for StickerStyle {
    fn default() -> Self {
        Self {
            stroke_ratio: 0.008,
            min_stroke: 3.0,
            shadow_blur_ratio: 0.4,
            shadow_offset_ratio: 0.3,
            shadow_alpha: 0.5,
            stroke_color: [255, 255, 255],
        }
    }
}

impl StickerStyle {
    /// Stroke width in pixels for a cutout of the given dimensions.
    #[must_use]
    pub fn stroke_width(&self, width: u32, height: u32) -> f64 {
        (f64::from(width.max(height)) * self.stroke_ratio).max(self.min_stroke)
    }
}

/// A stroked, shadowed cutout plus the padding added around the original
/// raster to make room for the treatment.
#[derive(Debug, Clone)]
pub struct Sticker {
    /// The composited sticker raster.
    pub image: RgbaImage,
    /// Uniform padding in pixels around the original cutout's origin.
    pub padding: u32,
}

/// Apply the stroke and shadow treatment to a cutout.
///
/// The result is larger than the input by a uniform padding on every side;
/// drawing the sticker at `(x - padding, y - padding)` keeps the original
/// cutout pixels exactly where the bare cutout would have been.
///
/// # Errors
///
/// Returns [`Error::RenderFailed`] for an empty cutout or if the padded
/// buffer cannot be assembled.
pub fn apply_sticker(cutout: &RgbaImage, style: &StickerStyle) -> Result<Sticker> {
    let (width, height) = (cutout.width(), cutout.height());
    if width == 0 || height == 0 {
        return Err(Error::RenderFailed("empty cutout".to_string()));
    }

    let stroke = style.stroke_width(width, height);
    let sigma = stroke * style.shadow_blur_ratio;
    let shadow_offset = stroke * style.shadow_offset_ratio;

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let padding = (stroke + sigma * 3.0 + shadow_offset).ceil() as u32;
    let padded_w = (width + 2 * padding) as usize;
    let padded_h = (height + 2 * padding) as usize;

    // Silhouette occupancy on the padded canvas.
    let mut occupied = vec![false; padded_w * padded_h];
    for (x, y, px) in cutout.enumerate_pixels() {
        if px[3] > 0 {
            let index =
                (y as usize + padding as usize) * padded_w + (x as usize + padding as usize);
            occupied[index] = true;
        }
    }

    // Expand the silhouette outward by the stroke width.
    let distance = outside_distance(&occupied, padded_w, padded_h);
    #[allow(clippy::cast_possible_truncation)]
    let stroke_f32 = stroke as f32;
    let dilated: Vec<bool> = distance.iter().map(|&d| d <= stroke_f32).collect();

    // Shadow alpha field: flat inside the dilated silhouette, then blurred.
    let shadow_level = (style.shadow_alpha * 255.0).clamp(0.0, 255.0);
    #[allow(clippy::cast_possible_truncation)]
    let shadow_flat: Vec<f32> = dilated
        .iter()
        .map(|&inside| if inside { shadow_level as f32 } else { 0.0 })
        .collect();
    let shadow_blurred = gaussian_blur_channel(&shadow_flat, padded_w, padded_h, sigma);

    #[allow(clippy::cast_possible_truncation)]
    let offset_px = shadow_offset.round() as i64;

    let mut out = RgbaImage::new(
        u32::try_from(padded_w).map_err(|_| Error::RenderFailed("canvas too large".to_string()))?,
        u32::try_from(padded_h).map_err(|_| Error::RenderFailed("canvas too large".to_string()))?,
    );

    // Bottom layer: the offset, blurred shadow.
    for y in 0..padded_h {
        for x in 0..padded_w {
            let src_x = x as i64 - offset_px;
            let src_y = y as i64 - offset_px;
            if src_x < 0 || src_y < 0 {
                continue;
            }
            #[allow(clippy::cast_sign_loss)]
            let (src_x, src_y) = (src_x as usize, src_y as usize);
            if src_x >= padded_w || src_y >= padded_h {
                continue;
            }
            let alpha = shadow_blurred[src_y * padded_w + src_x];
            if alpha <= 0.0 {
                continue;
            }
            #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
            let alpha = alpha.round().clamp(0.0, 255.0) as u8;
            #[allow(clippy::cast_possible_truncation)]
            raster::over(
                out.get_pixel_mut(x as u32, y as u32),
                Rgba([0, 0, 0, alpha]),
            );
        }
    }

    // Middle layer: solid stroke wherever the dilated silhouette is opaque.
    let [r, g, b] = style.stroke_color;
    for y in 0..padded_h {
        for x in 0..padded_w {
            if dilated[y * padded_w + x] {
                #[allow(clippy::cast_possible_truncation)]
                raster::over(out.get_pixel_mut(x as u32, y as u32), Rgba([r, g, b, 255]));
            }
        }
    }

    // Top layer: the original, sharp cutout.
    raster::draw_over(&mut out, cutout, i64::from(padding), i64::from(padding));

    Ok(Sticker {
        image: out,
        padding,
    })
}

/// Chamfer distance from each cell to the nearest occupied cell.
///
/// Occupied cells are at distance zero. Two passes with orthogonal step 1
/// and diagonal step sqrt(2) give a close approximation of Euclidean
/// distance, good enough for stroke widths of a few pixels.
fn outside_distance(occupied: &[bool], width: usize, height: usize) -> Vec<f32> {
    const ORTHO: f32 = 1.0;
    const DIAG: f32 = std::f32::consts::SQRT_2;

    let mut dist: Vec<f32> = occupied
        .iter()
        .map(|&inside| if inside { 0.0 } else { f32::INFINITY })
        .collect();

    // Forward pass: top-left to bottom-right.
    for y in 0..height {
        for x in 0..width {
            let index = y * width + x;
            let mut best = dist[index];
            if x > 0 {
                best = best.min(dist[index - 1] + ORTHO);
            }
            if y > 0 {
                best = best.min(dist[index - width] + ORTHO);
                if x > 0 {
                    best = best.min(dist[index - width - 1] + DIAG);
                }
                if x + 1 < width {
                    best = best.min(dist[index - width + 1] + DIAG);
                }
            }
            dist[index] = best;
        }
    }

    // Backward pass: bottom-right to top-left.
    for y in (0..height).rev() {
        for x in (0..width).rev() {
            let index = y * width + x;
            let mut best = dist[index];
            if x + 1 < width {
                best = best.min(dist[index + 1] + ORTHO);
            }
            if y + 1 < height {
                best = best.min(dist[index + width] + ORTHO);
                if x + 1 < width {
                    best = best.min(dist[index + width + 1] + DIAG);
                }
                if x > 0 {
                    best = best.min(dist[index + width - 1] + DIAG);
                }
            }
            dist[index] = best;
        }
    }

    dist
}

/// Separable Gaussian blur of a single float channel.
///
/// A non-positive sigma returns the input unchanged. The kernel extends to
/// three sigma on each side and is renormalized at the borders.
fn gaussian_blur_channel(data: &[f32], width: usize, height: usize, sigma: f64) -> Vec<f32> {
    if sigma <= 0.0 {
        return data.to_vec();
    }

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let radius = (sigma * 3.0).ceil() as usize;
    let kernel: Vec<f32> = (0..=2 * radius)
        .map(|i| {
            #[allow(clippy::cast_precision_loss)]
            let d = i as f64 - radius as f64;
            #[allow(clippy::cast_possible_truncation)]
            let weight = (-d * d / (2.0 * sigma * sigma)).exp() as f32;
            weight
        })
        .collect();

    let convolve_line = |line: &[f32], out: &mut [f32]| {
        let len = line.len();
        for (i, out_value) in out.iter_mut().enumerate() {
            let mut acc = 0.0f32;
            let mut total = 0.0f32;
            for (k, &weight) in kernel.iter().enumerate() {
                let j = i as i64 + k as i64 - radius as i64;
                if j < 0 || j >= len as i64 {
                    continue;
                }
                #[allow(clippy::cast_sign_loss)]
                {
                    acc += line[j as usize] * weight;
                }
                total += weight;
            }
            *out_value = if total > 0.0 { acc / total } else { 0.0 };
        }
    };

    // Horizontal pass.
    let mut horizontal = vec![0.0f32; width * height];
    let mut out_row = vec![0.0f32; width];
    for y in 0..height {
        let row = &data[y * width..(y + 1) * width];
        convolve_line(row, &mut out_row);
        horizontal[y * width..(y + 1) * width].copy_from_slice(&out_row);
    }

    // Vertical pass.
    let mut result = vec![0.0f32; width * height];
    let mut column = vec![0.0f32; height];
    let mut out_column = vec![0.0f32; height];
    for x in 0..width {
        for y in 0..height {
            column[y] = horizontal[y * width + x];
        }
        convolve_line(&column, &mut out_column);
        for y in 0..height {
            result[y * width + x] = out_column[y];
        }
    }

    result
}
