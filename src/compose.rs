//! Interactive placement and final composition of a cutout over a photo
//! grid.
//!
//! Placement lives in background-relative units: the cutout's offset is a
//! fraction of the background edge and its scale multiplies a base size
//! derived from the grid cell. Conversion to absolute pixels happens only
//! at render time, so an interactive preview and a high-resolution export
//! that share a [`CompositionState`] place the cutout at the same relative
//! position. That is the correctness contract between the two render
//! paths.
//!
//! The final canvas is computed in a coordinate system centered on the
//! background: the union of the background box and the (possibly
//! overflowing) cutout box, grown by a uniform shadow margin, with the
//! width kept symmetric about the background center.

use image::{imageops, Rgba, RgbaImage};

use crate::error::{Error, Result};
use crate::geometry::{Rect, Size, Vec2};
use crate::raster;
use crate::sticker::{apply_sticker, StickerStyle};

/// Cutout base size as a multiple of one grid cell edge.
pub const CUTOUT_CELL_FACTOR: f64 = 2.8;

/// Minimum rendered cutout width as a fraction of the background width.
pub const MIN_WIDTH_FRACTION: f64 = 0.5;

/// Maximum rendered cutout width as a fraction of the background width.
pub const MAX_WIDTH_FRACTION: f64 = 1.0;

/// Uniform canvas margin for shadows, as a fraction of the background
/// edge.
pub const SHADOW_MARGIN_RATIO: f64 = 0.06;

/// Extra vertical drag overflow beyond the background edge, as a fraction
/// of the background edge.
pub const VERTICAL_OVERFLOW_MARGIN: f64 = 0.3;

/// Interactive placement of the cutout over the background grid.
///
/// `offset` is the cutout center relative to the background center, in
/// fractions of the background edge; `scale` multiplies the base cutout
/// size. Mutated by a single writer (the gesture handler) and read by the
/// renderer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CompositionState {
    /// Cutout center offset from the background center, as a fraction of
    /// the background edge.
    pub offset: Vec2,
    /// Scale multiplier on the base cutout size.
    pub scale: f64,
}

impl Default for CompositionState {
    fn default() -> Self {
        Self {
            offset: Vec2::ZERO,
            scale: 1.0,
        }
    }
}

impl CompositionState {
    /// Initial placement adapted to the cutout's aspect ratio.
    ///
    /// Wider (close-up) cutouts start smaller so they sit comfortably in
    /// the grid; a full-body portrait around 1:2 starts at scale 1. The
    /// scale is clamped to `[0.75, 1.25]`.
    #[must_use]
    pub fn adaptive(cutout_aspect: f64) -> Self {
        let reference_aspect = 0.5;
        let scale = if cutout_aspect > 0.0 {
            (reference_aspect / cutout_aspect).clamp(0.75, 1.25)
        } else {
            1.0
        };
        Self {
            offset: Vec2::ZERO,
            scale,
        }
    }

    /// Rendered cutout width as a fraction of the background edge, before
    /// scale clamping.
    #[must_use]
    pub fn width_fraction(&self, cutout_aspect: f64) -> f64 {
        base_width_fraction(cutout_aspect) * self.scale
    }

    /// Rendered cutout height as a fraction of the background edge.
    #[must_use]
    pub fn height_fraction(&self, cutout_aspect: f64) -> f64 {
        let base = (CUTOUT_CELL_FACTOR / 3.0) * self.scale;
        if cutout_aspect > 1.0 {
            base / cutout_aspect
        } else {
            base
        }
    }

    /// Apply a pinch: clamp `proposed` so the rendered cutout width stays
    /// within [`MIN_WIDTH_FRACTION`]..[`MAX_WIDTH_FRACTION`] of the
    /// background.
    pub fn set_scale(&mut self, proposed: f64, cutout_aspect: f64) {
        let width_at_one = base_width_fraction(cutout_aspect);
        if width_at_one <= 0.0 {
            return;
        }
        let min_scale = MIN_WIDTH_FRACTION / width_at_one;
        let max_scale = MAX_WIDTH_FRACTION / width_at_one;
        self.scale = proposed.clamp(min_scale, max_scale);
    }

    /// Apply a drag: clamp `proposed` so the cutout stays within the
    /// background horizontally and within a generous overflow margin
    /// vertically (the pop-out effect).
    pub fn set_offset(&mut self, proposed: Vec2, cutout_aspect: f64) {
        let half_w = self.width_fraction(cutout_aspect) / 2.0;
        let half_h = self.height_fraction(cutout_aspect) / 2.0;
        let max_x = (0.5 - half_w).max(0.0);
        let max_y = (0.5 - half_h + VERTICAL_OVERFLOW_MARGIN).max(0.0);
        self.offset = Vec2::new(
            proposed.x.clamp(-max_x, max_x),
            proposed.y.clamp(-max_y, max_y),
        );
    }
}

/// Cutout width at scale 1, as a fraction of the background edge.
fn base_width_fraction(cutout_aspect: f64) -> f64 {
    let base = CUTOUT_CELL_FACTOR / 3.0;
    if cutout_aspect > 1.0 {
        base
    } else {
        base * cutout_aspect
    }
}

/// Output size and cell spacing of the background grid raster.
#[derive(Debug, Clone, Copy)]
pub struct GridOptions {
    /// Edge length of the square grid raster in pixels.
    pub size: u32,
    /// Gap between cells in pixels.
    pub spacing: u32,
}

impl Default for GridOptions {
    fn default() -> Self {
        Self {
            size: 1080,
            spacing: 4,
        }
    }
}

/// Center-crop an image to a square of its shorter edge.
#[must_use]
pub fn center_crop_square(image: &RgbaImage) -> RgbaImage {
    let edge = image.width().min(image.height());
    let x = (image.width() - edge) / 2;
    let y = (image.height() - edge) / 2;
    imageops::crop_imm(image, x, y, edge, edge).to_image()
}

/// Tile up to nine photos into a square 3x3 grid raster.
///
/// Each photo is center-cropped to a square and resized to the cell size.
/// Fewer than nine photos cycle to fill all cells.
///
/// # Errors
///
/// Returns [`Error::InvalidImage`] when no photos are given and
/// [`Error::RenderFailed`] when the options leave no room for cells.
pub fn build_grid(photos: &[RgbaImage], options: &GridOptions) -> Result<RgbaImage> {
    if photos.is_empty() {
        return Err(Error::InvalidImage("no grid photos".to_string()));
    }
    if options.size <= options.spacing * 2 {
        return Err(Error::RenderFailed(
            "grid size leaves no room for cells".to_string(),
        ));
    }
    let cell = (options.size - options.spacing * 2) / 3;
    if cell == 0 {
        return Err(Error::RenderFailed(
            "grid size leaves no room for cells".to_string(),
        ));
    }

    let mut canvas = RgbaImage::from_pixel(options.size, options.size, Rgba([255, 255, 255, 255]));
    for index in 0..9u32 {
        let photo = &photos[(index as usize) % photos.len()];
        if photo.width() == 0 || photo.height() == 0 {
            return Err(Error::InvalidImage("empty grid photo".to_string()));
        }
        let squared = center_crop_square(photo);
        let resized = imageops::resize(&squared, cell, cell, imageops::FilterType::Triangle);

        let col = index % 3;
        let row = index / 3;
        let x = col * (cell + options.spacing);
        let y = row * (cell + options.spacing);
        raster::draw_over(&mut canvas, &resized, i64::from(x), i64::from(y));
    }
    Ok(canvas)
}

/// Resolved pixel geometry of one composition at a concrete background
/// size.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CompositionLayout {
    /// Final canvas size in pixels.
    pub canvas: Size,
    /// Background rect within the canvas.
    pub background_rect: Rect,
    /// Cutout rect within the canvas (before sticker padding).
    pub cutout_rect: Rect,
}

/// Compute the canvas and draw rects for a composition.
///
/// Both boxes are expressed in a coordinate system centered on the
/// background, unioned, grown by the shadow margin, and the canvas width
/// is kept symmetric about the background center. Pure: the relative
/// placement of the cutout depends only on `state` and `cutout_aspect`,
/// never on the absolute background size.
///
/// # Errors
///
/// Returns [`Error::RenderFailed`] for a degenerate background size.
pub fn layout_composition(
    background: Size,
    cutout_aspect: f64,
    state: &CompositionState,
) -> Result<CompositionLayout> {
    if background.width <= 0.0 || background.height <= 0.0 {
        return Err(Error::RenderFailed("degenerate background".to_string()));
    }
    let edge = background.width;

    let cutout_w = state.width_fraction(cutout_aspect) * edge;
    let cutout_h = state.height_fraction(cutout_aspect) * edge;
    if cutout_w <= 0.0 || cutout_h <= 0.0 {
        return Err(Error::RenderFailed("degenerate cutout".to_string()));
    }

    // Centered coordinates: origin at the background center.
    let background_box = Rect::new(
        -background.width / 2.0,
        -background.height / 2.0,
        background.width,
        background.height,
    );
    let cutout_box = Rect::new(
        state.offset.x * edge - cutout_w / 2.0,
        state.offset.y * edge - cutout_h / 2.0,
        cutout_w,
        cutout_h,
    );

    let margin = edge * SHADOW_MARGIN_RATIO;
    let canvas_box = background_box.union(&cutout_box).inset_by(-margin, -margin);

    // Horizontal symmetry about the background center keeps the grid
    // visually anchored; vertically the canvas hugs the content.
    let half_width = canvas_box.min_x().abs().max(canvas_box.max_x().abs());
    let anchor_x = half_width;
    let anchor_y = -canvas_box.min_y();

    Ok(CompositionLayout {
        canvas: Size::new(half_width * 2.0, canvas_box.height),
        background_rect: background_box.offset_by(anchor_x, anchor_y),
        cutout_rect: cutout_box.offset_by(anchor_x, anchor_y),
    })
}

/// Flatten the background and the stroked, shadowed cutout into one
/// raster.
///
/// The sticker treatment is applied at render time from the scaled
/// cutout's actual pixel dimensions, so preview-sized and export-sized
/// renders get a consistent stroke weight relative to their resolution.
///
/// # Errors
///
/// Returns [`Error::RenderFailed`] on degenerate inputs or canvas sizes.
pub fn render(
    background: &RgbaImage,
    cutout: &RgbaImage,
    state: &CompositionState,
    style: &StickerStyle,
) -> Result<RgbaImage> {
    if background.width() == 0 || background.height() == 0 {
        return Err(Error::RenderFailed("empty background".to_string()));
    }
    if cutout.width() == 0 || cutout.height() == 0 {
        return Err(Error::RenderFailed("empty cutout".to_string()));
    }

    let cutout_aspect = f64::from(cutout.width()) / f64::from(cutout.height());
    let layout = layout_composition(
        Size::new(f64::from(background.width()), f64::from(background.height())),
        cutout_aspect,
        state,
    )?;

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let canvas_w = layout.canvas.width.round() as u32;
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let canvas_h = layout.canvas.height.round() as u32;
    if canvas_w == 0 || canvas_h == 0 {
        return Err(Error::RenderFailed("zero-area canvas".to_string()));
    }

    let mut canvas = RgbaImage::from_pixel(canvas_w, canvas_h, Rgba([255, 255, 255, 255]));

    #[allow(clippy::cast_possible_truncation)]
    raster::draw_over(
        &mut canvas,
        background,
        layout.background_rect.min_x().round() as i64,
        layout.background_rect.min_y().round() as i64,
    );

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let target_w = layout.cutout_rect.width.round().max(1.0) as u32;
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let target_h = layout.cutout_rect.height.round().max(1.0) as u32;
    let scaled = imageops::resize(cutout, target_w, target_h, imageops::FilterType::Triangle);

    let sticker = apply_sticker(&scaled, style)?;
    #[allow(clippy::cast_possible_truncation)]
    raster::draw_over(
        &mut canvas,
        &sticker.image,
        layout.cutout_rect.min_x().round() as i64 - i64::from(sticker.padding),
        layout.cutout_rect.min_y().round() as i64 - i64::from(sticker.padding),
    );

    Ok(canvas)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn adaptive_scale_shrinks_wide_cutouts() {
        let wide = CompositionState::adaptive(1.5);
        assert!((wide.scale - 0.75).abs() < 1e-12);
        let portrait = CompositionState::adaptive(0.5);
        assert!((portrait.scale - 1.0).abs() < 1e-12);
        let narrow = CompositionState::adaptive(0.2);
        assert!((narrow.scale - 1.25).abs() < 1e-12);
    }

    #[test]
    fn scale_clamp_keeps_width_in_range() {
        let aspect = 0.75;
        let mut state = CompositionState::default();

        state.set_scale(100.0, aspect);
        assert!(state.width_fraction(aspect) <= MAX_WIDTH_FRACTION + 1e-12);

        state.set_scale(0.0, aspect);
        assert!(state.width_fraction(aspect) >= MIN_WIDTH_FRACTION - 1e-12);
    }

    #[test]
    fn offset_clamp_allows_vertical_overflow() {
        let aspect = 0.75;
        let mut state = CompositionState::default();
        state.set_scale(1.0, aspect);
        state.set_offset(Vec2::new(10.0, 10.0), aspect);
        let half_w = state.width_fraction(aspect) / 2.0;
        assert!(state.offset.x <= 0.5 - half_w + 1e-12);
        assert!(state.offset.y > 0.5 - state.height_fraction(aspect) / 2.0);
    }

    #[test]
    fn relative_position_is_invariant_across_container_sizes() {
        let state = CompositionState {
            offset: Vec2::new(0.21, -0.13),
            scale: 0.9,
        };
        let aspect = 0.65;

        let preview = layout_composition(Size::new(300.0, 300.0), aspect, &state).unwrap();
        let export = layout_composition(Size::new(1200.0, 1200.0), aspect, &state).unwrap();

        for (layout, edge) in [(preview, 300.0), (export, 1200.0)] {
            let relative_x =
                (layout.cutout_rect.mid_x() - layout.background_rect.mid_x()) / edge;
            let relative_y =
                (layout.cutout_rect.mid_y() - layout.background_rect.mid_y()) / edge;
            assert!((relative_x - 0.21).abs() < 1e-9, "x drifted: {relative_x}");
            assert!((relative_y + 0.13).abs() < 1e-9, "y drifted: {relative_y}");
        }

        // The export canvas is exactly the preview canvas scaled up.
        assert!(
            (export.canvas.width / preview.canvas.width - 4.0).abs() < 1e-9
        );
        assert!(
            (export.canvas.height / preview.canvas.height - 4.0).abs() < 1e-9
        );
    }

    #[test]
    fn canvas_contains_an_overflowing_cutout() {
        let state = CompositionState {
            offset: Vec2::new(0.45, 0.0),
            scale: 1.0,
        };
        let layout = layout_composition(Size::new(100.0, 100.0), 0.8, &state).unwrap();
        assert!(layout.canvas.width > 100.0);
        assert!(layout.cutout_rect.max_x() <= layout.canvas.width + 1e-9);
        assert!(layout.background_rect.min_x() >= 0.0);
        // Width stays symmetric about the background center.
        let bg_center = layout.background_rect.mid_x();
        assert!((layout.canvas.width - 2.0 * bg_center).abs() < 1e-9);
    }

    #[test]
    fn degenerate_background_is_a_render_failure() {
        let state = CompositionState::default();
        assert!(layout_composition(Size::new(0.0, 100.0), 1.0, &state).is_err());
    }

    #[test]
    fn grid_tiles_and_cycles_photos() {
        let red = RgbaImage::from_pixel(20, 30, Rgba([255, 0, 0, 255]));
        let blue = RgbaImage::from_pixel(30, 20, Rgba([0, 0, 255, 255]));
        let grid = build_grid(&[red, blue], &GridOptions {
            size: 92,
            spacing: 1,
        })
        .unwrap();
        assert_eq!((grid.width(), grid.height()), (92, 92));
        // Cell 0 is red, cell 1 (cycling) is blue.
        assert_eq!(grid.get_pixel(15, 15).0, [255, 0, 0, 255]);
        assert_eq!(grid.get_pixel(46, 15).0, [0, 0, 255, 255]);
        // Spacing stays white.
        assert_eq!(grid.get_pixel(30, 15).0, [255, 255, 255, 255]);
    }

    #[test]
    fn grid_requires_photos() {
        assert!(build_grid(&[], &GridOptions::default()).is_err());
    }

    #[test]
    fn render_produces_a_canvas_larger_than_the_background() {
        let background = RgbaImage::from_pixel(90, 90, Rgba([0, 128, 0, 255]));
        let cutout = RgbaImage::from_pixel(20, 30, Rgba([200, 50, 50, 255]));
        let state = CompositionState::default();
        let output = render(&background, &cutout, &state, &StickerStyle::default()).unwrap();
        assert!(output.width() >= 90);
        assert!(output.height() >= 90);
        // The cutout's center pixel lands at the canvas center with the
        // default (zero) offset.
        let center = output.get_pixel(output.width() / 2, output.height() / 2);
        assert_eq!(center.0, [200, 50, 50, 255]);
    }
}
