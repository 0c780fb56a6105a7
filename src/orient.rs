//! EXIF-style image orientation handling.
//!
//! Segmentation and matte extraction run in upright pixel space. The caller
//! supplies the source photo's orientation tag; the pipeline normalizes the
//! bitmap before processing and transforms results back so the returned
//! raster matches the photo as delivered.

use image::imageops;
use image::RgbaImage;

/// The eight EXIF orientation cases. The variant names the transform that
/// brings stored pixels upright.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Orientation {
    /// Pixels are already upright (EXIF 1).
    #[default]
    Upright,
    /// Mirrored along the vertical axis (EXIF 2).
    MirrorHorizontal,
    /// Rotated 180 degrees (EXIF 3).
    Rotate180,
    /// Mirrored along the horizontal axis (EXIF 4).
    MirrorVertical,
    /// Mirrored along the top-left diagonal (EXIF 5).
    Transpose,
    /// Needs a 90 degree clockwise rotation (EXIF 6).
    Rotate90,
    /// Mirrored along the top-right diagonal (EXIF 7).
    Transverse,
    /// Needs a 270 degree clockwise rotation (EXIF 8).
    Rotate270,
}

impl Orientation {
    /// Map a raw EXIF orientation value (1 through 8).
    #[must_use]
    pub fn from_exif(value: u16) -> Option<Self> {
        match value {
            1 => Some(Self::Upright),
            2 => Some(Self::MirrorHorizontal),
            3 => Some(Self::Rotate180),
            4 => Some(Self::MirrorVertical),
            5 => Some(Self::Transpose),
            6 => Some(Self::Rotate90),
            7 => Some(Self::Transverse),
            8 => Some(Self::Rotate270),
            _ => None,
        }
    }

    /// The raw EXIF value for this orientation.
    #[must_use]
    pub fn exif_value(self) -> u16 {
        match self {
            Self::Upright => 1,
            Self::MirrorHorizontal => 2,
            Self::Rotate180 => 3,
            Self::MirrorVertical => 4,
            Self::Transpose => 5,
            Self::Rotate90 => 6,
            Self::Transverse => 7,
            Self::Rotate270 => 8,
        }
    }

    /// Whether normalization is a no-op.
    #[must_use]
    pub fn is_upright(self) -> bool {
        self == Self::Upright
    }

    /// The orientation undoing this one. Rotations swap direction; mirrors
    /// and diagonal flips are their own inverse.
    #[must_use]
    pub fn inverse(self) -> Self {
        match self {
            Self::Rotate90 => Self::Rotate270,
            Self::Rotate270 => Self::Rotate90,
            other => other,
        }
    }

    /// Transform a stored bitmap into upright pixel space.
    #[must_use]
    pub fn to_upright(self, image: &RgbaImage) -> RgbaImage {
        match self {
            Self::Upright => image.clone(),
            Self::MirrorHorizontal => imageops::flip_horizontal(image),
            Self::Rotate180 => imageops::rotate180(image),
            Self::MirrorVertical => imageops::flip_vertical(image),
            Self::Transpose => imageops::flip_horizontal(&imageops::rotate90(image)),
            Self::Rotate90 => imageops::rotate90(image),
            Self::Transverse => imageops::flip_vertical(&imageops::rotate90(image)),
            Self::Rotate270 => imageops::rotate270(image),
        }
    }

    /// Transform an upright bitmap back into this orientation's stored
    /// space, undoing [`Orientation::to_upright`].
    #[must_use]
    pub fn from_upright(self, image: &RgbaImage) -> RgbaImage {
        self.inverse().to_upright(image)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    /// 2x3 test image with a unique color per pixel.
    fn sample() -> RgbaImage {
        let mut img = RgbaImage::new(2, 3);
        for (x, y, px) in img.enumerate_pixels_mut() {
            *px = Rgba([u8::try_from(x).unwrap(), u8::try_from(y).unwrap(), 7, 255]);
        }
        img
    }

    #[test]
    fn exif_values_round_trip() {
        for value in 1..=8 {
            let orientation = Orientation::from_exif(value).unwrap();
            assert_eq!(orientation.exif_value(), value);
        }
        assert!(Orientation::from_exif(0).is_none());
        assert!(Orientation::from_exif(9).is_none());
    }

    #[test]
    fn rotate90_swaps_dimensions() {
        let img = sample();
        let upright = Orientation::Rotate90.to_upright(&img);
        assert_eq!((upright.width(), upright.height()), (3, 2));
    }

    #[test]
    fn to_upright_then_from_upright_is_identity() {
        let img = sample();
        for value in 1..=8 {
            let orientation = Orientation::from_exif(value).unwrap();
            let round_tripped = orientation.from_upright(&orientation.to_upright(&img));
            assert_eq!(
                round_tripped, img,
                "orientation {value} did not round-trip"
            );
        }
    }
}
