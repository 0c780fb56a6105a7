//! Shared pixel helpers: straight-alpha "over" compositing.

use image::{Rgba, RgbaImage};

/// Standard alpha-over blend of straight (non-premultiplied) RGBA pixels.
pub(crate) fn over(dst: &mut Rgba<u8>, src: Rgba<u8>) {
    let src_a = f64::from(src[3]) / 255.0;
    if src_a <= 0.0 {
        return;
    }
    if src_a >= 1.0 {
        *dst = src;
        return;
    }

    let dst_a = f64::from(dst[3]) / 255.0;
    let out_a = src_a + dst_a * (1.0 - src_a);
    if out_a <= 0.0 {
        *dst = Rgba([0, 0, 0, 0]);
        return;
    }

    for channel in 0..3 {
        let blended = (f64::from(src[channel]) * src_a
            + f64::from(dst[channel]) * dst_a * (1.0 - src_a))
            / out_a;
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        {
            dst[channel] = blended.round().clamp(0.0, 255.0) as u8;
        }
    }
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    {
        dst[3] = (out_a * 255.0).round().clamp(0.0, 255.0) as u8;
    }
}

/// Draw `src` over `dst` with its top-left corner at `(off_x, off_y)`.
/// Regions falling outside `dst` are clipped.
pub(crate) fn draw_over(dst: &mut RgbaImage, src: &RgbaImage, off_x: i64, off_y: i64) {
    for (x, y, px) in src.enumerate_pixels() {
        let dx = off_x + i64::from(x);
        let dy = off_y + i64::from(y);
        if dx < 0 || dy < 0 || dx >= i64::from(dst.width()) || dy >= i64::from(dst.height()) {
            continue;
        }
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        over(dst.get_pixel_mut(dx as u32, dy as u32), *px);
    }
}
