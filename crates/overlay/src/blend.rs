//! Alpha blending primitives
//!
//! `imageproc` draws opaquely, so translucent fills go through these
//! helpers instead.

use image::{Rgb, RgbImage};

/// Blend `overlay` onto `base` with the given alpha
///
/// Alpha is clamped to [0, 1]; 0 keeps the base pixel, 1 replaces it.
pub fn blend_pixel(base: Rgb<u8>, overlay: Rgb<u8>, alpha: f32) -> Rgb<u8> {
    let alpha = alpha.clamp(0.0, 1.0);
    let mut out = [0u8; 3];
    for i in 0..3 {
        let blended = base.0[i] as f32 * (1.0 - alpha) + overlay.0[i] as f32 * alpha;
        out[i] = blended.round().clamp(0.0, 255.0) as u8;
    }
    Rgb(out)
}

/// Blend a solid color over a rectangular region
///
/// The rectangle is clamped to the image bounds; coordinates fully
/// outside the image are a no-op.
pub fn blend_rect(image: &mut RgbImage, x: i32, y: i32, width: u32, height: u32, color: Rgb<u8>, alpha: f32) {
    let x0 = x.max(0) as u32;
    let y0 = y.max(0) as u32;
    let x1 = (x.saturating_add(width as i32)).max(0) as u32;
    let y1 = (y.saturating_add(height as i32)).max(0) as u32;
    let x1 = x1.min(image.width());
    let y1 = y1.min(image.height());

    for py in y0..y1 {
        for px in x0..x1 {
            let base = *image.get_pixel(px, py);
            image.put_pixel(px, py, blend_pixel(base, color, alpha));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blend_extremes() {
        let base = Rgb([10, 20, 30]);
        let over = Rgb([200, 100, 50]);
        assert_eq!(blend_pixel(base, over, 0.0), base);
        assert_eq!(blend_pixel(base, over, 1.0), over);
    }

    #[test]
    fn test_blend_midpoint() {
        let blended = blend_pixel(Rgb([0, 0, 0]), Rgb([100, 200, 50]), 0.5);
        assert_eq!(blended, Rgb([50, 100, 25]));
    }

    #[test]
    fn test_alpha_clamped() {
        let base = Rgb([10, 20, 30]);
        let over = Rgb([200, 100, 50]);
        assert_eq!(blend_pixel(base, over, -1.0), base);
        assert_eq!(blend_pixel(base, over, 2.0), over);
    }

    #[test]
    fn test_rect_clamped_to_bounds() {
        let mut image = RgbImage::from_pixel(10, 10, Rgb([0, 0, 0]));
        blend_rect(&mut image, -5, -5, 8, 8, Rgb([255, 255, 255]), 1.0);

        assert_eq!(*image.get_pixel(0, 0), Rgb([255, 255, 255]));
        assert_eq!(*image.get_pixel(2, 2), Rgb([255, 255, 255]));
        assert_eq!(*image.get_pixel(3, 3), Rgb([0, 0, 0]));
    }

    #[test]
    fn test_rect_fully_outside_is_noop() {
        let mut image = RgbImage::from_pixel(10, 10, Rgb([7, 7, 7]));
        blend_rect(&mut image, 20, 20, 5, 5, Rgb([255, 0, 0]), 1.0);
        assert!(image.pixels().all(|p| *p == Rgb([7, 7, 7])));
    }
}
