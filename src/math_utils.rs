use std::ops::Range;

use crate::{vec::Vec3, Pixel};

pub fn remap(val: f32, range: Range<f32>, dest: Range<f32>) -> f32 {
    dest.start + (dest.end - dest.start) * (val - range.start) / (range.end - range.start)
}

/// Scales every channel by the same factor so the brightest one is at most `1.0`. Unlike a
/// per-channel clamp this keeps the hue of overexposed colors.
pub fn max_to_one(c: Vec3) -> Vec3 {
    let max = c.max_element();
    if max > 1. {
        c / max
    } else {
        c
    }
}

pub fn rgb_hex(c: u32) -> Vec3 {
    let [_, r, g, b] = c.to_be_bytes();
    Vec3::from([r as f32, g as f32, b as f32]) / 255.
}

/// Packs a linear `[0, 1]` color into an opaque RGBA8 pixel. Out of range channels saturate.
pub fn color_to_pixel(c: Vec3) -> Pixel {
    let [r, g, b] = c.to_array().map(|chan| (chan.clamp(0., 1.) * 255.) as u8);
    [r, g, b, 0xff]
}

pub fn pixel_to_color(p: Pixel) -> Vec3 {
    let [r, g, b, _] = p;
    Vec3::from([r as f32, g as f32, b as f32]) / 255.
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn max_to_one_preserves_hue() {
        let c = max_to_one(Vec3::from([1.5, 0.5, 0.25]));
        let [r, g, b] = c.to_array();
        assert!((r - 1.0).abs() < 1e-6);
        assert!((g - 1. / 3.).abs() < 1e-4);
        assert!((b - 1. / 6.).abs() < 1e-4);
    }

    #[test]
    fn max_to_one_leaves_in_range_colors() {
        let c = Vec3::from([0.2, 1.0, 0.7]);
        assert_eq!(max_to_one(c), c);
    }

    #[test]
    fn remap_is_linear() {
        assert_eq!(remap(0.9925, 0.9925..1.0, 0.0..1.0), 0.0);
        assert!((remap(0.99625, 0.9925..1.0, 0.0..1.0) - 0.5).abs() < 1e-3);
    }

    #[test]
    fn hex_colors_unpack_to_unit_range() {
        let c = rgb_hex(0x00_ff_80_00);
        assert_eq!(c.x, 1.0);
        assert!((c.y - 128. / 255.).abs() < 1e-6);
        assert_eq!(c.z, 0.0);
        assert_eq!(color_to_pixel(Vec3::from([1.0, 0.0, 2.0])), [255, 0, 255, 255]);
    }
}
