use std::ops::Range;

use rayon::prelude::*;

use crate::{
    common::orient_2d,
    math_utils::{color_to_pixel, max_to_one, remap},
    mesh::VertexOut,
    setup::Triangle,
    shading::{Fragment, Material, ShadingSettings},
    texture::Texture,
    vec::{Mat, Vec2, Vec3},
    Pixel,
};

/// Depth range stretched over the full gray ramp by the depth visualization.
const DEPTH_VIEW_RANGE: Range<f32> = 0.9925..1.0;

#[derive(Clone, Copy, Debug)]
pub struct RasterSettings {
    pub shading: ShadingSettings,
    /// Fill whole bounding boxes white, skipping coverage and depth tests.
    pub show_bounding_boxes: bool,
    /// Write remapped depth as gray instead of shading.
    pub show_depth: bool,
}

/// A horizontal slice of the render target. Bands never overlap, so each one can be rasterized
/// on its own thread.
pub struct Band<'a> {
    rows: Range<i32>,
    width: usize,
    color: &'a mut [Pixel],
    depth: &'a mut [f32],
}

impl<'a> Band<'a> {
    pub fn new(rows: Range<i32>, width: usize, color: &'a mut [Pixel], depth: &'a mut [f32]) -> Self {
        debug_assert_eq!(color.len(), depth.len());
        debug_assert_eq!(color.len(), rows.len() * width);
        Band {
            rows,
            width,
            color,
            depth,
        }
    }

    #[inline]
    fn offset(&self, x: i32, y: i32) -> usize {
        (y - self.rows.start) as usize * self.width + x as usize
    }
}

/// Barycentric weights of `p`, in vertex order. They sum to one; all three are non-negative
/// exactly when `p` is inside the triangle.
#[inline]
pub fn barycentric(tri: &Triangle, p: Vec2) -> [f32; 3] {
    let [s0, s1, s2] = tri.screen;
    [
        orient_2d(s1, s2, p) / tri.area,
        orient_2d(s2, s0, p) / tri.area,
        orient_2d(s0, s1, p) / tri.area,
    ]
}

/// Harmonic interpolation of per-vertex values, `1 / sum(weight_i / value_i)`.
#[inline]
pub fn interpolate_reciprocal(values: [f32; 3], weights: [f32; 3]) -> f32 {
    1. / (weights[0] / values[0] + weights[1] / values[1] + weights[2] / values[2])
}

/// Perspective correct interpolation of a vertex attribute given the per-vertex clip `w` and
/// the already interpolated `w` of the pixel.
#[inline]
pub fn interpolate_perspective<const N: usize>(
    attrs: [Mat<f32, N, 1>; 3],
    weights: [f32; 3],
    w: [f32; 3],
    pixel_w: f32,
) -> Mat<f32, N, 1> {
    (attrs[0] * (weights[0] / w[0]) + attrs[1] * (weights[1] / w[1]) + attrs[2] * (weights[2] / w[2]))
        * pixel_w
}

/// Rasterizes the part of `tri` that falls into `band`. Returns the number of pixels written.
pub fn draw_triangle(
    band: &mut Band,
    tri: &Triangle,
    vertices: &[VertexOut],
    material: &Material,
    settings: &RasterSettings,
) -> usize {
    let Some(bbox) = tri.bbox.clip_rows(band.rows.clone()) else {
        return 0;
    };

    if settings.show_bounding_boxes {
        let white = color_to_pixel(Vec3::one());
        for py in bbox.min_y..=bbox.max_y {
            let start = band.offset(bbox.min_x, py);
            band.color[start..start + bbox.width() as usize].fill(white);
        }
        return (bbox.width() * bbox.height()) as usize;
    }

    let [v0, v1, v2] = tri.vertices.map(|i| &vertices[i]);
    let mut written = 0;

    for py in bbox.min_y..=bbox.max_y {
        for px in bbox.min_x..=bbox.max_x {
            let p = Vec2::from([px as f32, py as f32]);
            let weights = barycentric(tri, p);
            if weights.iter().any(|&wi| wi < 0.) {
                continue;
            }

            let z = interpolate_reciprocal(tri.z, weights);
            if !(0.0..=1.0).contains(&z) {
                continue;
            }

            let offset = band.offset(px, py);
            if !(z < band.depth[offset]) {
                continue;
            }

            let color = if settings.show_depth {
                Vec3::repeat(remap(z, DEPTH_VIEW_RANGE, 0.0..1.0))
            } else {
                let pixel_w = interpolate_reciprocal(tri.w, weights);
                let lerp3 = |a: Vec3, b: Vec3, c: Vec3| {
                    interpolate_perspective([a, b, c], weights, tri.w, pixel_w).normalized()
                };
                let frag = Fragment {
                    uv: interpolate_perspective([v0.uv, v1.uv, v2.uv], weights, tri.w, pixel_w),
                    normal: lerp3(v0.normal, v1.normal, v2.normal),
                    tangent: lerp3(v0.tangent, v1.tangent, v2.tangent),
                    view_direction: lerp3(
                        v0.view_direction,
                        v1.view_direction,
                        v2.view_direction,
                    ),
                };
                match material.shade(&frag, &settings.shading) {
                    Some(color) => color,
                    None => continue,
                }
            };

            band.depth[offset] = z;
            band.color[offset] = color_to_pixel(max_to_one(color));
            written += 1;
        }
    }

    written
}

/// Rasterizes `triangles` into the color and depth targets. The frame is split into row bands
/// processed in parallel; inside a band triangles are drawn in order, so the result is the same
/// as drawing them one after the other. Returns the number of pixels written.
pub fn draw_triangles(
    color: &mut Texture<Pixel>,
    depth: &mut Texture<f32>,
    triangles: &[Triangle],
    vertices: &[VertexOut],
    material: &Material,
    settings: &RasterSettings,
) -> usize {
    assert_eq!(color.size(), depth.size(), "color and depth targets differ in size");
    let width = color.width();
    let height = color.height();
    if width == 0 || height == 0 || triangles.is_empty() {
        return 0;
    }

    let rows_per_band = band_rows(height);
    let chunk = rows_per_band * width;

    color
        .as_slice_mut()
        .par_chunks_mut(chunk)
        .zip(depth.as_slice_mut().par_chunks_mut(chunk))
        .enumerate()
        .map(|(i, (color_rows, depth_rows))| {
            let start = (i * rows_per_band) as i32;
            let end = start + (color_rows.len() / width) as i32;
            let mut band = Band::new(start..end, width, color_rows, depth_rows);
            triangles
                .iter()
                .map(|tri| draw_triangle(&mut band, tri, vertices, material, settings))
                .sum::<usize>()
        })
        .sum()
}

fn band_rows(height: usize) -> usize {
    let bands = rayon::current_num_threads() * 4;
    height.div_ceil(bands).max(1)
}
