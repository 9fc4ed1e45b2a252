use std::{
    ops::{Index, IndexMut},
    path::Path,
};

use anyhow::{ensure, Context, Result};

use crate::{
    math::Size,
    math_utils::{color_to_pixel, pixel_to_color},
    vec::{Vec2, Vec3},
    Pixel,
};

/// Row-major 2D buffer. Used for sampled images as well as for the color and depth targets.
#[derive(Clone, Debug, PartialEq)]
pub struct Texture<T> {
    width: usize,
    height: usize,
    data: Box<[T]>,
}

pub type TextureRGBA = Texture<Pixel>;

impl<T> Texture<T> {
    pub fn from_vec(width: usize, height: usize, vec: Vec<T>) -> Self {
        assert_eq!(width * height, vec.len());
        Texture {
            width,
            height,
            data: vec.into_boxed_slice(),
        }
    }

    pub fn filled(width: usize, height: usize, value: T) -> Self
    where
        T: Clone,
    {
        Texture::from_vec(width, height, vec![value; width * height])
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn size(&self) -> Size<usize> {
        Size::new(self.width, self.height)
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn fill(&mut self, value: T)
    where
        T: Clone,
    {
        self.data.fill(value);
    }

    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    pub fn as_slice_mut(&mut self) -> &mut [T] {
        &mut self.data
    }
}

impl<T> Index<(usize, usize)> for Texture<T> {
    type Output = T;

    fn index(&self, (x, y): (usize, usize)) -> &T {
        assert!(x < self.width && y < self.height, "out of bounds");
        &self.data[y * self.width + x]
    }
}

impl<T> IndexMut<(usize, usize)> for Texture<T> {
    fn index_mut(&mut self, (x, y): (usize, usize)) -> &mut T {
        assert!(x < self.width && y < self.height, "out of bounds");
        &mut self.data[y * self.width + x]
    }
}

/// Color lookup by texture coordinates.
pub trait Sample {
    fn sample(&self, uv: Vec2) -> Vec3;

    fn sample_alpha(&self, _uv: Vec2) -> f32 {
        1.
    }
}

impl Texture<Pixel> {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let img = image::open(path)
            .with_context(|| format!("failed to load texture {path:?}"))?
            .to_rgba8();
        ensure!(
            img.width() > 0 && img.height() > 0,
            "texture {path:?} has no texels"
        );
        Ok(Self::from_image(&img))
    }

    pub fn from_image(img: &image::RgbaImage) -> Self {
        let pixels = img.pixels().map(|px| px.0).collect();
        Texture::from_vec(img.width() as usize, img.height() as usize, pixels)
    }

    /// Single texel texture, every lookup returns `color`.
    pub fn solid(color: Vec3) -> Self {
        Texture::from_vec(1, 1, vec![color_to_pixel(color)])
    }

    /// Texel addressed by `uv` with clamped addressing: coordinates outside `[0, 1]` are clamped
    /// to the border instead of repeating. An empty texture reads as transparent black.
    #[inline]
    fn texel_clamped(&self, uv: Vec2) -> Pixel {
        if self.is_empty() {
            return [0; 4];
        }

        let u = uv.x.clamp(0., 1.);
        let v = uv.y.clamp(0., 1.);

        let x = ((u * self.width as f32) as usize).min(self.width - 1);
        let y = ((v * self.height as f32) as usize).min(self.height - 1);

        self[(x, y)]
    }

    pub fn to_image(&self) -> Option<image::RgbaImage> {
        let raw = self.data.iter().flatten().copied().collect();
        image::RgbaImage::from_raw(self.width as u32, self.height as u32, raw)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let img = self
            .to_image()
            .context("color buffer does not match its dimensions")?;
        img.save(path)
            .with_context(|| format!("failed to write image {path:?}"))
    }
}

impl Sample for Texture<Pixel> {
    #[inline]
    fn sample(&self, uv: Vec2) -> Vec3 {
        pixel_to_color(self.texel_clamped(uv))
    }

    #[inline]
    fn sample_alpha(&self, uv: Vec2) -> f32 {
        self.texel_clamped(uv)[3] as f32 / 255.
    }
}
