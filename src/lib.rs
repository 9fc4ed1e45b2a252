pub mod camera;
pub mod common;
pub mod config;
pub mod math;
pub mod math_utils;
pub mod mesh;
pub mod obj;
pub mod raster;
pub mod renderer;
pub mod setup;
pub mod shading;
pub mod texture;
pub mod transform;
pub mod vec;

pub type Pixel = [u8; 4];

pub use camera::Camera;
pub use mesh::{Mesh, Vertex, VertexOut};
pub use renderer::{Metrics, RenderOptions, Renderer};
pub use setup::CullingMode;
pub use shading::{DirectionalLight, Material, ShadingMode};
pub use texture::{Sample, Texture, TextureRGBA};

/// Fills the whole color buffer with an opaque `color`.
pub fn clear_color(pixels: &mut [Pixel], color: vec::Vec3) {
    pixels.fill(math_utils::color_to_pixel(color));
}
