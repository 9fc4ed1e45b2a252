use std::fmt;

use serde::Deserialize;

use crate::{
    common::{is_inside_frustum, ndc_to_screen, orient_2d},
    math::{BBox, Size},
    mesh::VertexOut,
    vec::Vec2,
};

/// Parallelogram areas below this are treated as degenerate.
const MIN_AREA: f32 = 1e-6;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub enum CullingMode {
    #[serde(rename = "back-face")]
    #[default]
    Back,
    #[serde(rename = "front-face")]
    Front,
    #[serde(rename = "disabled")]
    None,
    /// Raw mode index that does not name a mode. Everything gets culled.
    #[serde(skip)]
    Unrecognized(u32),
}

impl CullingMode {
    pub fn enumerate() -> impl Iterator<Item = Self> {
        [CullingMode::Back, CullingMode::Front, CullingMode::None].into_iter()
    }

    pub fn from_index(index: u32) -> Self {
        match index {
            0 => CullingMode::Back,
            1 => CullingMode::Front,
            2 => CullingMode::None,
            other => CullingMode::Unrecognized(other),
        }
    }

    pub fn next(self) -> Self {
        match self {
            CullingMode::Back => CullingMode::Front,
            CullingMode::Front => CullingMode::None,
            CullingMode::None | CullingMode::Unrecognized(_) => CullingMode::Back,
        }
    }

    /// Whether a triangle whose screen space parallelogram area has the given sign is discarded.
    pub fn culls(self, sign: f32) -> bool {
        match self {
            CullingMode::None => false,
            CullingMode::Back => sign <= 0.,
            CullingMode::Front => sign >= 0.,
            CullingMode::Unrecognized(_) => true,
        }
    }
}

impl fmt::Display for CullingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Reason a triangle did not reach the pixel loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    Frustum,
    Culled,
    Degenerate,
}

/// A triangle ready for rasterization.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Triangle {
    /// Positions in the vertex buffer, in index order.
    pub vertices: [usize; 3],
    pub screen: [Vec2; 3],
    /// NDC depth of each vertex.
    pub z: [f32; 3],
    /// Clip space `w` (view depth) of each vertex.
    pub w: [f32; 3],
    /// Signed parallelogram area, same sign as the winding.
    pub area: f32,
    pub bbox: BBox<i32>,
}

/// Projects the triangle `indices` to the screen and runs frustum rejection, culling and the
/// degenerate check, in that order.
pub fn setup_triangle(
    vertices: &[VertexOut],
    indices: [u32; 3],
    culling: CullingMode,
    size: Size<usize>,
) -> Result<Triangle, Rejection> {
    let idx = indices.map(|i| i as usize);
    let clip = idx.map(|i| vertices[i].position);

    if !is_inside_frustum(clip[0], clip[1], clip[2]) {
        return Err(Rejection::Frustum);
    }

    let (width, height) = (size.width as f32, size.height as f32);
    let screen = clip.map(|p| ndc_to_screen(p.xy() / p.w, width, height));

    let area = orient_2d(screen[0], screen[1], screen[2]);
    if culling.culls(area) {
        return Err(Rejection::Culled);
    }
    if area.abs() < MIN_AREA {
        return Err(Rejection::Degenerate);
    }

    Ok(Triangle {
        vertices: idx,
        screen,
        z: clip.map(|p| p.z / p.w),
        w: clip.map(|p| p.w),
        area,
        bbox: BBox::from_points(&screen, size),
    })
}
