use std::{f32::consts::PI, fmt, sync::Arc};

use serde::Deserialize;

use crate::{
    texture::{Sample, TextureRGBA},
    vec::{Vec2, Vec3},
};

const SHININESS: f32 = 25.;
const AMBIENT: f32 = 0.025;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DirectionalLight {
    /// Direction the light travels in. Kept normalized.
    pub direction: Vec3,
    pub intensity: f32,
}

impl DirectionalLight {
    pub fn new(direction: Vec3, intensity: f32) -> Self {
        DirectionalLight {
            direction: direction.normalized(),
            intensity,
        }
    }
}

impl Default for DirectionalLight {
    fn default() -> Self {
        DirectionalLight::new(Vec3::from([0.577, -0.577, 0.577]), 7.)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub enum ShadingMode {
    #[serde(rename = "observed-area")]
    ObservedArea,
    #[serde(rename = "diffuse")]
    Diffuse,
    #[serde(rename = "specular")]
    Specular,
    #[serde(rename = "combined")]
    #[default]
    Combined,
}

impl ShadingMode {
    pub fn enumerate() -> impl Iterator<Item = Self> {
        [
            ShadingMode::ObservedArea,
            ShadingMode::Diffuse,
            ShadingMode::Specular,
            ShadingMode::Combined,
        ]
        .into_iter()
    }

    pub fn next(self) -> Self {
        match self {
            ShadingMode::ObservedArea => ShadingMode::Diffuse,
            ShadingMode::Diffuse => ShadingMode::Specular,
            ShadingMode::Specular => ShadingMode::Combined,
            ShadingMode::Combined => ShadingMode::ObservedArea,
        }
    }
}

impl fmt::Display for ShadingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Interpolated attributes of a covered pixel. Directions are unit length.
#[derive(Clone, Copy, Debug)]
pub struct Fragment {
    pub uv: Vec2,
    pub normal: Vec3,
    pub tangent: Vec3,
    pub view_direction: Vec3,
}

/// Per-frame state every material reads from.
#[derive(Clone, Copy, Debug)]
pub struct ShadingSettings {
    pub mode: ShadingMode,
    pub normal_map: bool,
    pub light: DirectionalLight,
}

#[derive(Clone, Debug)]
pub struct LitMaterial {
    pub diffuse: Arc<TextureRGBA>,
    pub normal: Arc<TextureRGBA>,
    pub specular: Arc<TextureRGBA>,
    pub gloss: Arc<TextureRGBA>,
}

#[derive(Clone, Debug)]
pub enum Material {
    /// Untextured, diffuse only.
    Color(Vec3),
    /// Lambert diffuse plus Phong specular, with optional tangent space normal mapping.
    Lit(LitMaterial),
    /// Unlit texture. Texels with alpha below `clip` are discarded.
    AlphaCutout { diffuse: Arc<TextureRGBA>, clip: f32 },
}

impl Material {
    /// Color of a fragment, or `None` if it is discarded.
    pub fn shade(&self, frag: &Fragment, settings: &ShadingSettings) -> Option<Vec3> {
        let light = settings.light;
        match self {
            Material::Color(color) => {
                let observed = observed_area(frag.normal, light.direction);
                let diffuse = lambert(*color, light.intensity);
                Some(combine(settings.mode, observed, diffuse, Vec3::zero()))
            }
            Material::Lit(mat) => Some(mat.shade(frag, settings)),
            Material::AlphaCutout { diffuse, clip } => {
                (diffuse.sample_alpha(frag.uv) >= *clip).then(|| diffuse.sample(frag.uv))
            }
        }
    }
}

impl LitMaterial {
    fn shade(&self, frag: &Fragment, settings: &ShadingSettings) -> Vec3 {
        let light = settings.light;
        let normal = if settings.normal_map {
            let sampled = self.normal.sample(frag.uv);
            tangent_to_world(sampled * 2. - Vec3::one(), frag.normal, frag.tangent)
        } else {
            frag.normal
        };

        let observed = observed_area(normal, light.direction);
        let diffuse = lambert(self.diffuse.sample(frag.uv), light.intensity);
        let exponent = self.gloss.sample(frag.uv).x * SHININESS;
        let specular = phong(
            self.specular.sample(frag.uv),
            exponent,
            light.direction,
            frag.view_direction,
            normal,
        );

        combine(settings.mode, observed, diffuse, specular)
    }
}

fn combine(mode: ShadingMode, observed: f32, diffuse: Vec3, specular: Vec3) -> Vec3 {
    match mode {
        ShadingMode::ObservedArea => Vec3::repeat(observed),
        ShadingMode::Diffuse => diffuse * observed,
        ShadingMode::Specular => specular * observed,
        ShadingMode::Combined => (diffuse + specular) * observed + Vec3::repeat(AMBIENT),
    }
}

/// Cosine law term, the light direction is reversed since it points away from the source.
pub fn observed_area(normal: Vec3, light_direction: Vec3) -> f32 {
    normal.dot(-light_direction).max(0.)
}

pub fn lambert(diffuse: Vec3, intensity: f32) -> Vec3 {
    diffuse * (intensity / PI)
}

pub fn phong(
    specular: Vec3,
    exponent: f32,
    light_direction: Vec3,
    view_direction: Vec3,
    normal: Vec3,
) -> Vec3 {
    let reflected = light_direction.reflect(normal);
    let cos_alpha = reflected.dot(-view_direction).max(0.);
    specular * cos_alpha.powf(exponent)
}

/// Maps a tangent space direction into the frame spanned by `tangent`, the bitangent and
/// `normal`.
pub fn tangent_to_world(v: Vec3, normal: Vec3, tangent: Vec3) -> Vec3 {
    let bitangent = normal.cross(tangent).normalized();
    tangent * v.x + bitangent * v.y + normal * v.z
}
