use std::{
    collections::HashMap,
    path::{Path, PathBuf},
    sync::Arc,
};

use anyhow::{bail, Context, Result};
use log::{info, warn};
use serde::Deserialize;

use crate::{
    camera,
    mesh::Mesh,
    obj::load_obj,
    renderer::{RenderOptions, Renderer},
    setup::CullingMode,
    shading::{DirectionalLight, LitMaterial, Material, ShadingMode},
    texture::TextureRGBA,
    vec::{Mat4x4, Vec3},
};

#[derive(Clone, Deserialize)]
pub struct Scene {
    pub rendering: RenderingConfig,
    pub camera: Camera,
    #[serde(default)]
    pub light: Light,
    #[serde(default)]
    pub models: Vec<Model>,
    /// Directory relative asset paths are resolved against.
    #[serde(skip)]
    pub base_dir: PathBuf,
}

impl Scene {
    pub fn load_toml(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read file {path:?}"))?;
        let mut scene = Self::from_toml(&contents)
            .with_context(|| format!("failed to parse scene {path:?}"))?;
        scene.base_dir = path.parent().map(Path::to_path_buf).unwrap_or_default();
        Ok(scene)
    }

    pub fn from_toml(contents: &str) -> Result<Self> {
        let scene: Scene = toml::from_str(contents)?;
        if scene.rendering.width == 0 || scene.rendering.height == 0 {
            bail!("rendering width and height must be positive");
        }
        if scene.rendering.near <= 0. || scene.rendering.far <= scene.rendering.near {
            bail!(
                "invalid depth range {}..{}",
                scene.rendering.near,
                scene.rendering.far
            );
        }
        Ok(scene)
    }

    pub fn aspect_ratio(&self) -> f32 {
        self.rendering.width as f32 / self.rendering.height as f32
    }

    pub fn build_camera(&self) -> camera::Camera {
        self.camera.into_camera(self.aspect_ratio(), &self.rendering)
    }

    pub fn build_renderer(&self) -> Renderer {
        let r = &self.rendering;
        let mut renderer = Renderer::new(r.width, r.height).with_options(RenderOptions {
            culling_mode: r.culling_mode,
            shading_mode: r.shading_mode,
            normal_map: r.normal_map,
            ..RenderOptions::default()
        });
        renderer.light = self.light.into_light();
        renderer.clear_color = r.clear_color;
        renderer.uniform_clear_color = r.uniform_clear_color;
        renderer
    }

    /// Loads every model with its textures. Textures shared between models are read once.
    pub fn load_meshes(&self) -> Result<Vec<Mesh>> {
        let mut textures = TextureCache::new(&self.base_dir);
        self.models
            .iter()
            .map(|model| {
                let mesh = model
                    .load(&self.base_dir, &mut textures)
                    .with_context(|| format!("failed to load model {:?}", model.name))?;
                info!(
                    "loaded model {:?}: {} vertices, {} triangles",
                    model.name,
                    mesh.vertices().len(),
                    mesh.triangle_count()
                );
                Ok(mesh)
            })
            .collect()
    }
}

#[derive(Clone, Deserialize)]
pub struct Model {
    pub name: String,
    /// OBJ file. Either this or `cuboid` must be given.
    #[serde(default)]
    pub path: Option<PathBuf>,
    /// Box extents, used when no `path` is given.
    #[serde(default, deserialize_with = "detail::deser_opt_vec3")]
    pub cuboid: Option<Vec3>,
    #[serde(default = "Vec3::zero", deserialize_with = "detail::deser_vec3")]
    pub position: Vec3,
    /// Euler angles measured in degrees
    #[serde(default = "Vec3::zero", deserialize_with = "detail::deser_vec3")]
    pub rotation: Vec3,
    #[serde(default = "Vec3::one", deserialize_with = "detail::deser_vec3")]
    pub scale: Vec3,
    /// Spin around the local `y` axis while the viewer runs.
    #[serde(default)]
    pub spin: bool,
    #[serde(default)]
    pub material: MaterialConfig,
}

impl Model {
    pub fn world(&self) -> Mat4x4 {
        Mat4x4::identity()
            .scale(self.scale)
            .rotate(self.rotation.map(f32::to_radians))
            .translate(self.position)
    }

    fn load(&self, base_dir: &Path, textures: &mut TextureCache) -> Result<Mesh> {
        let material = self.material.load(textures)?;
        let mesh = match (&self.path, self.cuboid) {
            (Some(path), _) => {
                let obj = load_obj(&base_dir.join(path), true)?;
                Mesh::new(obj.vertices, obj.indices, material)?
            }
            (None, Some(extent)) => Mesh::cuboid(extent.x, extent.y, extent.z, material),
            (None, None) => bail!("model needs either `path` or `cuboid`"),
        };
        Ok(mesh.with_world(self.world()))
    }
}

#[derive(Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum MaterialConfig {
    Color {
        #[serde(deserialize_with = "detail::deser_hex_color")]
        color: Vec3,
    },
    Lit {
        diffuse: PathBuf,
        normal: PathBuf,
        specular: PathBuf,
        gloss: PathBuf,
    },
    AlphaCutout {
        diffuse: PathBuf,
        #[serde(default = "MaterialConfig::default_clip")]
        clip: f32,
    },
}

impl Default for MaterialConfig {
    fn default() -> Self {
        MaterialConfig::Color {
            color: Vec3::one(),
        }
    }
}

impl MaterialConfig {
    fn default_clip() -> f32 {
        0.5
    }

    fn load(&self, textures: &mut TextureCache) -> Result<Material> {
        Ok(match self {
            MaterialConfig::Color { color } => Material::Color(*color),
            MaterialConfig::Lit {
                diffuse,
                normal,
                specular,
                gloss,
            } => Material::Lit(LitMaterial {
                diffuse: textures.get(diffuse)?,
                normal: textures.get(normal)?,
                specular: textures.get(specular)?,
                gloss: textures.get(gloss)?,
            }),
            MaterialConfig::AlphaCutout { diffuse, clip } => Material::AlphaCutout {
                diffuse: textures.get(diffuse)?,
                clip: *clip,
            },
        })
    }
}

struct TextureCache<'a> {
    base_dir: &'a Path,
    loaded: HashMap<PathBuf, Arc<TextureRGBA>>,
}

impl<'a> TextureCache<'a> {
    fn new(base_dir: &'a Path) -> Self {
        TextureCache {
            base_dir,
            loaded: HashMap::new(),
        }
    }

    fn get(&mut self, path: &Path) -> Result<Arc<TextureRGBA>> {
        let full = self.base_dir.join(path);
        if let Some(tex) = self.loaded.get(&full) {
            return Ok(Arc::clone(tex));
        }
        let tex = Arc::new(TextureRGBA::load(&full)?);
        self.loaded.insert(full, Arc::clone(&tex));
        Ok(tex)
    }
}

#[derive(Clone, Copy, Deserialize)]
pub struct Camera {
    #[serde(deserialize_with = "detail::deser_vec3")]
    pub position: Vec3,
    /// Measured in degrees
    #[serde(default)]
    pub pitch: f32,
    /// Measured in degrees
    #[serde(default)]
    pub yaw: f32,
    #[serde(default = "Camera::default_fovy")]
    pub fovy: f32,
    #[serde(default = "Camera::default_sensitivity")]
    pub sensitivity: f32,
    #[serde(default = "Camera::default_speed")]
    pub speed: f32,
}

impl Camera {
    pub fn into_camera(self, aspect_ratio: f32, rendering: &RenderingConfig) -> camera::Camera {
        let pitch = self.pitch.clamp(-89., 89.);
        if pitch != self.pitch {
            warn!("camera pitch {} clamped to {pitch}", self.pitch);
        }
        camera::Camera {
            origin: self.position,
            pitch,
            yaw: self.yaw,
            fovy: self.fovy,
            ratio: aspect_ratio,
            near: rendering.near,
            far: rendering.far,
            speed: self.speed,
            sensitivity: self.sensitivity,
        }
    }

    fn default_fovy() -> f32 {
        45.
    }

    fn default_sensitivity() -> f32 {
        0.25
    }

    fn default_speed() -> f32 {
        10.
    }
}

#[derive(Clone, Copy, Deserialize)]
pub struct Light {
    #[serde(deserialize_with = "detail::deser_vec3")]
    pub direction: Vec3,
    pub intensity: f32,
}

impl Default for Light {
    fn default() -> Self {
        let DirectionalLight {
            direction,
            intensity,
        } = DirectionalLight::default();
        Light {
            direction,
            intensity,
        }
    }
}

impl Light {
    pub fn into_light(self) -> DirectionalLight {
        if self.direction.mag_sq() == 0. {
            warn!("light direction is zero, using the default light");
            return DirectionalLight::default();
        }
        DirectionalLight::new(self.direction, self.intensity)
    }
}

#[derive(Clone, Copy, Deserialize)]
pub struct RenderingConfig {
    pub width: usize,
    pub height: usize,
    #[serde(default = "RenderingConfig::near_default")]
    pub near: f32,
    #[serde(default = "RenderingConfig::far_default")]
    pub far: f32,
    #[serde(default, rename = "cull-mode")]
    pub culling_mode: CullingMode,
    #[serde(default, rename = "shading-mode")]
    pub shading_mode: ShadingMode,
    #[serde(default = "RenderingConfig::normal_map_default", rename = "normal-map")]
    pub normal_map: bool,
    #[serde(
        default = "RenderingConfig::clear_color_default",
        rename = "clear-color",
        deserialize_with = "detail::deser_hex_color"
    )]
    pub clear_color: Vec3,
    #[serde(
        default = "RenderingConfig::uniform_clear_color_default",
        rename = "uniform-clear-color",
        deserialize_with = "detail::deser_hex_color"
    )]
    pub uniform_clear_color: Vec3,
}

impl RenderingConfig {
    pub fn near_default() -> f32 {
        0.1
    }

    pub fn far_default() -> f32 {
        100.
    }

    pub fn normal_map_default() -> bool {
        true
    }

    pub fn clear_color_default() -> Vec3 {
        Vec3::repeat(0.39)
    }

    pub fn uniform_clear_color_default() -> Vec3 {
        Vec3::repeat(0.1)
    }
}

mod detail {
    use serde::de::{Deserialize, Deserializer, Error};

    use crate::{math_utils::rgb_hex, vec::Vec3};

    pub fn deser_vec3<'de, D>(deserializer: D) -> Result<Vec3, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(Vec3::from(<[f32; 3] as Deserialize>::deserialize(deserializer)?))
    }

    pub fn deser_opt_vec3<'de, D>(deserializer: D) -> Result<Option<Vec3>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(<Option<[f32; 3]> as Deserialize>::deserialize(deserializer)?.map(Vec3::from))
    }

    /// `"#rrggbb"` into a `[0, 1]` color.
    pub fn deser_hex_color<'de, D>(deserializer: D) -> Result<Vec3, D::Error>
    where
        D: Deserializer<'de>,
    {
        let hex_color: String = Deserialize::deserialize(deserializer)?;
        let digits = hex_color
            .strip_prefix('#')
            .filter(|digits| digits.len() == 6)
            .ok_or_else(|| Error::custom(format!("expected #rrggbb color, got {hex_color:?}")))?;
        let rgb = u32::from_str_radix(digits, 16).map_err(Error::custom)?;
        Ok(rgb_hex(rgb))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SCENE: &str = r##"
        [rendering]
        width = 640
        height = 480
        cull-mode = "front-face"
        shading-mode = "observed-area"
        clear-color = "#ff8000"

        [camera]
        position = [0.0, 0.0, -50.0]
        pitch = 120.0
        fovy = 45.0

        [light]
        direction = [0.0, -2.0, 0.0]
        intensity = 3.5

        [[models]]
        name = "box"
        cuboid = [1.0, 2.0, 3.0]
        position = [0.0, 0.0, 10.0]
        rotation = [0.0, 90.0, 0.0]

        [models.material]
        kind = "color"
        color = "#00ff00"
    "##;

    #[test]
    fn parses_full_scene() {
        let scene = Scene::from_toml(SCENE).unwrap();
        assert_eq!(scene.rendering.culling_mode, CullingMode::Front);
        assert_eq!(scene.rendering.shading_mode, ShadingMode::ObservedArea);
        assert!(scene.rendering.normal_map);
        assert_eq!(scene.rendering.near, 0.1);
        assert_eq!(scene.rendering.clear_color.x, 1.);
        assert_eq!(scene.rendering.uniform_clear_color, Vec3::repeat(0.1));
        assert_eq!(scene.models.len(), 1);
        assert!(matches!(scene.models[0].material, MaterialConfig::Color { .. }));
    }

    #[test]
    fn builds_camera_renderer_and_meshes() {
        let scene = Scene::from_toml(SCENE).unwrap();

        let camera = scene.build_camera();
        assert_eq!(camera.pitch, 89.);
        assert!((camera.ratio - 640. / 480.).abs() < 1e-6);

        let renderer = scene.build_renderer();
        assert_eq!(renderer.width(), 640);
        assert_eq!(renderer.options().culling_mode, CullingMode::Front);
        assert_eq!(renderer.light.direction.to_array(), [0., -1., 0.]);
        assert_eq!(renderer.light.intensity, 3.5);

        let meshes = scene.load_meshes().unwrap();
        assert_eq!(meshes[0].triangle_count(), 12);
        let center = meshes[0].world.transform_point(Vec3::zero());
        assert_eq!(center.to_array(), [0., 0., 10.]);
    }

    #[test]
    fn model_without_geometry_is_an_error() {
        let src = SCENE.replace("cuboid = [1.0, 2.0, 3.0]", "");
        let scene = Scene::from_toml(&src).unwrap();
        let err = scene.load_meshes().unwrap_err();
        assert!(format!("{err:#}").contains("`path` or `cuboid`"));
    }

    #[test]
    fn rejects_bad_colors_and_sizes() {
        assert!(Scene::from_toml(&SCENE.replace("#ff8000", "ff8000")).is_err());
        assert!(Scene::from_toml(&SCENE.replace("width = 640", "width = 0")).is_err());
    }

    #[test]
    fn missing_light_uses_default() {
        let start = SCENE.find("[light]").unwrap();
        let end = SCENE.find("[[models]]").unwrap();
        let src = format!("{}{}", &SCENE[..start], &SCENE[end..]);
        let scene = Scene::from_toml(&src).unwrap();
        assert_eq!(scene.light.intensity, 7.);
    }
}
