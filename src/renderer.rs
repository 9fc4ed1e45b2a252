use log::{debug, info, warn};
use rayon::prelude::*;

use crate::{
    camera::Camera,
    common::count_cycles,
    mesh::Mesh,
    raster::{draw_triangles, RasterSettings},
    setup::{setup_triangle, CullingMode, Rejection},
    shading::{DirectionalLight, ShadingMode, ShadingSettings},
    texture::Texture,
    transform::{process_vertices, TransformShader},
    vec::Vec3,
    Pixel,
};

/// Runtime switches of the renderer.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RenderOptions {
    pub culling_mode: CullingMode,
    pub shading_mode: ShadingMode,
    pub normal_map: bool,
    pub show_bounding_boxes: bool,
    pub show_depth: bool,
    pub uniform_clear_color: bool,
}

impl Default for RenderOptions {
    fn default() -> Self {
        RenderOptions {
            culling_mode: CullingMode::Back,
            shading_mode: ShadingMode::Combined,
            normal_map: true,
            show_bounding_boxes: false,
            show_depth: false,
            uniform_clear_color: false,
        }
    }
}

/// Owns the color and depth targets and runs transform, setup and rasterization for every mesh
/// of a frame.
pub struct Renderer {
    color: Texture<Pixel>,
    depth: Texture<f32>,
    options: RenderOptions,
    pub light: DirectionalLight,
    pub clear_color: Vec3,
    pub uniform_clear_color: Vec3,
    metrics: Metrics,
    /// Unrecognized culling mode that was already warned about.
    reported_culling: Option<u32>,
}

impl Renderer {
    pub fn new(width: usize, height: usize) -> Self {
        Renderer {
            color: Texture::filled(width, height, [0, 0, 0, 0xff]),
            depth: Texture::filled(width, height, f32::INFINITY),
            options: RenderOptions::default(),
            light: DirectionalLight::default(),
            clear_color: Vec3::repeat(0.39),
            uniform_clear_color: Vec3::repeat(0.1),
            metrics: Metrics::new(),
            reported_culling: None,
        }
    }

    pub fn with_options(mut self, options: RenderOptions) -> Self {
        self.options = options;
        self
    }

    pub fn width(&self) -> usize {
        self.color.width()
    }

    pub fn height(&self) -> usize {
        self.color.height()
    }

    pub fn aspect_ratio(&self) -> f32 {
        self.width() as f32 / self.height() as f32
    }

    pub fn resize(&mut self, width: usize, height: usize) {
        self.color = Texture::filled(width, height, [0, 0, 0, 0xff]);
        self.depth = Texture::filled(width, height, f32::INFINITY);
    }

    pub fn options(&self) -> &RenderOptions {
        &self.options
    }

    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    pub fn color_buffer(&self) -> &Texture<Pixel> {
        &self.color
    }

    pub fn depth_buffer(&self) -> &Texture<f32> {
        &self.depth
    }

    /// Clear color currently in effect.
    pub fn background(&self) -> Vec3 {
        if self.options.uniform_clear_color {
            self.uniform_clear_color
        } else {
            self.clear_color
        }
    }

    /// Resets the color buffer to the background and the depth buffer to infinity.
    pub fn clear(&mut self) {
        let background = self.background();
        crate::clear_color(self.color.as_slice_mut(), background);
        self.depth.fill(f32::INFINITY);
        self.metrics.clear();
    }

    /// Clears the targets and draws every mesh in order.
    pub fn render(&mut self, meshes: &[Mesh], camera: &Camera) {
        self.clear();
        for mesh in meshes {
            self.rasterize(mesh, camera);
        }
        debug!("{}", self.metrics);
    }

    /// Draws one mesh on top of the current contents of the targets.
    pub fn rasterize(&mut self, mesh: &Mesh, camera: &Camera) {
        self.report_culling_mode();
        let options = self.options;

        let shader = TransformShader::for_camera(mesh.world, camera);
        let vertices = count_cycles! {
            #[counter(self.metrics.performance_counters.vertex_processing)]

            process_vertices(mesh.vertices(), &shader)
        };

        let size = self.color.size();
        let setups: Vec<_> = count_cycles! {
            #[counter(self.metrics.performance_counters.triangle_setup)]

            mesh.indices()
                .par_chunks_exact(3)
                .map(|tri| setup_triangle(&vertices, [tri[0], tri[1], tri[2]], options.culling_mode, size))
                .collect()
        };

        let mut triangles = Vec::with_capacity(setups.len());
        for setup in setups {
            match setup {
                Ok(tri) => triangles.push(tri),
                Err(Rejection::Frustum) => self.metrics.frustum_culled += 1,
                Err(Rejection::Culled) => self.metrics.faces_culled += 1,
                Err(Rejection::Degenerate) => self.metrics.degenerate += 1,
            }
        }
        self.metrics.triangles_drawn += triangles.len();

        let settings = RasterSettings {
            shading: ShadingSettings {
                mode: options.shading_mode,
                normal_map: options.normal_map,
                light: self.light,
            },
            show_bounding_boxes: options.show_bounding_boxes,
            show_depth: options.show_depth,
        };
        let written = count_cycles! {
            #[counter(self.metrics.performance_counters.rasterization)]

            draw_triangles(
                &mut self.color,
                &mut self.depth,
                &triangles,
                &vertices,
                &mesh.material,
                &settings,
            )
        };
        self.metrics.pixels_written += written;
    }

    pub fn set_shading_mode(&mut self, mode: ShadingMode) {
        self.options.shading_mode = mode;
        info!("shading mode: {mode}");
    }

    pub fn cycle_shading_mode(&mut self) {
        self.set_shading_mode(self.options.shading_mode.next());
    }

    pub fn set_culling_mode(&mut self, mode: CullingMode) {
        self.options.culling_mode = mode;
        if !self.report_culling_mode() {
            info!("culling mode: {mode}");
        }
    }

    /// Warns once about an unrecognized culling mode. Returns whether the current mode is
    /// unrecognized.
    fn report_culling_mode(&mut self) -> bool {
        match self.options.culling_mode {
            CullingMode::Unrecognized(index) => {
                if self.reported_culling != Some(index) {
                    warn!("culling mode {index} is not recognized, every triangle is culled");
                    self.reported_culling = Some(index);
                }
                true
            }
            _ => {
                self.reported_culling = None;
                false
            }
        }
    }

    pub fn cycle_culling_mode(&mut self) {
        self.set_culling_mode(self.options.culling_mode.next());
    }

    pub fn set_normal_map(&mut self, enabled: bool) {
        self.options.normal_map = enabled;
        info!("normal map: {}", on_off(enabled));
    }

    pub fn toggle_normal_map(&mut self) {
        self.set_normal_map(!self.options.normal_map);
    }

    pub fn set_show_bounding_boxes(&mut self, enabled: bool) {
        self.options.show_bounding_boxes = enabled;
        info!("bounding box visualization: {}", on_off(enabled));
    }

    pub fn toggle_bounding_boxes(&mut self) {
        self.set_show_bounding_boxes(!self.options.show_bounding_boxes);
    }

    pub fn set_show_depth(&mut self, enabled: bool) {
        self.options.show_depth = enabled;
        info!("depth buffer visualization: {}", on_off(enabled));
    }

    pub fn toggle_depth_buffer(&mut self) {
        self.set_show_depth(!self.options.show_depth);
    }

    pub fn set_uniform_clear_color(&mut self, enabled: bool) {
        self.options.uniform_clear_color = enabled;
        info!("uniform clear color: {}", on_off(enabled));
    }

    pub fn toggle_uniform_clear_color(&mut self) {
        self.set_uniform_clear_color(!self.options.uniform_clear_color);
    }
}

fn on_off(enabled: bool) -> &'static str {
    if enabled {
        "ON"
    } else {
        "OFF"
    }
}

#[derive(Default, Debug, Clone, Copy)]
pub struct Metrics {
    pub triangles_drawn: usize,
    pub frustum_culled: usize,
    pub faces_culled: usize,
    pub degenerate: usize,
    pub pixels_written: usize,
    #[cfg(feature = "performance-counters")]
    pub performance_counters: perf_counters::PerformanceCounters,
}

impl Metrics {
    pub fn new() -> Self {
        Metrics::default()
    }

    pub fn clear(&mut self) {
        self.triangles_drawn = 0;
        self.frustum_culled = 0;
        self.faces_culled = 0;
        self.degenerate = 0;
        self.pixels_written = 0;
        #[cfg(feature = "performance-counters")]
        self.performance_counters.clear();
    }
}

impl std::fmt::Display for Metrics {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        let &Metrics {
            triangles_drawn,
            frustum_culled,
            faces_culled,
            degenerate,
            pixels_written,
            #[cfg(feature = "performance-counters")]
            performance_counters,
        } = self;
        writeln!(f, "render metrics:")?;
        writeln!(f, "\ttriangles drawn: {triangles_drawn}")?;
        writeln!(f, "\tfrustum culled: {frustum_culled}")?;
        writeln!(f, "\tfaces culled: {faces_culled}")?;
        writeln!(f, "\tdegenerate: {degenerate}")?;
        writeln!(f, "\tpixels written: {pixels_written}")?;
        #[cfg(feature = "performance-counters")]
        writeln!(f, "{performance_counters}")?;
        Ok(())
    }
}

#[cfg(feature = "performance-counters")]
mod perf_counters {
    #[derive(Debug, Clone, Copy)]
    pub struct Counter {
        pub name: &'static str,
        pub hits: u64,
        pub cycles: u64,
    }

    impl Counter {
        pub fn new(name: &'static str) -> Self {
            Counter {
                name,
                hits: 0,
                cycles: 0,
            }
        }

        pub fn clear(&mut self) {
            self.hits = 0;
            self.cycles = 0;
        }
    }

    impl std::fmt::Display for Counter {
        fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
            let &Counter { name, hits, cycles } = self;
            if hits > 0 {
                let cy_per_hit = cycles as f64 / hits as f64;
                write!(f, "{name}: {hits} hits, {cycles} cycles, {cy_per_hit:.2} cycles/hit")
            } else {
                write!(f, "{name}: -")
            }
        }
    }

    macro_rules! register_performance_counters {
        (
            pub struct $struct_name:ident;

            $($name:ident,)*
        ) => {
            #[derive(Debug, Clone, Copy)]
            pub struct $struct_name {
                $(pub $name: Counter,)*
            }

            impl Default for $struct_name {
                fn default() -> Self {
                    $struct_name {
                        $($name: Counter::new(stringify!($name)),)*
                    }
                }
            }

            impl $struct_name {
                pub fn clear(&mut self) {
                    $(self.$name.clear();)*
                }
            }

            impl std::fmt::Display for $struct_name {
                fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
                    let &$struct_name { $($name,)* } = self;
                    writeln!(f, "performance counters:")?;
                    $(writeln!(f, "\t{}", $name)?;)*
                    Ok(())
                }
            }
        };
    }

    register_performance_counters! {
        pub struct PerformanceCounters;

        vertex_processing,
        triangle_setup,
        rasterization,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shading::Material;

    fn camera() -> Camera {
        Camera::new(Vec3::from([0., 0., -2.]), 90., 1.)
    }

    fn white_quad() -> Mesh {
        Mesh::quad(2., Material::Color(Vec3::one()))
    }

    #[test]
    fn clear_uses_selected_background() {
        let mut r = Renderer::new(4, 4);
        r.clear();
        assert_eq!(r.color_buffer()[(0, 0)], [99, 99, 99, 255]);
        r.toggle_uniform_clear_color();
        r.clear();
        assert_eq!(r.color_buffer()[(3, 3)], [25, 25, 25, 255]);
        assert!(r.depth_buffer().as_slice().iter().all(|d| *d == f32::INFINITY));
    }

    #[test]
    fn toggles_flip_and_cycle() {
        let mut r = Renderer::new(4, 4);
        let before = *r.options();
        r.toggle_normal_map();
        r.toggle_bounding_boxes();
        r.toggle_depth_buffer();
        assert_eq!(r.options().normal_map, !before.normal_map);
        assert!(r.options().show_bounding_boxes);
        assert!(r.options().show_depth);

        r.set_shading_mode(ShadingMode::ObservedArea);
        r.cycle_shading_mode();
        assert_eq!(r.options().shading_mode, ShadingMode::Diffuse);

        r.set_culling_mode(CullingMode::None);
        r.cycle_culling_mode();
        assert_eq!(r.options().culling_mode, CullingMode::Back);
    }

    #[test]
    fn quad_in_front_of_camera_is_drawn() {
        let mut r = Renderer::new(32, 32);
        r.render(&[white_quad()], &camera());
        let m = *r.metrics();
        assert_eq!(m.triangles_drawn, 2);
        assert!(m.pixels_written > 0);
        let center = r.depth_buffer()[(16, 16)];
        assert!(center > 0. && center < 1.);
    }

    #[test]
    fn unrecognized_culling_mode_culls_everything() {
        let mut r = Renderer::new(32, 32);
        r.set_culling_mode(CullingMode::from_index(42));
        r.render(&[white_quad()], &camera());
        assert_eq!(r.metrics().triangles_drawn, 0);
        assert_eq!(r.metrics().faces_culled, 2);
        assert_eq!(r.metrics().pixels_written, 0);
    }

    #[test]
    fn unrecognized_culling_mode_is_reported_once() {
        let mut r = Renderer::new(8, 8);
        r.set_culling_mode(CullingMode::from_index(7));
        assert_eq!(r.reported_culling, Some(7));
        r.render(&[white_quad(), white_quad()], &camera());
        r.render(&[white_quad()], &camera());
        assert_eq!(r.reported_culling, Some(7));

        r.set_culling_mode(CullingMode::Back);
        assert_eq!(r.reported_culling, None);

        // Options installed without the setter are reported on the first draw.
        let mut r = Renderer::new(8, 8).with_options(RenderOptions {
            culling_mode: CullingMode::from_index(9),
            ..RenderOptions::default()
        });
        assert_eq!(r.reported_culling, None);
        r.render(&[white_quad()], &camera());
        assert_eq!(r.reported_culling, Some(9));
    }

    #[test]
    fn front_face_culling_hides_facing_quad() {
        let mut r = Renderer::new(32, 32);
        r.set_culling_mode(CullingMode::Front);
        r.render(&[white_quad()], &camera());
        assert_eq!(r.metrics().faces_culled, 2);
    }

    #[test]
    fn metrics_display_lists_counters() {
        let text = Metrics::new().to_string();
        assert!(text.contains("triangles drawn: 0"));
        assert!(text.contains("pixels written: 0"));
    }
}
