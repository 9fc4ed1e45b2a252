use std::{
    f32::consts::FRAC_PI_4,
    path::PathBuf,
    time::Instant,
};

use anyhow::{bail, Context, Result};
use log::{error, info};
use pixels::{Pixels, SurfaceTexture};
use winit::{
    dpi::LogicalSize,
    event::{
        DeviceEvent, ElementState, Event, KeyboardInput, MouseButton, VirtualKeyCode, WindowEvent,
    },
    event_loop::EventLoop,
    window::WindowBuilder,
};

use rasterization::{
    config::Scene,
    vec::Vec3,
    Camera, Mesh, Renderer,
};

const DEFAULT_SCENE: &str = r##"
[rendering]
width = 640
height = 480

[camera]
position = [0.0, 0.0, -6.0]
fovy = 60.0

[[models]]
name = "box"
cuboid = [2.0, 2.0, 2.0]
rotation = [30.0, 45.0, 0.0]
spin = true

[models.material]
kind = "color"
color = "#d9a441"
"##;

struct Args {
    scene: Option<PathBuf>,
    output: Option<PathBuf>,
}

impl Args {
    fn parse() -> Result<Self> {
        let mut args = Args {
            scene: None,
            output: None,
        };
        let mut it = std::env::args().skip(1);
        while let Some(arg) = it.next() {
            match arg.as_str() {
                "-o" | "--output" => {
                    let path = it.next().context("--output expects a file path")?;
                    args.output = Some(path.into());
                }
                flag if flag.starts_with('-') => bail!("unknown flag {flag:?}"),
                _ if args.scene.is_none() => args.scene = Some(PathBuf::from(&arg)),
                _ => bail!("unexpected argument {arg:?}"),
            }
        }
        Ok(args)
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse()?;
    let scene = match &args.scene {
        Some(path) => Scene::load_toml(path)?,
        None => {
            info!("no scene given, using the built-in one");
            Scene::from_toml(DEFAULT_SCENE)?
        }
    };

    let renderer = scene.build_renderer();
    let camera = scene.build_camera();
    let meshes = scene.load_meshes()?;
    let spinning = scene.models.iter().map(|m| m.spin).collect();

    match args.output {
        Some(output) => render_to_file(renderer, &camera, &meshes, &output),
        None => run_viewer(Viewer {
            renderer,
            camera,
            meshes,
            spinning,
            rotating: true,
            axis: Vec3::zero(),
            looking: false,
        }),
    }
}

fn render_to_file(
    mut renderer: Renderer,
    camera: &Camera,
    meshes: &[Mesh],
    output: &std::path::Path,
) -> Result<()> {
    let start = Instant::now();
    renderer.render(meshes, camera);
    info!("rendered frame in {:?}", start.elapsed());
    info!("{}", renderer.metrics());
    renderer.color_buffer().save(output)?;
    info!("wrote {output:?}");
    Ok(())
}

struct Viewer {
    renderer: Renderer,
    camera: Camera,
    meshes: Vec<Mesh>,
    spinning: Vec<bool>,
    rotating: bool,
    /// Movement input: `x` right, `y` up, `z` forward.
    axis: Vec3,
    looking: bool,
}

impl Viewer {
    fn update(&mut self, dt: f32) {
        if self.rotating {
            for (mesh, &spin) in self.meshes.iter_mut().zip(&self.spinning) {
                if spin {
                    mesh.rotate_y(dt * FRAC_PI_4);
                }
            }
        }
        if self.axis != Vec3::zero() {
            self.camera.move_delta(self.axis * dt);
        }
        self.renderer.render(&self.meshes, &self.camera);
    }

    fn draw(&self, frame: &mut [u8]) {
        let colors = self.renderer.color_buffer().as_slice();
        for (dst, src) in frame.chunks_exact_mut(4).zip(colors) {
            dst.copy_from_slice(src);
        }
    }

    fn toggle_rotation(&mut self) {
        self.rotating = !self.rotating;
        info!("rotation: {}", if self.rotating { "ON" } else { "OFF" });
    }

    fn key(&mut self, state: ElementState, key: VirtualKeyCode) {
        let value = match state {
            ElementState::Pressed => 1.,
            ElementState::Released => 0.,
        };
        match (state, key) {
            (ElementState::Pressed, VirtualKeyCode::F2) => self.toggle_rotation(),
            (ElementState::Pressed, VirtualKeyCode::F5) => self.renderer.cycle_shading_mode(),
            (ElementState::Pressed, VirtualKeyCode::F6) => self.renderer.toggle_normal_map(),
            (ElementState::Pressed, VirtualKeyCode::F7) => self.renderer.toggle_depth_buffer(),
            (ElementState::Pressed, VirtualKeyCode::F8) => self.renderer.toggle_bounding_boxes(),
            (ElementState::Pressed, VirtualKeyCode::F9) => self.renderer.cycle_culling_mode(),
            (ElementState::Pressed, VirtualKeyCode::F10) => {
                self.renderer.toggle_uniform_clear_color()
            }
            (_, VirtualKeyCode::W | VirtualKeyCode::Up) => self.axis.z = value,
            (_, VirtualKeyCode::S | VirtualKeyCode::Down) => self.axis.z = -value,
            (_, VirtualKeyCode::D | VirtualKeyCode::Right) => self.axis.x = value,
            (_, VirtualKeyCode::A | VirtualKeyCode::Left) => self.axis.x = -value,
            (_, VirtualKeyCode::E) => self.axis.y = value,
            (_, VirtualKeyCode::Q) => self.axis.y = -value,
            _ => (),
        }
    }
}

fn run_viewer(mut viewer: Viewer) -> Result<()> {
    let width = viewer.renderer.width() as u32;
    let height = viewer.renderer.height() as u32;

    let event_loop = EventLoop::new();
    let window = WindowBuilder::new()
        .with_title("soft-rasterizer")
        .with_inner_size(LogicalSize::new(width, height))
        .with_resizable(false)
        .build(&event_loop)
        .context("failed to create window")?;

    let mut pixels = {
        let size = window.inner_size();
        let surface_texture = SurfaceTexture::new(size.width, size.height, &window);
        Pixels::new(width, height, surface_texture).context("failed to create pixel surface")?
    };

    info!("F2 rotation, F5 shading mode, F6 normal map, F7 depth, F8 bounding boxes, F9 culling, F10 clear color");

    let mut last_frame = Instant::now();
    event_loop.run(move |event, _, control_flow| {
        control_flow.set_poll();

        match event {
            Event::WindowEvent {
                event: WindowEvent::CloseRequested,
                ..
            } => control_flow.set_exit(),
            Event::WindowEvent {
                event:
                    WindowEvent::KeyboardInput {
                        input:
                            KeyboardInput {
                                state,
                                virtual_keycode: Some(virtual_keycode),
                                ..
                            },
                        is_synthetic: false,
                        ..
                    },
                ..
            } => match (state, virtual_keycode) {
                (ElementState::Pressed, VirtualKeyCode::Escape) => control_flow.set_exit(),
                (state, key) => viewer.key(state, key),
            },
            Event::WindowEvent {
                event:
                    WindowEvent::MouseInput {
                        state,
                        button: MouseButton::Left,
                        ..
                    },
                ..
            } => viewer.looking = state == ElementState::Pressed,
            Event::DeviceEvent {
                event: DeviceEvent::MouseMotion { delta: (dx, dy) },
                ..
            } if viewer.looking => viewer.camera.rotate_delta(-dy as f32, dx as f32),
            Event::MainEventsCleared => {
                let dt = last_frame.elapsed().as_secs_f32();
                last_frame = Instant::now();
                viewer.update(dt);
                viewer.draw(pixels.frame_mut());
                window.request_redraw();
            }
            Event::RedrawRequested(_) => {
                if let Err(err) = pixels.render() {
                    error!("failed to present frame: {err}");
                    control_flow.set_exit();
                }
            }
            _ => (),
        }
    })
}
