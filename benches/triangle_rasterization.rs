use std::sync::Arc;

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use rasterization::{
    shading::LitMaterial,
    vec::Vec3,
    Camera, Material, Mesh, Renderer, ShadingMode, Texture,
};

const WIDTH: usize = 720;
const HEIGHT: usize = 720;

/// A grid of spinning boxes filling most of the screen.
fn scene(material: Material) -> Vec<Mesh> {
    let mut meshes = Vec::new();
    for y in -3..=3 {
        for x in -3..=3 {
            let position = Vec3::from([x as f32 * 1.5, y as f32 * 1.5, 0.]);
            let mut mesh = Mesh::cuboid(1., 1., 1., material.clone())
                .with_world(position.to_translation());
            mesh.rotate_y(0.4 + 0.1 * (x + y) as f32);
            meshes.push(mesh);
        }
    }
    meshes
}

fn checker(size: usize) -> Texture<[u8; 4]> {
    let texels = (0..size * size)
        .map(|i| {
            let (x, y) = (i % size, i / size);
            if (x / 8 + y / 8) % 2 == 0 {
                [230, 230, 230, 255]
            } else {
                [40, 40, 40, 255]
            }
        })
        .collect();
    Texture::from_vec(size, size, texels)
}

fn triangle_rasterization(c: &mut Criterion) {
    let mut group = c.benchmark_group("Triangle rasterization");

    let camera = Camera::new(Vec3::from([0., 0., -14.]), 60., WIDTH as f32 / HEIGHT as f32);
    let flat = scene(Material::Color(Vec3::from([0.8, 0.5, 0.2])));

    let tex = Arc::new(checker(256));
    let normal = Arc::new(Texture::solid(Vec3::from([0.5, 0.5, 1.])));
    let lit = scene(Material::Lit(LitMaterial {
        diffuse: tex.clone(),
        normal,
        specular: tex.clone(),
        gloss: tex,
    }));

    let mut renderer = Renderer::new(WIDTH, HEIGHT);

    group.bench_function("flat color", |b| {
        b.iter(|| {
            renderer.render(&flat, &camera);
            black_box(renderer.color_buffer());
        })
    });

    group.bench_function("lit, normal mapped", |b| {
        b.iter(|| {
            renderer.render(&lit, &camera);
            black_box(renderer.color_buffer());
        })
    });

    renderer.set_shading_mode(ShadingMode::ObservedArea);
    renderer.toggle_depth_buffer();
    group.bench_function("depth only", |b| {
        b.iter(|| {
            renderer.render(&lit, &camera);
            black_box(renderer.depth_buffer());
        })
    });

    group.finish();
}

criterion_group!(benches, triangle_rasterization);
criterion_main!(benches);
