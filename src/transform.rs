use rayon::prelude::*;

use crate::{
    camera::Camera,
    mesh::{Vertex, VertexOut},
    vec::{Mat4x4, Vec3},
};

pub trait VertexShader<V> {
    type Output;

    fn exec(&self, vertex: V) -> Self::Output;
}

/// Local to clip space transform. Normals and tangents only go through the world matrix.
#[derive(Clone, Copy, Debug)]
pub struct TransformShader {
    world: Mat4x4,
    world_view_proj: Mat4x4,
    camera_origin: Vec3,
}

impl TransformShader {
    pub fn new(world: Mat4x4, view_proj: Mat4x4, camera_origin: Vec3) -> Self {
        TransformShader {
            world,
            world_view_proj: view_proj * world,
            camera_origin,
        }
    }

    pub fn for_camera(world: Mat4x4, camera: &Camera) -> Self {
        TransformShader::new(world, camera.view_projection(), camera.origin)
    }
}

impl VertexShader<Vertex> for TransformShader {
    type Output = VertexOut;

    fn exec(&self, v: Vertex) -> VertexOut {
        let world_position = self.world.transform_point(v.position);
        VertexOut {
            position: self.world_view_proj * v.position.to_hom(),
            uv: v.uv,
            normal: self.world.transform_vector(v.normal).normalized(),
            tangent: self.world.transform_vector(v.tangent).normalized(),
            view_direction: world_position - self.camera_origin,
        }
    }
}

/// Runs the vertex shader over every vertex on the rayon pool. Output order matches the input.
pub fn process_vertices<V, S>(vertices: &[V], shader: &S) -> Vec<S::Output>
where
    V: Copy + Sync,
    S: VertexShader<V> + Sync,
    S::Output: Send,
{
    vertices.par_iter().map(|&v| shader.exec(v)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vec::{Vec2, Vec4};

    fn vertex(position: [f32; 3]) -> Vertex {
        Vertex {
            position: Vec3::from(position),
            uv: Vec2::from([0.25, 0.75]),
            normal: Vec3::from([0., 0., -2.]),
            tangent: Vec3::from([3., 0., 0.]),
        }
    }

    #[test]
    fn clip_position_keeps_view_depth_as_w() {
        let camera = Camera::new(Vec3::from([0., 0., -10.]), 90., 1.);
        let shader = TransformShader::for_camera(Mat4x4::identity(), &camera);
        let out = shader.exec(vertex([0., 0., 0.]));
        assert!((out.position.w - 10.).abs() < 1e-5);
        assert!(out.position.x.abs() < 1e-6 && out.position.y.abs() < 1e-6);
        let ndc_z = out.position.z / out.position.w;
        assert!((0. ..=1.).contains(&ndc_z));
    }

    #[test]
    fn directions_ignore_translation_and_are_normalized() {
        let world = Vec3::from([4., 5., 6.]).to_translation() * Mat4x4::rotation_y(std::f32::consts::FRAC_PI_2);
        let shader = TransformShader::new(world, Mat4x4::identity(), Vec3::zero());
        let out = shader.exec(vertex([0., 0., 0.]));
        assert!((out.normal - Vec3::from([-1., 0., 0.])).mag() < 1e-5);
        assert!((out.tangent - Vec3::from([0., 0., -1.])).mag() < 1e-5);
        assert_eq!(out.uv.to_array(), [0.25, 0.75]);
    }

    #[test]
    fn view_direction_is_world_position_minus_camera() {
        let world = Vec3::from([1., 0., 0.]).to_translation();
        let shader = TransformShader::new(world, Mat4x4::identity(), Vec3::from([0., 0., -5.]));
        let out = shader.exec(vertex([0., 2., 0.]));
        assert_eq!(out.view_direction.to_array(), [1., 2., 5.]);
        assert_eq!(out.position, Vec4::from([1., 2., 0., 1.]));
    }

    #[test]
    fn parallel_stage_preserves_order() {
        let vertices: Vec<_> = (0..1000).map(|i| vertex([i as f32, 0., 0.])).collect();
        let shader = TransformShader::new(Mat4x4::identity(), Mat4x4::identity(), Vec3::zero());
        let out = process_vertices(&vertices, &shader);
        for (i, v) in out.iter().enumerate() {
            assert_eq!(v.position.x, i as f32);
        }
    }
}
