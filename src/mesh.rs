use anyhow::{ensure, Result};

use crate::{
    shading::Material,
    vec::{Mat4x4, Vec2, Vec3, Vec4},
};

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Vertex {
    pub position: Vec3,
    pub uv: Vec2,
    pub normal: Vec3,
    pub tangent: Vec3,
}

/// A vertex after the transform stage. `position` is in clip space and keeps its `w`, the
/// perspective divide happens during triangle setup.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct VertexOut {
    pub position: Vec4,
    pub uv: Vec2,
    pub normal: Vec3,
    pub tangent: Vec3,
    /// World position minus camera origin. Not normalized.
    pub view_direction: Vec3,
}

/// Indexed triangle list with its world transform and material.
#[derive(Clone, Debug)]
pub struct Mesh {
    vertices: Vec<Vertex>,
    indices: Vec<u32>,
    pub world: Mat4x4,
    pub material: Material,
}

impl Mesh {
    pub fn new(vertices: Vec<Vertex>, indices: Vec<u32>, material: Material) -> Result<Self> {
        ensure!(
            indices.len() % 3 == 0,
            "index count {} is not a multiple of 3",
            indices.len()
        );
        if let Some(&bad) = indices.iter().find(|&&i| i as usize >= vertices.len()) {
            anyhow::bail!(
                "index {bad} is out of range for {} vertices",
                vertices.len()
            );
        }

        Ok(Mesh {
            vertices,
            indices,
            world: Mat4x4::identity(),
            material,
        })
    }

    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    pub fn with_world(mut self, world: Mat4x4) -> Self {
        self.world = world;
        self
    }

    /// Spins the mesh around its own `y` axis by `angle` radians.
    pub fn rotate_y(&mut self, angle: f32) {
        self.world = self.world * Mat4x4::rotation_y(angle);
    }

    /// Unit quad in the `xy` plane, facing `-z`.
    pub fn quad(size: f32, material: Material) -> Self {
        let half = size / 2.;
        let mut vertices = Vec::with_capacity(4);
        let mut indices = Vec::with_capacity(6);
        push_face(
            &mut vertices,
            &mut indices,
            Vec3::zero(),
            Vec3::from([half, 0., 0.]),
            Vec3::from([0., half, 0.]),
        );
        Mesh {
            vertices,
            indices,
            world: Mat4x4::identity(),
            material,
        }
    }

    /// Axis aligned box centered on the origin. Every face has its own vertices so normals,
    /// tangents and uvs are per face.
    pub fn cuboid(width: f32, height: f32, depth: f32, material: Material) -> Self {
        let (w, h, d) = (width / 2., height / 2., depth / 2.);
        let x = Vec3::from([1., 0., 0.]);
        let y = Vec3::from([0., 1., 0.]);
        let z = Vec3::from([0., 0., 1.]);

        // (center, right, up) as seen from outside the face.
        let faces = [
            (-z * d, x * w, y * h),
            (z * d, -x * w, y * h),
            (x * w, z * d, y * h),
            (-x * w, -z * d, y * h),
            (y * h, x * w, z * d),
            (-y * h, x * w, -z * d),
        ];

        let mut vertices = Vec::with_capacity(24);
        let mut indices = Vec::with_capacity(36);
        for (center, right, up) in faces {
            push_face(&mut vertices, &mut indices, center, right, up);
        }

        Mesh {
            vertices,
            indices,
            world: Mat4x4::identity(),
            material,
        }
    }
}

/// Appends a rectangle spanned by the half extents `right` and `up`. Seen from the front, with
/// `right` pointing right and `up` pointing up, the triangles wind clockwise.
fn push_face(vertices: &mut Vec<Vertex>, indices: &mut Vec<u32>, center: Vec3, right: Vec3, up: Vec3) {
    let normal = right.cross(up).normalized() * -1.;
    let tangent = right.normalized();
    let base = vertices.len() as u32;

    let corners = [
        (center - right + up, [0., 0.]),
        (center + right + up, [1., 0.]),
        (center + right - up, [1., 1.]),
        (center - right - up, [0., 1.]),
    ];
    for (position, uv) in corners {
        vertices.push(Vertex {
            position,
            uv: Vec2::from(uv),
            normal,
            tangent,
        });
    }
    indices.extend([0, 1, 2, 0, 2, 3].map(|i| base + i));
}

/// Accumulates per-face tangents from the uv gradients and orthogonalizes them against the
/// vertex normals.
pub fn generate_tangents(vertices: &mut [Vertex], indices: &[u32]) {
    for v in vertices.iter_mut() {
        v.tangent = Vec3::zero();
    }

    for tri in indices.chunks_exact(3) {
        let [i0, i1, i2] = [tri[0], tri[1], tri[2]].map(|i| i as usize);
        let (v0, v1, v2) = (vertices[i0], vertices[i1], vertices[i2]);

        let edge0 = v1.position - v0.position;
        let edge1 = v2.position - v0.position;
        let diff_x = Vec2::from([v1.uv.x - v0.uv.x, v2.uv.x - v0.uv.x]);
        let diff_y = Vec2::from([v1.uv.y - v0.uv.y, v2.uv.y - v0.uv.y]);
        let det = diff_x.cross(diff_y);
        if det.abs() < f32::EPSILON {
            continue;
        }

        let tangent = (edge0 * diff_y.y - edge1 * diff_y.x) / det;
        for i in [i0, i1, i2] {
            vertices[i].tangent += tangent;
        }
    }

    for v in vertices.iter_mut() {
        let n = v.normal;
        let rejected = v.tangent - n * (v.tangent.dot(n) / n.mag_sq());
        v.tangent = if rejected.mag_sq() > f32::EPSILON {
            rejected.normalized()
        } else {
            any_perpendicular(n)
        };
    }
}

fn any_perpendicular(n: Vec3) -> Vec3 {
    let axis = if n.x.abs() < 0.9 {
        Vec3::from([1., 0., 0.])
    } else {
        Vec3::from([0., 1., 0.])
    };
    n.cross(axis).normalized()
}
