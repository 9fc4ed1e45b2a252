use std::path::Path;

use anyhow::{anyhow, bail, Context, Result};

use crate::{
    mesh::{generate_tangents, Vertex},
    vec::{Vec2, Vec3},
};

/// Triangle soup read from a Wavefront OBJ file. Every face corner becomes its own vertex.
#[derive(Debug, Clone, Default)]
pub struct Obj {
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
}

pub fn load_obj(path: &Path, flip_axis_and_winding: bool) -> Result<Obj> {
    let source = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read file {path:?}"))?;
    parse_obj(&source, flip_axis_and_winding).with_context(|| format!("failed to parse {path:?}"))
}

/// Parses `v`, `vt`, `vn` and `f` statements. Texture `v` is flipped so that `0` is the top row.
/// Polygons are triangulated as fans. With `flip_axis_and_winding` the right handed OBJ data is
/// mirrored along `z` and every triangle's winding is reversed, which keeps front faces in
/// front.
pub fn parse_obj(source: &str, flip_axis_and_winding: bool) -> Result<Obj> {
    let mut positions = Vec::new();
    let mut uvs = Vec::new();
    let mut normals = Vec::new();
    let mut obj = Obj::default();

    for (line_no, line) in source.lines().enumerate() {
        let line_no = line_no + 1;
        let mut it = line.split_ascii_whitespace();
        match it.next() {
            Some("v") => {
                let [x, y, z] = parse_floats(it).with_context(|| format!("line {line_no}"))?;
                positions.push(Vec3::from([x, y, z]));
            }
            Some("vt") => {
                let [u, v] = parse_floats(it).with_context(|| format!("line {line_no}"))?;
                uvs.push(Vec2::from([u, 1. - v]));
            }
            Some("vn") => {
                let [x, y, z] = parse_floats(it).with_context(|| format!("line {line_no}"))?;
                normals.push(Vec3::from([x, y, z]));
            }
            Some("f") => {
                let corners = it
                    .map(|corner| parse_corner(corner, &positions, &uvs, &normals))
                    .collect::<Result<Vec<_>>>()
                    .with_context(|| format!("line {line_no}"))?;
                if corners.len() < 3 {
                    bail!("line {line_no}: face needs at least 3 vertices");
                }

                for i in 1..corners.len() - 1 {
                    push_triangle(
                        &mut obj,
                        [corners[0], corners[i], corners[i + 1]],
                        flip_axis_and_winding,
                    );
                }
            }
            _ => continue,
        }
    }

    generate_tangents(&mut obj.vertices, &obj.indices);

    if flip_axis_and_winding {
        for v in &mut obj.vertices {
            v.position.z = -v.position.z;
            v.normal.z = -v.normal.z;
            v.tangent.z = -v.tangent.z;
        }
    }

    Ok(obj)
}

type Corner = (Vec3, Vec2, Option<Vec3>);

fn push_triangle(obj: &mut Obj, corners: [Corner; 3], flip_winding: bool) {
    let [(p0, ..), (p1, ..), (p2, ..)] = corners;
    let face_normal = (p1 - p0).cross(p2 - p0);
    let face_normal = if face_normal.mag_sq() > 0. {
        face_normal.normalized()
    } else {
        Vec3::from([0., 1., 0.])
    };

    let base = obj.vertices.len() as u32;
    for (position, uv, normal) in corners {
        obj.vertices.push(Vertex {
            position,
            uv,
            normal: normal.unwrap_or(face_normal),
            tangent: Vec3::zero(),
        });
    }

    if flip_winding {
        obj.indices.extend([base, base + 2, base + 1]);
    } else {
        obj.indices.extend([base, base + 1, base + 2]);
    }
}

fn parse_floats<'a, const N: usize>(mut it: impl Iterator<Item = &'a str>) -> Result<[f32; N]> {
    let mut out = [0.; N];
    for slot in &mut out {
        let token = it
            .next()
            .ok_or_else(|| anyhow!("expected {N} coordinates"))?;
        *slot = token
            .parse()
            .with_context(|| format!("invalid number {token:?}"))?;
    }
    Ok(out)
}

/// Parses one `position[/uv][/normal]` face corner. Indices are 1-based, negative ones count
/// from the end.
fn parse_corner(corner: &str, positions: &[Vec3], uvs: &[Vec2], normals: &[Vec3]) -> Result<Corner> {
    let mut parts = corner.split('/');
    let position = match parts.next() {
        Some(index) if !index.is_empty() => lookup(index, positions)?,
        _ => bail!("missing position index in {corner:?}"),
    };
    let uv = match parts.next() {
        Some(index) if !index.is_empty() => lookup(index, uvs)?,
        _ => Vec2::zero(),
    };
    let normal = match parts.next() {
        Some(index) if !index.is_empty() => Some(lookup(index, normals)?),
        _ => None,
    };
    Ok((position, uv, normal))
}

fn lookup<T: Copy>(index: &str, items: &[T]) -> Result<T> {
    let raw: i64 = index
        .parse()
        .with_context(|| format!("invalid index {index:?}"))?;
    let resolved = if raw < 0 {
        items.len() as i64 + raw
    } else {
        raw - 1
    };
    usize::try_from(resolved)
        .ok()
        .and_then(|i| items.get(i).copied())
        .ok_or_else(|| anyhow!("index {raw} out of range for {} elements", items.len()))
}

#[cfg(test)]
mod tests {
    use super::*;

    const TRIANGLE: &str = "\
# single triangle
v 0 0 1
v 1 0 1
v 0 1 1
vt 0 0
vt 1 0
vt 0 1
vn 0 0 1
f 1/1/1 2/2/1 3/3/1
";

    #[test]
    fn parses_corners_and_flips_v() {
        let obj = parse_obj(TRIANGLE, false).unwrap();
        assert_eq!(obj.vertices.len(), 3);
        assert_eq!(obj.indices, [0, 1, 2]);
        assert_eq!(obj.vertices[0].uv.to_array(), [0., 1.]);
        assert_eq!(obj.vertices[2].uv.to_array(), [0., 0.]);
        assert_eq!(obj.vertices[1].normal.to_array(), [0., 0., 1.]);
    }

    #[test]
    fn flip_mirrors_z_and_reverses_winding() {
        let obj = parse_obj(TRIANGLE, true).unwrap();
        assert_eq!(obj.indices, [0, 2, 1]);
        for v in &obj.vertices {
            assert_eq!(v.position.z, -1.);
            assert_eq!(v.normal.z, -1.);
        }
    }

    #[test]
    fn tangents_are_unit_and_orthogonal() {
        let obj = parse_obj(TRIANGLE, true).unwrap();
        for v in &obj.vertices {
            assert!((v.tangent.mag() - 1.).abs() < 1e-5);
            assert!(v.tangent.dot(v.normal).abs() < 1e-5);
        }
    }

    #[test]
    fn quads_are_fan_triangulated() {
        let src = "v 0 0 0\nv 1 0 0\nv 1 1 0\nv 0 1 0\nf 1 2 3 4\n";
        let obj = parse_obj(src, false).unwrap();
        assert_eq!(obj.indices.len(), 6);
        assert_eq!(obj.vertices[3].position.to_array(), [0., 0., 0.]);
        // No `vn`, so the face normal is used.
        assert_eq!(obj.vertices[0].normal.to_array(), [0., 0., 1.]);
    }

    #[test]
    fn negative_indices_count_from_the_end() {
        let src = "v 0 0 0\nv 1 0 0\nv 0 1 0\nf -3 -2 -1\n";
        let obj = parse_obj(src, false).unwrap();
        assert_eq!(obj.vertices[2].position.to_array(), [0., 1., 0.]);
    }

    #[test]
    fn bad_input_reports_line() {
        let err = parse_obj("v 0 0 0\nf 1 2 3\n", false).unwrap_err();
        assert!(format!("{err:#}").contains("line 2"), "{err:#}");
        let err = parse_obj("v 0 zero 0\n", false).unwrap_err();
        assert!(format!("{err:#}").contains("line 1"));
    }
}
