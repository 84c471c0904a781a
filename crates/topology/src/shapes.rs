//! Procedural triangle meshes used by tests, benchmarks and demos.

use glam::Vec3;
use std::f32::consts::PI;

use crate::types::TriMesh;

/// Axis-aligned cube spanning `origin` to `origin + size`, 12 triangles
/// with outward-facing counterclockwise winding.
pub fn cube(origin: Vec3, size: f32) -> TriMesh {
    let positions = [
        Vec3::new(0.0, 0.0, 0.0),
        Vec3::new(1.0, 0.0, 0.0),
        Vec3::new(1.0, 1.0, 0.0),
        Vec3::new(0.0, 1.0, 0.0),
        Vec3::new(0.0, 0.0, 1.0),
        Vec3::new(1.0, 0.0, 1.0),
        Vec3::new(1.0, 1.0, 1.0),
        Vec3::new(0.0, 1.0, 1.0),
    ]
    .iter()
    .map(|p| origin + *p * size)
    .collect();

    let triangles = vec![
        // -z
        [0, 2, 1],
        [0, 3, 2],
        // +z
        [4, 5, 6],
        [4, 6, 7],
        // -y
        [0, 1, 5],
        [0, 5, 4],
        // +y
        [2, 3, 7],
        [2, 7, 6],
        // -x
        [0, 4, 7],
        [0, 7, 3],
        // +x
        [1, 2, 6],
        [1, 6, 5],
    ];
    TriMesh::new(positions, triangles)
}

/// Unit cube spanning the origin to (1, 1, 1).
pub fn unit_cube() -> TriMesh {
    cube(Vec3::ZERO, 1.0)
}

/// Unit sphere centered at the origin, triangulated as a latitude /
/// longitude grid with pole caps: `2 * segments * (rings - 1)` triangles.
pub fn uv_sphere(segments: u32, rings: u32) -> TriMesh {
    assert!(segments >= 3 && rings >= 2);
    let mut positions = Vec::new();
    positions.push(Vec3::Z);
    for r in 1..rings {
        let theta = PI * r as f32 / rings as f32;
        for s in 0..segments {
            let phi = 2.0 * PI * s as f32 / segments as f32;
            positions.push(Vec3::new(
                theta.sin() * phi.cos(),
                theta.sin() * phi.sin(),
                theta.cos(),
            ));
        }
    }
    positions.push(Vec3::NEG_Z);

    let row = |r: u32, s: u32| 1 + (r - 1) * segments + (s % segments);
    let mut triangles = Vec::new();
    for s in 0..segments {
        triangles.push([0, row(1, s), row(1, s + 1)]);
    }
    for r in 1..rings - 1 {
        for s in 0..segments {
            let a0 = row(r, s);
            let a1 = row(r, s + 1);
            let b0 = row(r + 1, s);
            let b1 = row(r + 1, s + 1);
            triangles.push([a0, b0, b1]);
            triangles.push([a0, b1, a1]);
        }
    }
    let bottom = positions.len() as u32 - 1;
    for s in 0..segments {
        triangles.push([bottom, row(rings - 1, s + 1), row(rings - 1, s)]);
    }
    TriMesh::new(positions, triangles)
}

/// Flat grid of `nx` by `ny` quads in the z = 0 plane, unit spacing,
/// upward-facing winding. `(nx + 1) * (ny + 1)` vertices in row-major
/// order, `2 * nx * ny` triangles.
pub fn grid_plane(nx: u32, ny: u32) -> TriMesh {
    assert!(nx >= 1 && ny >= 1);
    let mut positions = Vec::new();
    for y in 0..=ny {
        for x in 0..=nx {
            positions.push(Vec3::new(x as f32, y as f32, 0.0));
        }
    }
    let idx = |x: u32, y: u32| y * (nx + 1) + x;
    let mut triangles = Vec::new();
    for y in 0..ny {
        for x in 0..nx {
            let v00 = idx(x, y);
            let v10 = idx(x + 1, y);
            let v01 = idx(x, y + 1);
            let v11 = idx(x + 1, y + 1);
            triangles.push([v00, v10, v11]);
            triangles.push([v00, v11, v01]);
        }
    }
    TriMesh::new(positions, triangles)
}
