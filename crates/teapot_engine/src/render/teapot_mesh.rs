//! Teapot geometry
//!
//! The teapot is a surface of revolution: a body-and-lid profile swept around
//! the Y axis. The mesh is generated once on first use and shared by every
//! teapot renderer, so vertex and index counts never change after that.

use std::sync::OnceLock;

use super::vertex::MeshVertex;

/// Profile as (radius, height) pairs from the bottom centre to the lid knob
const PROFILE: [(f32, f32); 15] = [
    (0.0, -15.0),
    (20.0, -15.0),
    (26.0, -12.0),
    (30.0, -5.0),
    (30.0, 2.0),
    (27.0, 9.0),
    (22.0, 13.0),
    (16.0, 15.0),
    (15.0, 16.0),
    (12.0, 17.0),
    (6.0, 19.0),
    (3.0, 21.0),
    (4.0, 23.0),
    (2.0, 25.0),
    (0.0, 26.0),
];

/// Slices around the Y axis
const SEGMENTS: usize = 32;

/// Indexed triangle list
#[derive(Debug, Clone)]
pub struct TeapotMesh {
    /// Interleaved position + normal records
    pub vertices: Vec<MeshVertex>,
    /// Counter-clockwise triangles, three indices each
    pub indices: Vec<u16>,
}

impl TeapotMesh {
    /// Number of indices drawn per frame
    pub fn index_count(&self) -> i32 {
        self.indices.len() as i32
    }
}

/// Shared teapot geometry
pub fn teapot_mesh() -> &'static TeapotMesh {
    static MESH: OnceLock<TeapotMesh> = OnceLock::new();
    MESH.get_or_init(build_lathe)
}

fn profile_normal(i: usize) -> (f32, f32) {
    let prev = PROFILE[i.saturating_sub(1)];
    let next = PROFILE[(i + 1).min(PROFILE.len() - 1)];
    let (dr, dy) = (next.0 - prev.0, next.1 - prev.1);
    let len = dr.hypot(dy).max(f32::EPSILON);
    (dy / len, -dr / len)
}

fn build_lathe() -> TeapotMesh {
    let ring = SEGMENTS + 1;
    let mut vertices = Vec::with_capacity(PROFILE.len() * ring);

    for (i, &(radius, height)) in PROFILE.iter().enumerate() {
        let (nr, ny) = profile_normal(i);
        for j in 0..ring {
            let theta = std::f32::consts::TAU * j as f32 / SEGMENTS as f32;
            let (sin, cos) = theta.sin_cos();
            vertices.push(MeshVertex::new(
                [radius * cos, height, radius * sin],
                [nr * cos, ny, nr * sin],
            ));
        }
    }

    let mut indices = Vec::with_capacity((PROFILE.len() - 1) * SEGMENTS * 6);
    for i in 0..PROFILE.len() - 1 {
        for j in 0..SEGMENTS {
            let a = (i * ring + j) as u16;
            let b = a + 1;
            let c = ((i + 1) * ring + j) as u16;
            let d = c + 1;
            indices.extend_from_slice(&[a, c, b, b, c, d]);
        }
    }

    TeapotMesh { vertices, indices }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_indices_in_range() {
        let mesh = teapot_mesh();
        let count = mesh.vertices.len();
        assert!(count < usize::from(u16::MAX));
        assert!(mesh.indices.iter().all(|&i| usize::from(i) < count));
        assert_eq!(mesh.indices.len() % 3, 0);
    }

    #[test]
    fn test_generated_once() {
        assert!(std::ptr::eq(teapot_mesh(), teapot_mesh()));
        assert_eq!(teapot_mesh().index_count(), teapot_mesh().index_count());
    }

    #[test]
    fn test_normals_are_unit_and_outward() {
        for v in &teapot_mesh().vertices {
            let [x, y, z] = v.normal;
            let len = (x * x + y * y + z * z).sqrt();
            assert!((len - 1.0).abs() < 1e-4);
        }
        // Widest ring faces away from the axis
        let side = teapot_mesh().vertices[3 * (SEGMENTS + 1)];
        assert!(side.normal[0] > 0.9);
    }

    #[test]
    fn test_side_triangle_winds_outward() {
        let mesh = teapot_mesh();
        let base = 3 * SEGMENTS * 6;
        let tri: Vec<[f32; 3]> = mesh.indices[base..base + 3]
            .iter()
            .map(|&i| mesh.vertices[usize::from(i)].position)
            .collect();
        let e1 = [tri[1][0] - tri[0][0], tri[1][1] - tri[0][1], tri[1][2] - tri[0][2]];
        let e2 = [tri[2][0] - tri[0][0], tri[2][1] - tri[0][1], tri[2][2] - tri[0][2]];
        let nx = e1[1] * e2[2] - e1[2] * e2[1];
        assert!(nx > 0.0);
    }
}
