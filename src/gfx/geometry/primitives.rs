//! # Primitive Shape Generation
//!
//! Factories for the built-in shapes. Every shape is centered at the origin and
//! wound counter-clockwise when seen from outside, so it survives back-face
//! culling.

use std::f32::consts::PI;

use super::mesh::Mesh;
use crate::gfx::scene::vertex::Vertex;

/// Unit cube from 8 shared corners
///
/// Corners are shared between faces, so each normal points along the corner
/// diagonal. Use [`cube_with_face_normals`] for flat per-face shading.
pub fn cube() -> Mesh {
    #[rustfmt::skip]
    let corners: [([f32; 3], [f32; 2]); 8] = [
        ([-0.5, -0.5,  0.5], [0.0, 0.0]),
        ([ 0.5, -0.5,  0.5], [1.0, 0.0]),
        ([ 0.5,  0.5,  0.5], [1.0, 1.0]),
        ([-0.5,  0.5,  0.5], [0.0, 1.0]),
        ([-0.5, -0.5, -0.5], [1.0, 0.0]),
        ([ 0.5, -0.5, -0.5], [0.0, 0.0]),
        ([ 0.5,  0.5, -0.5], [0.0, 1.0]),
        ([-0.5,  0.5, -0.5], [1.0, 1.0]),
    ];

    let vertices = corners
        .iter()
        .map(|&(position, tex_coord)| Vertex::new(position, normalized(position), tex_coord))
        .collect();

    #[rustfmt::skip]
    let indices = vec![
        0, 1, 2,  2, 3, 0, // front  (+z)
        5, 4, 7,  7, 6, 5, // back   (-z)
        4, 0, 3,  3, 7, 4, // left   (-x)
        1, 5, 6,  6, 2, 1, // right  (+x)
        3, 2, 6,  6, 7, 3, // top    (+y)
        4, 5, 1,  1, 0, 4, // bottom (-y)
    ];

    Mesh::from_data(vertices, indices)
}

/// Unit cube with 4 vertices per face and outward face normals
pub fn cube_with_face_normals() -> Mesh {
    #[rustfmt::skip]
    let positions: [[f32; 3]; 24] = [
        // Front face
        [-0.5, -0.5,  0.5], [ 0.5, -0.5,  0.5], [ 0.5,  0.5,  0.5], [-0.5,  0.5,  0.5],
        // Back face
        [-0.5, -0.5, -0.5], [-0.5,  0.5, -0.5], [ 0.5,  0.5, -0.5], [ 0.5, -0.5, -0.5],
        // Left face
        [-0.5, -0.5, -0.5], [-0.5, -0.5,  0.5], [-0.5,  0.5,  0.5], [-0.5,  0.5, -0.5],
        // Right face
        [ 0.5, -0.5,  0.5], [ 0.5, -0.5, -0.5], [ 0.5,  0.5, -0.5], [ 0.5,  0.5,  0.5],
        // Top face
        [-0.5,  0.5,  0.5], [ 0.5,  0.5,  0.5], [ 0.5,  0.5, -0.5], [-0.5,  0.5, -0.5],
        // Bottom face
        [-0.5, -0.5, -0.5], [ 0.5, -0.5, -0.5], [ 0.5, -0.5,  0.5], [-0.5, -0.5,  0.5],
    ];

    #[rustfmt::skip]
    let tex_coords: [[f32; 2]; 24] = [
        [0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0],
        [1.0, 0.0], [1.0, 1.0], [0.0, 1.0], [0.0, 0.0],
        [1.0, 0.0], [0.0, 0.0], [0.0, 1.0], [1.0, 1.0],
        [0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0],
        [0.0, 1.0], [1.0, 1.0], [1.0, 0.0], [0.0, 0.0],
        [0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0],
    ];

    let face_normals: [[f32; 3]; 6] = [
        [0.0, 0.0, 1.0],
        [0.0, 0.0, -1.0],
        [-1.0, 0.0, 0.0],
        [1.0, 0.0, 0.0],
        [0.0, 1.0, 0.0],
        [0.0, -1.0, 0.0],
    ];

    let vertices = positions
        .iter()
        .zip(tex_coords.iter())
        .enumerate()
        .map(|(i, (&position, &tex_coord))| Vertex::new(position, face_normals[i / 4], tex_coord))
        .collect();

    let indices = (0..6u32)
        .flat_map(|face| {
            let base = face * 4;
            [base, base + 1, base + 2, base + 2, base + 3, base]
        })
        .collect();

    Mesh::from_data(vertices, indices)
}

/// UV sphere of radius 0.5
///
/// Produces `(segments + 1)²` vertices on a latitude/longitude grid (the seam
/// column is duplicated for texture coordinates) and `6 * segments²` indices.
/// Low segment counts give degenerate but valid meshes; zero is treated as one.
pub fn sphere(segments: u32) -> Mesh {
    let segments = segments.max(1);
    let row = segments + 1;

    let mut vertices = Vec::with_capacity((row * row) as usize);
    for y in 0..=segments {
        let v = y as f32 / segments as f32;
        let theta = v * PI; // 0 at the north pole

        for x in 0..=segments {
            let u = x as f32 / segments as f32;
            let phi = u * 2.0 * PI;

            let direction = [
                phi.cos() * theta.sin(),
                theta.cos(),
                phi.sin() * theta.sin(),
            ];
            let position = direction.map(|c| c * 0.5);
            vertices.push(Vertex::new(position, direction, [u, v]));
        }
    }

    let mut indices = Vec::with_capacity((6 * segments * segments) as usize);
    for y in 0..segments {
        for x in 0..segments {
            let first = y * row + x;
            let second = first + row;

            indices.extend_from_slice(&[first, first + 1, second]);
            indices.extend_from_slice(&[second, first + 1, second + 1]);
        }
    }

    Mesh::from_data(vertices, indices)
}

/// Rectangle in the XZ plane facing +Y
pub fn plane(width: f32, height: f32) -> Mesh {
    let w = width * 0.5;
    let h = height * 0.5;
    let up = [0.0, 1.0, 0.0];

    let vertices = vec![
        Vertex::new([-w, 0.0, -h], up, [0.0, 0.0]),
        Vertex::new([w, 0.0, -h], up, [1.0, 0.0]),
        Vertex::new([w, 0.0, h], up, [1.0, 1.0]),
        Vertex::new([-w, 0.0, h], up, [0.0, 1.0]),
    ];
    let indices = vec![0, 3, 2, 2, 1, 0];

    Mesh::from_data(vertices, indices)
}

fn normalized(v: [f32; 3]) -> [f32; 3] {
    let length = (v[0] * v[0] + v[1] * v[1] + v[2] * v[2]).sqrt();
    if length > 0.0 {
        v.map(|c| c / length)
    } else {
        v
    }
}
