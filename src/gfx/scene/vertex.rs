//! # Vertex Data Structures
//!
//! This module defines the vertex layout shared by every mesh and every
//! material pipeline in the renderer.

use std::mem;

/// A 3D vertex with position, normal and texture coordinate.
///
/// # Memory Layout
///
/// The `#[repr(C)]` attribute fixes the field order so the byte layout matches
/// the attribute bindings returned by [`Vertex::desc`]:
///
/// | slot | attribute  | format    | offset |
/// |------|------------|-----------|--------|
/// | 0    | position   | Float32x3 | 0      |
/// | 1    | normal     | Float32x3 | 12     |
/// | 2    | tex_coord  | Float32x2 | 24     |
///
/// The stride is 32 bytes.
///
/// # Examples
///
/// ```no_run
/// use spatial_render::gfx::scene::vertex::Vertex;
///
/// let vertex = Vertex::new([0.0, 1.0, 0.0], [0.0, 1.0, 0.0], [0.5, 0.5]);
/// ```
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Vertex {
    /// Object-space position [x, y, z]
    pub position: [f32; 3],
    /// Surface normal [nx, ny, nz]
    pub normal: [f32; 3],
    /// Texture coordinate [u, v]
    pub tex_coord: [f32; 2],
}

impl Vertex {
    pub const POSITION_LOCATION: u32 = 0;
    pub const NORMAL_LOCATION: u32 = 1;
    pub const TEX_COORD_LOCATION: u32 = 2;

    const ATTRIBUTES: [wgpu::VertexAttribute; 3] = [
        wgpu::VertexAttribute {
            offset: 0,
            shader_location: Self::POSITION_LOCATION,
            format: wgpu::VertexFormat::Float32x3,
        },
        wgpu::VertexAttribute {
            offset: mem::size_of::<[f32; 3]>() as wgpu::BufferAddress,
            shader_location: Self::NORMAL_LOCATION,
            format: wgpu::VertexFormat::Float32x3,
        },
        wgpu::VertexAttribute {
            offset: mem::size_of::<[f32; 6]>() as wgpu::BufferAddress,
            shader_location: Self::TEX_COORD_LOCATION,
            format: wgpu::VertexFormat::Float32x2,
        },
    ];

    pub const fn new(position: [f32; 3], normal: [f32; 3], tex_coord: [f32; 2]) -> Self {
        Self {
            position,
            normal,
            tex_coord,
        }
    }

    /// Returns the vertex buffer layout used by every material pipeline.
    pub fn desc() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: mem::size_of::<Vertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRIBUTES,
        }
    }
}
