//! Geometry buffer: CPU-side vertex/index data with lazy GPU upload

use thiserror::Error;
use wgpu::util::DeviceExt;

use crate::gfx::scene::vertex::Vertex;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum GeometryError {
    #[error("index {index} at position {position} is out of range for {vertex_count} vertices")]
    IndexOutOfRange {
        position: usize,
        index: u32,
        vertex_count: usize,
    },
}

/// Whether the GPU copy of a mesh exists and matches its CPU data
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UploadState {
    /// Nothing resident on the GPU
    #[default]
    Empty,
    /// A GPU copy exists but the data was replaced after it was made
    Dirty,
    /// The GPU copy matches the CPU data
    Uploaded,
}

/// Work submitted by one or more draw calls
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DrawStats {
    pub draw_calls: u32,
    pub vertices: u32,
    pub indices: u32,
}

impl std::ops::AddAssign for DrawStats {
    fn add_assign(&mut self, other: Self) {
        self.draw_calls += other.draw_calls;
        self.vertices += other.vertices;
        self.indices += other.indices;
    }
}

/// Vertex and index data for one drawable shape
#[derive(Debug, Default)]
pub struct Mesh {
    vertices: Vec<Vertex>,
    indices: Vec<u32>,
    state: UploadState,
    vertex_buffer: Option<wgpu::Buffer>,
    index_buffer: Option<wgpu::Buffer>,
}

impl Mesh {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a mesh from existing data. Nothing is uploaded yet.
    pub fn from_data(vertices: Vec<Vertex>, indices: Vec<u32>) -> Self {
        Self {
            vertices,
            indices,
            ..Self::default()
        }
    }

    pub fn set_vertices(&mut self, vertices: Vec<Vertex>) {
        self.vertices = vertices;
        self.mark_dirty();
    }

    pub fn set_indices(&mut self, indices: Vec<u32>) {
        self.indices = indices;
        self.mark_dirty();
    }

    fn mark_dirty(&mut self) {
        if self.state == UploadState::Uploaded {
            self.state = UploadState::Dirty;
        }
    }

    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn index_count(&self) -> usize {
        self.indices.len()
    }

    pub fn triangle_count(&self) -> usize {
        if self.indices.is_empty() {
            self.vertices.len() / 3
        } else {
            self.indices.len() / 3
        }
    }

    pub fn upload_state(&self) -> UploadState {
        self.state
    }

    /// Checks that every index refers to an existing vertex
    pub fn validate(&self) -> Result<(), GeometryError> {
        let vertex_count = self.vertices.len();
        match self
            .indices
            .iter()
            .enumerate()
            .find(|(_, &index)| index as usize >= vertex_count)
        {
            Some((position, &index)) => Err(GeometryError::IndexOutOfRange {
                position,
                index,
                vertex_count,
            }),
            None => Ok(()),
        }
    }

    /// Transfers the data to GPU buffers. No-op when already uploaded.
    ///
    /// A mesh without vertices creates no buffers but still counts as uploaded.
    pub fn upload(&mut self, device: &wgpu::Device) -> Result<(), GeometryError> {
        if self.state == UploadState::Uploaded {
            return Ok(());
        }
        self.validate()?;

        self.vertex_buffer = None;
        self.index_buffer = None;

        if !self.vertices.is_empty() {
            self.vertex_buffer = Some(device.create_buffer_init(
                &wgpu::util::BufferInitDescriptor {
                    label: Some("Mesh Vertex Buffer"),
                    contents: bytemuck::cast_slice(&self.vertices),
                    usage: wgpu::BufferUsages::VERTEX,
                },
            ));

            if !self.indices.is_empty() {
                self.index_buffer = Some(device.create_buffer_init(
                    &wgpu::util::BufferInitDescriptor {
                        label: Some("Mesh Index Buffer"),
                        contents: bytemuck::cast_slice(&self.indices),
                        usage: wgpu::BufferUsages::INDEX,
                    },
                ));
            }
        }

        log::debug!(
            "Uploaded mesh: {} vertices, {} indices",
            self.vertices.len(),
            self.indices.len()
        );
        self.state = UploadState::Uploaded;
        Ok(())
    }

    /// Uploads if needed, then records the draw into `pass`
    ///
    /// Indexed meshes are drawn with `u32` indices; meshes without indices are
    /// drawn as a plain vertex sequence. Empty meshes draw nothing.
    pub fn render(
        &mut self,
        device: &wgpu::Device,
        pass: &mut wgpu::RenderPass<'_>,
    ) -> Result<DrawStats, GeometryError> {
        self.upload(device)?;
        Ok(pass.draw_mesh(self))
    }

    /// Releases the GPU buffers. Safe to call on a mesh that was never uploaded.
    pub fn cleanup(&mut self) {
        self.vertex_buffer = None;
        self.index_buffer = None;
        self.state = UploadState::Empty;
    }
}

/// Records mesh draws into a render pass
pub trait DrawMesh {
    fn draw_mesh(&mut self, mesh: &Mesh) -> DrawStats;
}

impl DrawMesh for wgpu::RenderPass<'_> {
    fn draw_mesh(&mut self, mesh: &Mesh) -> DrawStats {
        let Some(vertex_buffer) = &mesh.vertex_buffer else {
            return DrawStats::default(); // not uploaded, or no vertices
        };

        self.set_vertex_buffer(0, vertex_buffer.slice(..));
        let vertices = mesh.vertices.len() as u32;

        match &mesh.index_buffer {
            Some(index_buffer) => {
                let indices = mesh.indices.len() as u32;
                self.set_index_buffer(index_buffer.slice(..), wgpu::IndexFormat::Uint32);
                self.draw_indexed(0..indices, 0, 0..1);
                DrawStats {
                    draw_calls: 1,
                    vertices,
                    indices,
                }
            }
            None => {
                self.draw(0..vertices, 0..1);
                DrawStats {
                    draw_calls: 1,
                    vertices,
                    indices: 0,
                }
            }
        }
    }
}
