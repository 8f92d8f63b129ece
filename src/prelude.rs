//! # Prelude
//!
//! Commonly used types for building and rendering scenes.
//!
//! ```no_run
//! use spatial_render::prelude::*;
//!
//! fn main() -> anyhow::Result<()> {
//!     let mut renderer = Renderer::new(RendererConfig::default().with_size(640, 480))?;
//!     let mut material = renderer.create_material();
//!     material.load_from_source(shaders::BASIC_VERTEX, shaders::BASIC_FRAGMENT)?;
//!
//!     let mut scene = Scene::new();
//!     scene.add_object_default(shared(cube()), shared(material));
//!
//!     renderer.begin_frame();
//!     renderer.clear(Renderer::DEFAULT_CLEAR_COLOR);
//!     renderer.render_scene(&scene, &Camera::default());
//!     renderer.end_frame();
//!     renderer.save_framebuffer_to_file("cube.png")?;
//!     Ok(())
//! }
//! ```

// Re-export graphics and scene types
pub use crate::gfx::camera::{Camera, Projection};
pub use crate::gfx::geometry::{cube, cube_with_face_normals, plane, sphere, Mesh, UploadState};
pub use crate::gfx::rendering::{Renderer, RendererConfig};
pub use crate::gfx::resources::{Material, UniformValue};
pub use crate::gfx::scene::{Scene, SceneObject, SharedMaterial, SharedMesh, Vertex};
pub use crate::shaders;
pub use crate::shared;

// Re-export benchmarking
pub use crate::performance::{FrameTimer, PerformanceHarness, Resolution};

// Re-export common external dependencies
pub use cgmath::{Deg, Matrix4, SquareMatrix, Vector3, Vector4};
