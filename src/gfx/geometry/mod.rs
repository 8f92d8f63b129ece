//! # Geometry
//!
//! Geometry buffers and procedurally generated primitive shapes.
//!
//! ## Usage
//!
//! ```no_run
//! use spatial_render::gfx::geometry::{cube, plane, sphere};
//!
//! let cube = cube();
//! assert_eq!(cube.vertex_count(), 8);
//!
//! let sphere = sphere(16);
//! let floor = plane(10.0, 10.0);
//! ```

pub mod mesh;
pub mod primitives;

pub use mesh::{DrawMesh, DrawStats, GeometryError, Mesh, UploadState};
pub use primitives::*;
