//! # Scene Management Module
//!
//! A scene is an ordered list of objects, each pairing a shared mesh and a
//! shared material with a model transform and a tint color.
//!
//! ## Key Components
//!
//! - [`Scene`] - Insertion-ordered object container; order is draw order
//! - [`SceneObject`] - Mesh, material, transform and tint of one draw
//! - [`Vertex`] - Vertex layout shared by meshes and pipelines
//!
//! ## Usage
//!
//! ```no_run
//! use std::{cell::RefCell, rc::Rc};
//! use spatial_render::gfx::{geometry::cube, scene::Scene};
//!
//! let mut scene = Scene::new();
//! let mesh = Rc::new(RefCell::new(cube()));
//! scene.add_object(Some(mesh), None, cgmath::Matrix4::from_scale(1.0), cgmath::Vector3::new(1.0, 0.0, 0.0));
//! assert_eq!(scene.object_count(), 1);
//! ```

pub mod object;
pub mod scene;
pub mod vertex;

// Re-export main types
pub use object::{SceneObject, SharedMaterial, SharedMesh};
pub use scene::{Scene, SceneStatistics};
pub use vertex::Vertex;
