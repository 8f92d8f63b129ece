// src/lib.rs
//! Spatial Render
//!
//! A minimal headless 3D renderer built on wgpu: linked shader programs with
//! named uniforms, lazily uploaded meshes, a camera, and an ordered scene drawn
//! with a fixed per-frame protocol. Frames can be captured to PNG for visual
//! regression tests and benchmarks.

pub mod gfx;
pub mod logging;
pub mod performance;
pub mod prelude;
pub mod shaders;
pub mod wgpu_utils;

use std::{cell::RefCell, rc::Rc};

// Re-export main types for convenience
pub use gfx::rendering::{GpuError, Renderer, RendererConfig};

/// Wraps a mesh or material for sharing between scene objects
pub fn shared<T>(value: T) -> Rc<RefCell<T>> {
    Rc::new(RefCell::new(value))
}
