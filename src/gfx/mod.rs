//! # Graphics Module
//!
//! Everything needed to describe and draw a frame.
//!
//! ## Architecture Overview
//!
//! - **Geometry** ([`geometry`]) - Geometry buffers and primitive shapes
//! - **Resources** ([`resources`]) - Materials, uniform reflection, render targets
//! - **Camera** ([`camera`]) - View and projection state
//! - **Scene** ([`scene`]) - Ordered list of tinted, transformed objects
//! - **Rendering** ([`rendering`]) - Frame protocol and framebuffer capture
//!
//! ## Usage
//!
//! ```no_run
//! use spatial_render::gfx::{Camera, Renderer, RendererConfig, scene::Scene};
//!
//! let mut renderer = Renderer::new(RendererConfig::default()).unwrap();
//! let scene = Scene::new();
//!
//! renderer.begin_frame();
//! renderer.clear(Renderer::DEFAULT_CLEAR_COLOR);
//! renderer.render_scene(&scene, &Camera::default());
//! renderer.end_frame();
//! ```

pub mod camera;
pub mod geometry;
pub mod rendering;
pub mod resources;
pub mod scene;

// Re-export commonly used types
pub use camera::Camera;
pub use rendering::render_engine::{Renderer, RendererConfig};
