// src/gfx/rendering/mod.rs
//! Core rendering functionality
//!
//! Handles the frame protocol, offscreen targets and framebuffer capture.

pub mod capture;
pub mod render_engine;

// Re-export main types
pub use capture::{compare_files, compare_images, CaptureError, ImageComparison};
pub use render_engine::{GpuError, Renderer, RendererConfig};
