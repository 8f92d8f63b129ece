// src/gfx/resources/mod.rs
//! GPU resource management
//!
//! Materials (linked shader programs and their uniforms), uniform block
//! reflection, and the textures the renderer draws into.

pub mod material;
pub mod texture_resource;
pub mod uniform_layout;

// Re-export main types
pub use material::{Material, MaterialError, ShaderStage, UniformValue};
pub use texture_resource::TextureResource;
pub use uniform_layout::{UniformBlockLayout, UniformKind, UniformSlot};
