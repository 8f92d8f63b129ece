// src/wgpu_utils/binding_types.rs
//! WGPU binding type utilities

use std::num::NonZeroU64;

/// Uniform buffer bound at a dynamic offset, `size` bytes per binding
pub fn uniform_dynamic(size: u64) -> wgpu::BindingType {
    wgpu::BindingType::Buffer {
        ty: wgpu::BufferBindingType::Uniform,
        has_dynamic_offset: true,
        min_binding_size: NonZeroU64::new(size),
    }
}
