pub mod camera_utils;
pub mod look_at_camera;

// Re-export main types
pub use camera_utils::{Projection, OPENGL_TO_WGPU_MATRIX};
pub use look_at_camera::Camera;
