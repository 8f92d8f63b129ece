//! Built-in WGSL programs

/// Vertex stage of the basic tinted program
pub const BASIC_VERTEX: &str = include_str!("../shaders/basic.vert.wgsl");

/// Fragment stage of the basic tinted program
pub const BASIC_FRAGMENT: &str = include_str!("../shaders/basic.frag.wgsl");
