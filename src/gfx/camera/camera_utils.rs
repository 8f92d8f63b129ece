use cgmath::{ortho, perspective, Deg, Matrix4};

/// Maps OpenGL clip space depth [-1, 1] onto wgpu's [0, 1]
///
/// `Matrix4::new` is column-major: `z' = 0.5 * z + 0.5 * w`.
#[rustfmt::skip]
pub const OPENGL_TO_WGPU_MATRIX: cgmath::Matrix4<f32> = cgmath::Matrix4::new(
    1.0, 0.0, 0.0, 0.0,
    0.0, 1.0, 0.0, 0.0,
    0.0, 0.0, 0.5, 0.0,
    0.0, 0.0, 0.5, 1.0,
);

/// Projection mode of a camera. Switching modes replaces every parameter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Projection {
    Perspective {
        /// Vertical field of view in degrees
        fov_y_degrees: f32,
        aspect: f32,
        near: f32,
        far: f32,
    },
    Orthographic {
        left: f32,
        right: f32,
        bottom: f32,
        top: f32,
        near: f32,
        far: f32,
    },
}

impl Projection {
    pub const DEFAULT_FOV_Y_DEGREES: f32 = 45.0;
    pub const DEFAULT_ASPECT: f32 = 16.0 / 9.0;
    pub const DEFAULT_NEAR: f32 = 0.1;
    pub const DEFAULT_FAR: f32 = 100.0;

    /// Projection matrix in wgpu clip space
    pub fn matrix(&self) -> Matrix4<f32> {
        let gl = match *self {
            Projection::Perspective {
                fov_y_degrees,
                aspect,
                near,
                far,
            } => perspective(Deg(fov_y_degrees), aspect, near, far),
            Projection::Orthographic {
                left,
                right,
                bottom,
                top,
                near,
                far,
            } => ortho(left, right, bottom, top, near, far),
        };
        OPENGL_TO_WGPU_MATRIX * gl
    }

    pub fn is_orthographic(&self) -> bool {
        matches!(self, Projection::Orthographic { .. })
    }

    pub fn near(&self) -> f32 {
        match *self {
            Projection::Perspective { near, .. } | Projection::Orthographic { near, .. } => near,
        }
    }

    pub fn far(&self) -> f32 {
        match *self {
            Projection::Perspective { far, .. } | Projection::Orthographic { far, .. } => far,
        }
    }
}

impl Default for Projection {
    fn default() -> Self {
        Projection::Perspective {
            fov_y_degrees: Self::DEFAULT_FOV_Y_DEGREES,
            aspect: Self::DEFAULT_ASPECT,
            near: Self::DEFAULT_NEAR,
            far: Self::DEFAULT_FAR,
        }
    }
}
