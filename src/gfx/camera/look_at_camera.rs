use cgmath::*;

use super::camera_utils::Projection;

/// Viewpoint and projection used to render a scene
///
/// Matrices are derived from the current state on every call, so setters take
/// effect immediately.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    position: Vector3<f32>,
    target: Vector3<f32>,
    up: Vector3<f32>,
    projection: Projection,
}

impl Default for Camera {
    fn default() -> Self {
        Self::new(
            Vector3::new(0.0, 0.0, 3.0),
            Vector3::zero(),
            Vector3::unit_y(),
        )
    }
}

impl Camera {
    /// Creates a camera with the default 45° perspective projection
    pub fn new(position: Vector3<f32>, target: Vector3<f32>, up: Vector3<f32>) -> Self {
        Self {
            position,
            target,
            up,
            projection: Projection::default(),
        }
    }

    pub fn set_position(&mut self, position: Vector3<f32>) {
        self.position = position;
    }

    pub fn set_target(&mut self, target: Vector3<f32>) {
        self.target = target;
    }

    pub fn set_up(&mut self, up: Vector3<f32>) {
        self.up = up;
    }

    pub fn position(&self) -> Vector3<f32> {
        self.position
    }

    pub fn target(&self) -> Vector3<f32> {
        self.target
    }

    pub fn up(&self) -> Vector3<f32> {
        self.up
    }

    pub fn set_perspective(&mut self, fov_y_degrees: f32, aspect: f32, near: f32, far: f32) {
        self.projection = Projection::Perspective {
            fov_y_degrees,
            aspect,
            near,
            far,
        };
    }

    pub fn set_orthographic(
        &mut self,
        left: f32,
        right: f32,
        bottom: f32,
        top: f32,
        near: f32,
        far: f32,
    ) {
        self.projection = Projection::Orthographic {
            left,
            right,
            bottom,
            top,
            near,
            far,
        };
    }

    pub fn set_projection(&mut self, projection: Projection) {
        self.projection = projection;
    }

    pub fn projection(&self) -> Projection {
        self.projection
    }

    /// Keeps a perspective projection in step with the render target size
    pub fn resize_projection(&mut self, width: u32, height: u32) {
        if let Projection::Perspective { ref mut aspect, .. } = self.projection {
            *aspect = width as f32 / height.max(1) as f32;
        }
    }

    pub fn view_matrix(&self) -> Matrix4<f32> {
        let eye = Point3::from_vec(self.position);
        let target = Point3::from_vec(self.target);
        Matrix4::look_at_rh(eye, target, self.up)
    }

    pub fn projection_matrix(&self) -> Matrix4<f32> {
        self.projection.matrix()
    }

    pub fn view_projection_matrix(&self) -> Matrix4<f32> {
        self.projection_matrix() * self.view_matrix()
    }
}
