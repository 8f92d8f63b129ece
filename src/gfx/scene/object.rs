use std::{cell::RefCell, rc::Rc};

use cgmath::{Deg, Matrix4, SquareMatrix, Vector3};

use crate::gfx::{geometry::Mesh, resources::material::Material};

/// Mesh handle shared between scene objects
pub type SharedMesh = Rc<RefCell<Mesh>>;

/// Material handle shared between scene objects
pub type SharedMaterial = Rc<RefCell<Material>>;

/// One drawable entry of a scene
///
/// Objects without a mesh or material stay in the scene but are not drawn.
#[derive(Debug, Clone)]
pub struct SceneObject {
    pub mesh: Option<SharedMesh>,
    pub material: Option<SharedMaterial>,
    /// Model matrix (object space to world space)
    pub transform: Matrix4<f32>,
    /// Tint written to the `color` uniform
    pub color: Vector3<f32>,
}

impl Default for SceneObject {
    fn default() -> Self {
        Self {
            mesh: None,
            material: None,
            transform: Matrix4::identity(),
            color: Vector3::new(1.0, 1.0, 1.0),
        }
    }
}

impl SceneObject {
    pub fn new(
        mesh: Option<SharedMesh>,
        material: Option<SharedMaterial>,
        transform: Matrix4<f32>,
        color: Vector3<f32>,
    ) -> Self {
        Self {
            mesh,
            material,
            transform,
            color,
        }
    }

    /// True when both a mesh and a material are attached
    pub fn is_drawable(&self) -> bool {
        self.mesh.is_some() && self.material.is_some()
    }

    /// Set translation
    pub fn set_translation(&mut self, translation: Vector3<f32>) {
        self.transform = Matrix4::from_translation(translation);
    }

    /// Apply rotation around Y axis
    pub fn rotate_y(&mut self, angle: Deg<f32>) {
        self.transform = self.transform * Matrix4::from_angle_y(angle);
    }

    /// Create a complete transform from translation, rotation, and scale
    pub fn set_transform_trs(
        &mut self,
        translation: Vector3<f32>,
        rotation_y: Deg<f32>,
        scale: f32,
    ) {
        let t = Matrix4::from_translation(translation);
        let r = Matrix4::from_angle_y(rotation_y);
        let s = Matrix4::from_scale(scale);
        self.transform = t * r * s; // Order matters: T * R * S
    }
}
