use cgmath::{Matrix4, SquareMatrix, Vector3};

use super::object::{SceneObject, SharedMaterial, SharedMesh};

/// Ordered collection of scene objects
///
/// Insertion order is draw order. The scene shares meshes and materials with
/// the caller; clearing it drops only the scene's handles.
#[derive(Debug, Default)]
pub struct Scene {
    objects: Vec<SceneObject>,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an object. Duplicates are allowed and there is no capacity limit.
    pub fn add_object(
        &mut self,
        mesh: Option<SharedMesh>,
        material: Option<SharedMaterial>,
        transform: Matrix4<f32>,
        color: Vector3<f32>,
    ) {
        self.objects
            .push(SceneObject::new(mesh, material, transform, color));
    }

    /// Appends an object with identity transform and white tint
    pub fn add_object_default(&mut self, mesh: SharedMesh, material: SharedMaterial) {
        self.add_object(
            Some(mesh),
            Some(material),
            Matrix4::identity(),
            Vector3::new(1.0, 1.0, 1.0),
        );
    }

    pub fn push(&mut self, object: SceneObject) {
        self.objects.push(object);
    }

    pub fn clear(&mut self) {
        self.objects.clear();
    }

    pub fn objects(&self) -> &[SceneObject] {
        &self.objects
    }

    /// Gets the total number of objects
    pub fn object_count(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Gets immutable reference to an object by index
    pub fn get_object(&self, index: usize) -> Option<&SceneObject> {
        self.objects.get(index)
    }

    /// Gets mutable reference to an object by index
    pub fn get_object_mut(&mut self, index: usize) -> Option<&mut SceneObject> {
        self.objects.get_mut(index)
    }

    /// Gets statistics about the scene
    ///
    /// Geometry shared by several objects is counted once per object.
    pub fn statistics(&self) -> SceneStatistics {
        let mut stats = SceneStatistics {
            object_count: self.objects.len(),
            ..SceneStatistics::default()
        };

        for mesh in self.objects.iter().filter_map(|obj| obj.mesh.as_ref()) {
            let mesh = mesh.borrow();
            stats.total_vertices += mesh.vertex_count();
            stats.total_triangles += mesh.triangle_count();
        }

        stats
    }
}

/// Scene statistics for debugging and benchmark reports
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SceneStatistics {
    pub object_count: usize,
    pub total_vertices: usize,
    pub total_triangles: usize,
}

#[cfg(test)]
mod tests {
    use std::{cell::RefCell, rc::Rc};

    use super::*;
    use crate::gfx::geometry::{cube, plane};

    #[test]
    fn add_object_increments_count() {
        let mut scene = Scene::new();
        assert!(scene.is_empty());

        let mesh = Rc::new(RefCell::new(cube()));
        scene.add_object(
            Some(mesh.clone()),
            None,
            Matrix4::from_translation(Vector3::new(1.0, 0.0, 0.0)),
            Vector3::new(1.0, 0.0, 0.0),
        );
        scene.add_object(Some(mesh.clone()), None, Matrix4::identity(), Vector3::new(0.0, 1.0, 0.0));

        assert_eq!(scene.object_count(), 2);
        assert_eq!(Rc::strong_count(&mesh), 3);
        assert!(!scene.get_object(0).unwrap().is_drawable());
        assert!(scene.get_object(2).is_none());
    }

    #[test]
    fn clear_resets_count_and_releases_handles() {
        let mut scene = Scene::new();
        let mesh = Rc::new(RefCell::new(plane(1.0, 1.0)));
        for _ in 0..3 {
            scene.add_object(Some(mesh.clone()), None, Matrix4::identity(), Vector3::new(1.0, 1.0, 1.0));
        }

        scene.clear();
        assert_eq!(scene.object_count(), 0);
        assert_eq!(Rc::strong_count(&mesh), 1);
    }

    #[test]
    fn objects_keep_insertion_order() {
        let mut scene = Scene::new();
        for i in 0..5 {
            scene.add_object(
                None,
                None,
                Matrix4::identity(),
                Vector3::new(i as f32, 0.0, 0.0),
            );
        }
        let reds: Vec<f32> = scene.objects().iter().map(|obj| obj.color.x).collect();
        assert_eq!(reds, vec![0.0, 1.0, 2.0, 3.0, 4.0]);
    }

    #[test]
    fn statistics_sum_mesh_geometry() {
        let mut scene = Scene::new();
        let cube = Rc::new(RefCell::new(cube()));
        let floor = Rc::new(RefCell::new(plane(10.0, 10.0)));
        scene.add_object(Some(cube.clone()), None, Matrix4::identity(), Vector3::new(1.0, 1.0, 1.0));
        scene.add_object(Some(cube), None, Matrix4::identity(), Vector3::new(1.0, 1.0, 1.0));
        scene.add_object(Some(floor), None, Matrix4::identity(), Vector3::new(1.0, 1.0, 1.0));
        scene.add_object(None, None, Matrix4::identity(), Vector3::new(1.0, 1.0, 1.0));

        assert_eq!(
            scene.statistics(),
            SceneStatistics {
                object_count: 4,
                total_vertices: 8 + 8 + 4,
                total_triangles: 12 + 12 + 2,
            }
        );
    }
}
