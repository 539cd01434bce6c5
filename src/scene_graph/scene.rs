use glam::{Mat3, Mat4};
use id_arena::Arena;
use thiserror::Error;

use crate::asset_pipeline::mesh_buffer::VertexArrayId;
use crate::rendering::frame::{DrawCall, DrawList};
use crate::rendering::program::{ProgramHandle, UniformValue};
use crate::scene_graph::camera::{Camera, CameraId};
use crate::scene_graph::object::{Object, ObjectId};
use crate::scene_graph::transform::{Transform, TransformId};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SceneError {
    #[error("transform does not belong to this scene")]
    ForeignTransform,
    #[error("parenting would create a cycle in the transform hierarchy")]
    ParentCycle,
}

/// Owns every transform, object and camera of one mode. Handles stay valid
/// for as long as the scene lives; dropping the scene drops all nodes.
pub struct Scene {
    transforms: Arena<Transform>,
    objects: Arena<Object>,
    cameras: Arena<Camera>,
}

impl Scene {
    pub fn new() -> Self {
        Self {
            transforms: Arena::new(),
            objects: Arena::new(),
            cameras: Arena::new(),
        }
    }

    pub fn new_transform(&mut self) -> TransformId {
        self.transforms.alloc(Transform::default())
    }

    pub fn add_transform(&mut self, transform: Transform) -> TransformId {
        self.transforms.alloc(transform)
    }

    pub fn new_object(
        &mut self,
        transform: TransformId,
        program: ProgramHandle,
        vertex_array: VertexArrayId,
        start: u32,
        count: u32,
    ) -> Result<ObjectId, SceneError> {
        self.check_owned(transform)?;

        Ok(self.objects.alloc(Object {
            transform,
            program,
            vertex_array,
            start,
            count,
        }))
    }

    pub fn new_camera(&mut self, transform: TransformId) -> Result<CameraId, SceneError> {
        self.check_owned(transform)?;
        Ok(self.cameras.alloc(Camera::new(transform)))
    }

    fn check_owned(&self, transform: TransformId) -> Result<(), SceneError> {
        // id_arena refuses ids minted by another arena
        match self.transforms.get(transform) {
            Some(_) => Ok(()),
            None => Err(SceneError::ForeignTransform),
        }
    }

    pub fn set_parent(
        &mut self,
        child: TransformId,
        parent: Option<TransformId>,
    ) -> Result<(), SceneError> {
        self.check_owned(child)?;

        if let Some(parent) = parent {
            self.check_owned(parent)?;

            let mut ancestor = Some(parent);
            while let Some(id) = ancestor {
                if id == child {
                    return Err(SceneError::ParentCycle);
                }
                ancestor = self.transforms[id].parent();
            }
        }

        self.transforms[child].set_parent_unchecked(parent);
        Ok(())
    }

    pub fn transform(&self, id: TransformId) -> Option<&Transform> {
        self.transforms.get(id)
    }

    pub fn transform_mut(&mut self, id: TransformId) -> Option<&mut Transform> {
        self.transforms.get_mut(id)
    }

    pub fn camera(&self, id: CameraId) -> Option<&Camera> {
        self.cameras.get(id)
    }

    pub fn camera_mut(&mut self, id: CameraId) -> Option<&mut Camera> {
        self.cameras.get_mut(id)
    }

    #[cfg(test)]
    pub fn transforms(&self) -> impl Iterator<Item = (TransformId, &Transform)> {
        self.transforms.iter()
    }

    #[cfg(test)]
    pub fn objects(&self) -> impl Iterator<Item = (ObjectId, &Object)> {
        self.objects.iter()
    }

    pub fn transform_count(&self) -> usize {
        self.transforms.len()
    }

    pub fn object_count(&self) -> usize {
        self.objects.len()
    }

    /// Composes the local transforms from the root down to `id`. Recomputed on
    /// every call.
    pub fn world_transform(&self, id: TransformId) -> Mat4 {
        let mut world = Mat4::IDENTITY;
        let mut current = self.transforms.get(id);

        while let Some(transform) = current {
            world = transform.make_local_to_parent() * world;
            current = transform.parent().and_then(|parent| self.transforms.get(parent));
        }

        world
    }

    pub fn world_to_local(&self, id: TransformId) -> Mat4 {
        let mut local = Mat4::IDENTITY;
        let mut current = self.transforms.get(id);

        while let Some(transform) = current {
            local *= transform.make_parent_to_local();
            current = transform.parent().and_then(|parent| self.transforms.get(parent));
        }

        local
    }

    /// Emits one draw call per object as seen from `camera`.
    pub fn draw(&self, camera: CameraId, draw_list: &mut DrawList) {
        let Some(camera) = self.cameras.get(camera) else {
            log::warn!("Scene::draw called with a camera from another scene");
            return;
        };

        let world_to_camera = self.world_to_local(camera.transform);
        let world_to_clip = camera.make_projection() * world_to_camera;

        for (_, object) in self.objects.iter() {
            let local_to_world = self.world_transform(object.transform);
            let object_to_view = world_to_camera * local_to_world;
            let program = &object.program;

            let mut uniforms = Vec::with_capacity(3);
            if let Some(slot) = program.object_to_clip_mat4 {
                uniforms.push((slot, UniformValue::Mat4(world_to_clip * local_to_world)));
            }
            if let Some(slot) = program.object_to_view_mat4x3 {
                uniforms.push((slot, UniformValue::Mat4x3(object_to_view)));
            }
            if let Some(slot) = program.normal_to_view_mat3 {
                let normal = Mat3::from_mat4(object_to_view).transpose().inverse();
                uniforms.push((slot, UniformValue::Mat3(normal)));
            }

            draw_list.push(DrawCall {
                shader: program.shader,
                vertex_array: object.vertex_array,
                start: object.start,
                count: object.count,
                uniforms,
            });
        }
    }
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::{Quat, Vec3, Vec4};

    fn transform(position: Vec3, rotation: Quat, scale: Vec3) -> Transform {
        Transform {
            position,
            rotation,
            scale,
            ..Default::default()
        }
    }

    fn three_level_scene() -> (Scene, [TransformId; 3]) {
        let mut scene = Scene::new();
        let root = scene.add_transform(transform(
            Vec3::new(1.0, 2.0, 3.0),
            Quat::from_rotation_z(0.5),
            Vec3::new(2.0, 2.0, 1.0),
        ));
        let middle = scene.add_transform(transform(
            Vec3::new(0.0, 1.5, 0.0),
            Quat::from_rotation_x(-1.2),
            Vec3::new(0.5, 1.0, 3.0),
        ));
        let leaf = scene.add_transform(transform(
            Vec3::new(-4.0, 0.0, 0.25),
            Quat::from_rotation_y(2.0),
            Vec3::ONE,
        ));
        scene.set_parent(middle, Some(root)).unwrap();
        scene.set_parent(leaf, Some(middle)).unwrap();
        (scene, [root, middle, leaf])
    }

    #[test]
    fn root_world_transform_is_local() {
        let (scene, [root, ..]) = three_level_scene();
        let local = scene.transform(root).unwrap().make_local_to_parent();

        assert!(scene.world_transform(root).abs_diff_eq(local, 1e-6));
    }

    #[test]
    fn child_world_is_parent_world_times_local() {
        let (scene, [root, middle, leaf]) = three_level_scene();

        for (parent, child) in [(root, middle), (middle, leaf)] {
            let expected = scene.world_transform(parent)
                * scene.transform(child).unwrap().make_local_to_parent();
            assert!(scene.world_transform(child).abs_diff_eq(expected, 1e-5));
        }
    }

    #[test]
    fn world_to_local_inverts_world_transform() {
        let (scene, [_, _, leaf]) = three_level_scene();

        let product = scene.world_to_local(leaf) * scene.world_transform(leaf);

        assert!(product.abs_diff_eq(Mat4::IDENTITY, 1e-4));
    }

    #[test]
    fn world_transform_sees_parent_mutation() {
        let (mut scene, [root, _, leaf]) = three_level_scene();
        let before = scene.world_transform(leaf).w_axis;

        scene
            .transform_mut(root)
            .unwrap()
            .translate(Vec3::new(0.0, 0.0, 10.0));

        let after = scene.world_transform(leaf).w_axis;
        assert!((after - before).abs_diff_eq(Vec4::new(0.0, 0.0, 10.0, 0.0), 1e-5));
    }

    #[test]
    fn rejects_parent_cycles() {
        let (mut scene, [root, _, leaf]) = three_level_scene();

        assert_eq!(
            scene.set_parent(root, Some(leaf)),
            Err(SceneError::ParentCycle)
        );
        assert_eq!(
            scene.set_parent(root, Some(root)),
            Err(SceneError::ParentCycle)
        );
        assert_eq!(scene.transform(root).unwrap().parent(), None);
    }

    #[test]
    fn rejects_transforms_from_another_scene() {
        let mut other = Scene::new();
        let foreign = other.new_transform();
        let mut scene = Scene::new();

        let result = scene.new_object(
            foreign,
            ProgramHandle::VERTEX_COLOR,
            VertexArrayId(0),
            0,
            3,
        );

        assert_eq!(result.err(), Some(SceneError::ForeignTransform));
        assert_eq!(scene.new_camera(foreign).err(), Some(SceneError::ForeignTransform));
        assert_eq!(scene.object_count(), 0);
    }

    #[test]
    fn draw_emits_matrices_for_declared_slots() {
        let mut scene = Scene::new();
        let object_transform = scene.add_transform(Transform::from_translation(Vec3::new(
            0.0, 0.0, -5.0,
        )));
        scene
            .new_object(
                object_transform,
                ProgramHandle::VERTEX_COLOR,
                VertexArrayId(1),
                6,
                12,
            )
            .unwrap();
        let camera_transform = scene.new_transform();
        let camera = scene.new_camera(camera_transform).unwrap();

        let mut draw_list = Vec::new();
        scene.draw(camera, &mut draw_list);

        assert_eq!(draw_list.len(), 1);
        let call = &draw_list[0];
        assert_eq!((call.start, call.count), (6, 12));
        assert_eq!(call.vertex_array, VertexArrayId(1));
        assert_eq!(call.uniforms.len(), 3);

        let object_to_view = call
            .uniforms
            .iter()
            .find_map(|(_, value)| match value {
                UniformValue::Mat4x3(matrix) => Some(*matrix),
                _ => None,
            })
            .unwrap();
        assert!(object_to_view
            .w_axis
            .abs_diff_eq(Vec4::new(0.0, 0.0, -5.0, 1.0), 1e-6));
    }

    #[test]
    fn draw_skips_undeclared_slots() {
        let mut scene = Scene::new();
        let transform = scene.new_transform();
        let program = ProgramHandle {
            object_to_view_mat4x3: None,
            normal_to_view_mat3: None,
            ..ProgramHandle::VERTEX_COLOR
        };
        scene
            .new_object(transform, program, VertexArrayId(0), 0, 3)
            .unwrap();
        let camera = scene.new_camera(transform).unwrap();

        let mut draw_list = Vec::new();
        scene.draw(camera, &mut draw_list);

        assert_eq!(draw_list[0].uniforms.len(), 1);
        assert!(matches!(draw_list[0].uniforms[0].1, UniformValue::Mat4(_)));
    }
}
