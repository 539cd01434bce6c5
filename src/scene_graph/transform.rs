use glam::{Mat4, Quat, Vec3};
use id_arena::Id;

pub type TransformId = Id<Transform>;

/// A position/rotation/scale node. The parent link is a handle into the
/// owning scene's arena, never a reference.
#[derive(Debug, Clone)]
pub struct Transform {
    pub name: String,
    pub position: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
    pub(super) parent: Option<TransformId>,
}

impl Transform {
    pub fn from_translation(position: Vec3) -> Self {
        Self {
            position,
            ..Default::default()
        }
    }

    pub fn parent(&self) -> Option<TransformId> {
        self.parent
    }

    pub(super) fn set_parent_unchecked(&mut self, parent: Option<TransformId>) {
        self.parent = parent;
    }

    /// Scale, then rotate, then translate.
    pub fn make_local_to_parent(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.position)
    }

    pub fn make_parent_to_local(&self) -> Mat4 {
        let inverse_scale = Vec3::ONE / self.scale;
        Mat4::from_scale(inverse_scale)
            * Mat4::from_quat(self.rotation.inverse())
            * Mat4::from_translation(-self.position)
    }

    pub fn translate(&mut self, delta: Vec3) {
        self.position += delta;
    }

    /// Applies `rotation` in the local frame and renormalizes to keep
    /// accumulated rotations from drifting.
    pub fn rotate_local(&mut self, rotation: Quat) {
        self.rotation = (self.rotation * rotation).normalize();
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            name: String::new(),
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
            parent: None,
        }
    }
}
