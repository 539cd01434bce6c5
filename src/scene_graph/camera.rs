use glam::Mat4;
use id_arena::Id;

use crate::scene_graph::transform::TransformId;

pub type CameraId = Id<Camera>;

/// Perspective camera looking down its transform's local -Z.
#[derive(Debug, Clone)]
pub struct Camera {
    pub transform: TransformId,
    /// Vertical field of view in radians.
    pub fovy: f32,
    pub aspect: f32,
    pub near: f32,
}

impl Camera {
    pub fn new(transform: TransformId) -> Self {
        Self {
            transform,
            fovy: 60.0_f32.to_radians(),
            aspect: 1.0,
            near: 0.01,
        }
    }

    pub fn make_projection(&self) -> Mat4 {
        Mat4::perspective_infinite_rh(self.fovy, self.aspect, self.near)
    }
}
