use id_arena::Id;

use crate::asset_pipeline::mesh_buffer::VertexArrayId;
use crate::rendering::program::ProgramHandle;
use crate::scene_graph::transform::TransformId;

pub type ObjectId = Id<Object>;

/// A drawable sub-mesh placed at a transform.
#[derive(Debug, Clone)]
pub struct Object {
    pub transform: TransformId,
    pub program: ProgramHandle,
    pub vertex_array: VertexArrayId,
    pub start: u32,
    pub count: u32,
}
