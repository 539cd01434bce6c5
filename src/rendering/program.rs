use std::mem::offset_of;

use bytemuck::{Pod, Zeroable};
use glam::{Mat3, Mat4, Vec4};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShaderId {
    VertexColor,
}

/// Byte offset of a uniform inside the per-object uniform block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UniformSlot(pub u32);

/// A compiled program plus the per-object uniforms it consumes. A `None`
/// slot means the program doesn't declare that uniform and it is not uploaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgramHandle {
    pub shader: ShaderId,
    pub object_to_clip_mat4: Option<UniformSlot>,
    pub object_to_view_mat4x3: Option<UniformSlot>,
    pub normal_to_view_mat3: Option<UniformSlot>,
}

/// This should match `ObjectUniforms` in vertex_color.wgsl
#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
pub struct ObjectUniformBlock {
    pub object_to_clip: Mat4,
    // Stored as a full mat4, the shader only reads the upper 4x3
    pub object_to_view: Mat4,
    // mat3x3 columns are padded to vec4 in uniform buffers
    pub normal_to_view: [Vec4; 3],
}

pub const OBJECT_UNIFORM_BLOCK_SIZE: usize = std::mem::size_of::<ObjectUniformBlock>();

impl ProgramHandle {
    pub const VERTEX_COLOR: ProgramHandle = ProgramHandle {
        shader: ShaderId::VertexColor,
        object_to_clip_mat4: Some(UniformSlot(
            offset_of!(ObjectUniformBlock, object_to_clip) as u32,
        )),
        object_to_view_mat4x3: Some(UniformSlot(
            offset_of!(ObjectUniformBlock, object_to_view) as u32,
        )),
        normal_to_view_mat3: Some(UniformSlot(
            offset_of!(ObjectUniformBlock, normal_to_view) as u32,
        )),
    };
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UniformValue {
    Mat4(Mat4),
    Mat4x3(Mat4),
    Mat3(Mat3),
}

impl UniformValue {
    /// Writes the value into a uniform block at `slot`, using WGSL uniform
    /// layout (mat3 columns padded to 16 bytes).
    pub fn write_to(&self, block: &mut [u8], slot: UniformSlot) {
        let offset = slot.0 as usize;
        match self {
            UniformValue::Mat4(matrix) | UniformValue::Mat4x3(matrix) => {
                let bytes = bytemuck::bytes_of(matrix);
                block[offset..offset + bytes.len()].copy_from_slice(bytes);
            }
            UniformValue::Mat3(matrix) => {
                let columns = [
                    matrix.x_axis.extend(0.0),
                    matrix.y_axis.extend(0.0),
                    matrix.z_axis.extend(0.0),
                ];
                let bytes: &[u8] = bytemuck::cast_slice(&columns);
                block[offset..offset + bytes.len()].copy_from_slice(bytes);
            }
        }
    }
}
