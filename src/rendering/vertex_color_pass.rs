use std::collections::HashMap;

use wgpu::{
    DepthBiasState, MultisampleState, PipelineCompilationOptions, RenderPassDescriptor,
    ShaderSource, StencilState,
};

use crate::asset_pipeline::mesh_buffer::VertexArrayId;
use crate::rendering::frame::{DrawCall, Lighting};
use crate::rendering::mesh_buffers::{GpuMeshBuffer, VERTEX_LAYOUT};
use crate::rendering::program::{ShaderId, OBJECT_UNIFORM_BLOCK_SIZE};
use crate::rendering::texture::DepthTexture;

/// Per-object uniform blocks are placed at multiples of this. It's the
/// default `min_uniform_buffer_offset_alignment`.
pub const OBJECT_UNIFORM_STRIDE: usize = 256;

const _: () = assert!(OBJECT_UNIFORM_BLOCK_SIZE <= OBJECT_UNIFORM_STRIDE);

const INITIAL_OBJECT_CAPACITY: usize = 64;

/// Packs each draw call's uniforms into its own block at a fixed stride.
/// Slots the program didn't declare stay zeroed.
pub fn pack_object_uniforms(draw_calls: &[DrawCall]) -> Vec<u8> {
    let mut bytes = vec![0u8; draw_calls.len() * OBJECT_UNIFORM_STRIDE];

    for (call, block) in draw_calls
        .iter()
        .zip(bytes.chunks_exact_mut(OBJECT_UNIFORM_STRIDE))
    {
        for (slot, value) in &call.uniforms {
            value.write_to(&mut block[..OBJECT_UNIFORM_BLOCK_SIZE], *slot);
        }
    }

    bytes
}

pub struct VertexColorTargets<'a> {
    pub color: &'a wgpu::TextureView,
    pub depth: &'a wgpu::TextureView,
}

/// Draws vertex-colored meshes with depth testing and alpha blending.
pub struct VertexColorPass {
    pipeline: wgpu::RenderPipeline,
    lighting_buffer: wgpu::Buffer,
    lighting_bind_group: wgpu::BindGroup,
    object_bind_group_layout: wgpu::BindGroupLayout,
    object_buffer: wgpu::Buffer,
    object_bind_group: wgpu::BindGroup,
    object_capacity: usize,
}

impl VertexColorPass {
    pub fn new(device: &wgpu::Device, color_format: wgpu::TextureFormat) -> Self {
        let lighting_bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("lighting_bind_group_layout"),
                entries: &[wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                }],
            });

        let object_bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("object_bind_group_layout"),
                entries: &[wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: true,
                        min_binding_size: wgpu::BufferSize::new(OBJECT_UNIFORM_BLOCK_SIZE as u64),
                    },
                    count: None,
                }],
            });

        let lighting_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Lighting uniform buffer"),
            size: std::mem::size_of::<Lighting>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let lighting_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("lighting_bind_group"),
            layout: &lighting_bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: lighting_buffer.as_entire_binding(),
            }],
        });

        let (object_buffer, object_bind_group) =
            create_object_buffer(device, &object_bind_group_layout, INITIAL_OBJECT_CAPACITY);

        let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Vertex color pipeline layout"),
            bind_group_layouts: &[&lighting_bind_group_layout, &object_bind_group_layout],
            push_constant_ranges: &[],
        });

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Vertex color shader"),
            source: ShaderSource::Wgsl(include_str!("vertex_color.wgsl").into()),
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Vertex color render pipeline"),
            layout: Some(&layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                buffers: &[VERTEX_LAYOUT],
                compilation_options: PipelineCompilationOptions::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: color_format,
                    blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: PipelineCompilationOptions::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: None,
                polygon_mode: wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: DepthTexture::DEPTH_FORMAT,
                depth_write_enabled: true,
                depth_compare: wgpu::CompareFunction::Less,
                stencil: StencilState::default(),
                bias: DepthBiasState::default(),
            }),
            multisample: MultisampleState::default(),
            multiview: None,
            cache: None,
        });

        Self {
            pipeline,
            lighting_buffer,
            lighting_bind_group,
            object_bind_group_layout,
            object_buffer,
            object_bind_group,
            object_capacity: INITIAL_OBJECT_CAPACITY,
        }
    }

    /// Uploads lighting and per-object uniforms for this frame's draws.
    pub fn prepare(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        lighting: &Lighting,
        draw_calls: &[DrawCall],
    ) {
        queue.write_buffer(&self.lighting_buffer, 0, bytemuck::bytes_of(lighting));

        if draw_calls.len() > self.object_capacity {
            let capacity = draw_calls.len().next_power_of_two();
            let (buffer, bind_group) =
                create_object_buffer(device, &self.object_bind_group_layout, capacity);
            self.object_buffer = buffer;
            self.object_bind_group = bind_group;
            self.object_capacity = capacity;
            log::debug!("Grew object uniform buffer to {} blocks", capacity);
        }

        if !draw_calls.is_empty() {
            queue.write_buffer(&self.object_buffer, 0, &pack_object_uniforms(draw_calls));
        }
    }

    pub fn render(
        &self,
        targets: &VertexColorTargets,
        encoder: &mut wgpu::CommandEncoder,
        meshes: &HashMap<VertexArrayId, GpuMeshBuffer>,
        draw_calls: &[DrawCall],
    ) {
        let mut render_pass = encoder.begin_render_pass(&RenderPassDescriptor {
            label: Some("Vertex color pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: targets.color,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Load,
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: targets.depth,
                depth_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Clear(1.0),
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: None,
            }),
            occlusion_query_set: None,
            timestamp_writes: None,
        });

        render_pass.set_pipeline(&self.pipeline);
        render_pass.set_bind_group(0, &self.lighting_bind_group, &[]);

        for (index, call) in draw_calls.iter().enumerate() {
            if call.shader != ShaderId::VertexColor {
                continue;
            }

            let Some(mesh) = meshes.get(&call.vertex_array) else {
                log::warn!("Draw call uses unknown vertex array {:?}", call.vertex_array);
                continue;
            };

            let offset = (index * OBJECT_UNIFORM_STRIDE) as u32;
            render_pass.set_bind_group(1, &self.object_bind_group, &[offset]);
            render_pass.set_vertex_buffer(0, mesh.vertices.slice(..));
            render_pass.set_index_buffer(mesh.indices.slice(..), wgpu::IndexFormat::Uint32);
            render_pass.draw_indexed(call.start..call.start + call.count, 0, 0..1);
        }
    }
}

fn create_object_buffer(
    device: &wgpu::Device,
    layout: &wgpu::BindGroupLayout,
    capacity: usize,
) -> (wgpu::Buffer, wgpu::BindGroup) {
    let buffer = device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("Object uniform buffer"),
        size: (capacity * OBJECT_UNIFORM_STRIDE) as u64,
        usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    });

    let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some("object_bind_group"),
        layout,
        entries: &[wgpu::BindGroupEntry {
            binding: 0,
            resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                buffer: &buffer,
                offset: 0,
                size: wgpu::BufferSize::new(OBJECT_UNIFORM_BLOCK_SIZE as u64),
            }),
        }],
    });

    (buffer, bind_group)
}

#[cfg(test)]
mod tests {
    use glam::Mat4;

    use super::*;
    use crate::rendering::program::{ObjectUniformBlock, UniformSlot, UniformValue};

    fn call(uniforms: Vec<(UniformSlot, UniformValue)>) -> DrawCall {
        DrawCall {
            shader: ShaderId::VertexColor,
            vertex_array: VertexArrayId(0),
            start: 0,
            count: 3,
            uniforms,
        }
    }

    #[test]
    fn packs_each_call_at_its_own_stride() {
        let first = Mat4::from_translation(glam::Vec3::X);
        let second = Mat4::from_scale(glam::Vec3::splat(2.0));
        let calls = vec![
            call(vec![(UniformSlot(0), UniformValue::Mat4(first))]),
            call(vec![(UniformSlot(64), UniformValue::Mat4x3(second))]),
        ];

        let bytes = pack_object_uniforms(&calls);

        assert_eq!(bytes.len(), 2 * OBJECT_UNIFORM_STRIDE);
        let block: ObjectUniformBlock =
            bytemuck::pod_read_unaligned(&bytes[..OBJECT_UNIFORM_BLOCK_SIZE]);
        assert_eq!(block.object_to_clip, first);
        assert_eq!(block.object_to_view, Mat4::ZERO);

        let offset = OBJECT_UNIFORM_STRIDE;
        let block: ObjectUniformBlock =
            bytemuck::pod_read_unaligned(&bytes[offset..offset + OBJECT_UNIFORM_BLOCK_SIZE]);
        assert_eq!(block.object_to_clip, Mat4::ZERO);
        assert_eq!(block.object_to_view, second);
    }
}
