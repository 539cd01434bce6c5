use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Context;
use glam::UVec2;
use wgpu::CommandEncoderDescriptor;
use winit::window::Window;

use crate::asset_pipeline::mesh_buffer::{MeshBuffer, VertexArrayId};
use crate::rendering::frame::{Frame, Lighting};
use crate::rendering::imgui_renderer::ImguiRendererState;
use crate::rendering::mesh_buffers::GpuMeshBuffer;
use crate::rendering::texture::DepthTexture;
use crate::rendering::vertex_color_pass::{VertexColorPass, VertexColorTargets};

const CLEAR_COLOR: wgpu::Color = wgpu::Color {
    r: 0.5,
    g: 0.5,
    b: 0.5,
    a: 1.0,
};

pub struct Renderer {
    pub window: Arc<Window>,
    pub size: UVec2,

    surface: wgpu::Surface<'static>,
    surface_config: wgpu::SurfaceConfiguration,
    device: wgpu::Device,
    queue: wgpu::Queue,

    depth_texture: DepthTexture,
    vertex_color_pass: VertexColorPass,
    imgui_renderer: ImguiRendererState,
    meshes: HashMap<VertexArrayId, GpuMeshBuffer>,
}

impl Renderer {
    pub async fn new(window: Arc<Window>, imgui: &mut imgui::Context) -> anyhow::Result<Renderer> {
        let inner_size = window.inner_size();
        let size = UVec2::new(inner_size.width.max(1), inner_size.height.max(1));

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor::default());
        let surface = instance
            .create_surface(window.clone())
            .context("Failed to create surface")?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .context("No suitable graphics adapter")?;

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                label: None,
                memory_hints: Default::default(),
                trace: wgpu::Trace::Off,
            })
            .await
            .context("Failed to create device")?;

        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .copied()
            .or_else(|| surface_caps.formats.first().copied())
            .context("Surface supports no formats")?;

        let surface_config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.x,
            height: size.y,
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode: surface_caps
                .alpha_modes
                .first()
                .copied()
                .unwrap_or(wgpu::CompositeAlphaMode::Auto),
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &surface_config);

        let depth_texture = DepthTexture::new(&device, size, "Depth Texture");
        let vertex_color_pass = VertexColorPass::new(&device, surface_format);
        let imgui_renderer = ImguiRendererState::new(&device, &queue, surface_format, imgui);

        log::info!(
            "Renderer ready on {:?}, surface format {:?}",
            adapter.get_info().name,
            surface_format
        );

        Ok(Self {
            window,
            size,
            surface,
            surface_config,
            device,
            queue,
            depth_texture,
            vertex_color_pass,
            imgui_renderer,
            meshes: HashMap::new(),
        })
    }

    pub fn upload_mesh_buffer(&mut self, mesh_buffer: &MeshBuffer) {
        let gpu_buffer = GpuMeshBuffer::new(&self.device, mesh_buffer);
        log::info!(
            "Uploaded vertex array {:?}: {} vertices, {} indices",
            mesh_buffer.vertex_array,
            mesh_buffer.vertices.len(),
            gpu_buffer.index_count
        );
        self.meshes.insert(mesh_buffer.vertex_array, gpu_buffer);
    }

    pub fn resize(&mut self, new_size: UVec2) {
        if new_size.x > 0 && new_size.y > 0 {
            self.size = new_size;
            self.surface_config.width = new_size.x;
            self.surface_config.height = new_size.y;
            self.surface.configure(&self.device, &self.surface_config);
            self.depth_texture.resize(&self.device, new_size);
        }
    }

    /// Draws the frame's scene, then the imgui overlay already built on `imgui`.
    /// Validation errors are logged rather than returned.
    pub fn render(
        &mut self,
        frame: &Frame,
        imgui: &mut imgui::Context,
    ) -> Result<(), wgpu::SurfaceError> {
        let output = self.surface.get_current_texture()?;
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        self.device.push_error_scope(wgpu::ErrorFilter::Validation);

        let lighting = frame.lighting.unwrap_or_else(|| {
            Lighting::new(glam::Vec3::ONE, glam::Vec3::Z, glam::Vec3::ZERO, glam::Vec3::Y)
        });
        self.vertex_color_pass
            .prepare(&self.device, &self.queue, &lighting, &frame.draw_list);

        let mut encoder = self
            .device
            .create_command_encoder(&CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });

        encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Clear pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: &view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(CLEAR_COLOR),
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
        });

        self.vertex_color_pass.render(
            &VertexColorTargets {
                color: &view,
                depth: self.depth_texture.view(),
            },
            &mut encoder,
            &self.meshes,
            &frame.draw_list,
        );

        self.imgui_renderer
            .render(&view, imgui, &self.device, &self.queue, &mut encoder);

        self.queue.submit([encoder.finish()]);

        if let Some(error) = pollster::block_on(self.device.pop_error_scope()) {
            log::error!("GPU validation error: {}", error);
        }

        output.present();

        Ok(())
    }
}
