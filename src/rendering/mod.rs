pub mod frame;
pub mod imgui_renderer;
pub mod mesh_buffers;
pub mod program;
pub mod renderer;
pub mod text_overlay;
pub mod texture;
pub mod vertex_color_pass;
