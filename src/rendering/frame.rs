use bytemuck::{Pod, Zeroable};
use glam::{UVec2, Vec2, Vec3, Vec4};

use crate::asset_pipeline::mesh_buffer::VertexArrayId;
use crate::rendering::program::{ShaderId, UniformSlot, UniformValue};

/// One indexed draw over `[start, start + count)` of a shared vertex array.
#[derive(Debug, Clone)]
pub struct DrawCall {
    pub shader: ShaderId,
    pub vertex_array: VertexArrayId,
    pub start: u32,
    pub count: u32,
    pub uniforms: Vec<(UniformSlot, UniformValue)>,
}

pub type DrawList = Vec<DrawCall>;

/// Directional sun plus hemispherical sky; w components are unused.
/// This should match `Lighting` in vertex_color.wgsl
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct Lighting {
    pub sun_color: Vec4,
    pub sun_direction: Vec4,
    pub sky_color: Vec4,
    pub sky_direction: Vec4,
}

impl Lighting {
    pub fn new(sun_color: Vec3, sun_direction: Vec3, sky_color: Vec3, sky_direction: Vec3) -> Self {
        Self {
            sun_color: sun_color.extend(0.0),
            sun_direction: sun_direction.extend(0.0),
            sky_color: sky_color.extend(0.0),
            sky_direction: sky_direction.extend(0.0),
        }
    }
}

/// Text queued for the overlay. Positions are in a space where y spans
/// [-1, 1] bottom to top and x is scaled by the same unit, centered.
#[derive(Debug, Clone, PartialEq)]
pub struct TextItem {
    pub text: String,
    pub anchor: Vec2,
    pub height: f32,
    pub color: Vec4,
}

pub trait TextMetrics {
    fn text_width(&self, text: &str, height: f32) -> f32;
}

/// Metrics of a fixed-advance font. imgui's built-in ProggyClean advances
/// 7 pixels per glyph at 13 pixels tall.
pub struct MonospaceMetrics {
    pub advance_per_height: f32,
}

impl Default for MonospaceMetrics {
    fn default() -> Self {
        Self {
            advance_per_height: 7.0 / 13.0,
        }
    }
}

impl TextMetrics for MonospaceMetrics {
    fn text_width(&self, text: &str, height: f32) -> f32 {
        text.chars().count() as f32 * height * self.advance_per_height
    }
}

/// Everything the modes want drawn this frame. The renderer consumes it
/// after the mode stack has drawn.
pub struct Frame<'a> {
    pub drawable_size: UVec2,
    /// Whether the mode currently drawing is the top of the mode stack.
    pub foreground: bool,
    pub lighting: Option<Lighting>,
    pub draw_list: DrawList,
    pub overlay: Vec<TextItem>,
    metrics: &'a dyn TextMetrics,
}

impl<'a> Frame<'a> {
    pub fn new(drawable_size: UVec2, metrics: &'a dyn TextMetrics) -> Self {
        Self {
            drawable_size,
            foreground: true,
            lighting: None,
            draw_list: Vec::new(),
            overlay: Vec::new(),
            metrics,
        }
    }

    pub fn aspect(&self) -> f32 {
        self.drawable_size.x as f32 / self.drawable_size.y.max(1) as f32
    }

    pub fn text_width(&self, text: &str, height: f32) -> f32 {
        self.metrics.text_width(text, height)
    }

    pub fn draw_text(&mut self, text: &str, anchor: Vec2, height: f32, color: Vec4) {
        self.overlay.push(TextItem {
            text: text.to_string(),
            anchor,
            height,
            color,
        });
    }
}
