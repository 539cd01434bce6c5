use glam::Vec2;
use imgui::{Condition, StyleVar, WindowFlags};

use crate::rendering::frame::TextItem;

/// Pixel height of imgui's built-in font. Text is scaled from this.
pub const FONT_SIZE_PIXELS: f32 = 13.0;

/// Maps an overlay anchor (bottom-left of the text) to the top-left pixel
/// position imgui wants, along with the text height in pixels.
pub fn overlay_to_pixels(anchor: Vec2, height: f32, viewport: Vec2) -> (Vec2, f32) {
    let scale = 0.5 * viewport.y;
    let top_left = Vec2::new(
        0.5 * viewport.x + anchor.x * scale,
        0.5 * viewport.y - (anchor.y + height) * scale,
    );
    (top_left, height * scale)
}

/// Draws `items` in a transparent window covering the whole viewport.
pub fn draw_overlay(ui: &imgui::Ui, items: &[TextItem]) {
    if items.is_empty() {
        return;
    }

    let viewport = Vec2::from(ui.io().display_size);
    let _padding = ui.push_style_var(StyleVar::WindowPadding([0.0, 0.0]));

    ui.window("Text overlay")
        .position([0.0, 0.0], Condition::Always)
        .size(viewport.to_array(), Condition::Always)
        .flags(
            WindowFlags::NO_DECORATION
                | WindowFlags::NO_BACKGROUND
                | WindowFlags::NO_INPUTS
                | WindowFlags::NO_SAVED_SETTINGS
                | WindowFlags::NO_NAV
                | WindowFlags::NO_FOCUS_ON_APPEARING,
        )
        .build(|| {
            for item in items {
                let (position, pixel_height) =
                    overlay_to_pixels(item.anchor, item.height, viewport);
                ui.set_window_font_scale(pixel_height / FONT_SIZE_PIXELS);
                ui.set_cursor_pos(position.to_array());
                ui.text_colored(item.color.to_array(), &item.text);
            }
        });
}
