use winit::event::{DeviceEvent, ElementState, KeyEvent, MouseButton, WindowEvent};
use winit::keyboard::{KeyCode, PhysicalKey};

/// The subset of window input the modes react to.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputEvent {
    KeyDown { key: KeyCode, repeat: bool },
    KeyUp { key: KeyCode },
    MouseButtonDown { button: MouseButton },
    /// Relative pointer motion in pixels, +y down.
    MouseMotion { xrel: f32, yrel: f32 },
}

pub fn from_window_event(event: &WindowEvent) -> Option<InputEvent> {
    match event {
        WindowEvent::KeyboardInput {
            event:
                KeyEvent {
                    physical_key: PhysicalKey::Code(key),
                    state,
                    repeat,
                    ..
                },
            ..
        } => Some(match state {
            ElementState::Pressed => InputEvent::KeyDown {
                key: *key,
                repeat: *repeat,
            },
            ElementState::Released => InputEvent::KeyUp { key: *key },
        }),
        WindowEvent::MouseInput {
            state: ElementState::Pressed,
            button,
            ..
        } => Some(InputEvent::MouseButtonDown { button: *button }),
        _ => None,
    }
}

/// Raw device motion keeps arriving while the cursor is grabbed, unlike
/// `CursorMoved`.
pub fn from_device_event(event: &DeviceEvent) -> Option<InputEvent> {
    match event {
        DeviceEvent::MouseMotion { delta: (x, y) } => Some(InputEvent::MouseMotion {
            xrel: *x as f32,
            yrel: *y as f32,
        }),
        _ => None,
    }
}
