use std::{rc::Rc, sync::Arc, time::Instant};

use anyhow::Context;
use glam::UVec2;
use winit::{
    application::ApplicationHandler,
    event::{DeviceEvent, DeviceId, Event, WindowEvent},
    event_loop::{ActiveEventLoop, EventLoop},
    window::{CursorGrabMode, Window, WindowId},
};

use crate::{
    asset_pipeline::mesh_buffer::{MeshBuffer, VertexArrayId},
    audio::{create_audio, AudioOutput},
    config::GameConfig,
    data_path::data_path,
    input::{self, InputEvent},
    mode::{main_mode::MainMode, ModeStack, WindowControl},
    rendering::{
        frame::{Frame, MonospaceMetrics},
        imgui_renderer::ImguiState,
        renderer::Renderer,
        text_overlay::draw_overlay,
    },
};

/// Grants modes control over the cursor of one window.
struct CursorControl<'a> {
    window: &'a Window,
}

impl WindowControl for CursorControl<'_> {
    fn set_relative_mouse(&mut self, enabled: bool) {
        let result = if enabled {
            self.window
                .set_cursor_grab(CursorGrabMode::Locked)
                .or_else(|_| self.window.set_cursor_grab(CursorGrabMode::Confined))
        } else {
            self.window.set_cursor_grab(CursorGrabMode::None)
        };

        if let Err(e) = result {
            log::warn!("Cursor grab not supported: {}", e);
        }
        self.window.set_cursor_visible(!enabled);
    }
}

struct App {
    config: GameConfig,
    audio: Rc<dyn AudioOutput>,
    renderer: Option<Renderer>,
    imgui: Option<ImguiState>,
    modes: ModeStack,
    metrics: MonospaceMetrics,
    last_frame: Instant,
    error: Option<anyhow::Error>,
}

impl App {
    fn new(config: GameConfig, audio: Rc<dyn AudioOutput>) -> Self {
        Self {
            config,
            audio,
            renderer: None,
            imgui: None,
            modes: ModeStack::new(),
            metrics: MonospaceMetrics::default(),
            last_frame: Instant::now(),
            error: None,
        }
    }

    fn start(&mut self, event_loop: &ActiveEventLoop) -> anyhow::Result<()> {
        let window_attributes = Window::default_attributes().with_title("Phone Bank");
        let window = event_loop
            .create_window(window_attributes)
            .context("Failed to create window")?;
        let window = Arc::new(window);

        let mut imgui = ImguiState::new(&window);
        let mut renderer = pollster::block_on(Renderer::new(window, &mut imgui.context))?;

        let mesh_path = data_path(&self.config, &self.config.mesh_file)?;
        let mesh_buffer = MeshBuffer::load(&mesh_path, VertexArrayId(0))?;
        renderer.upload_mesh_buffer(&mesh_buffer);

        let main_mode = MainMode::load(&self.config, &mesh_buffer, self.audio.clone())?;
        self.modes.push(Box::new(main_mode));

        self.imgui = Some(imgui);
        self.renderer = Some(renderer);
        self.last_frame = Instant::now();

        Ok(())
    }

    fn dispatch(&mut self, event_loop: &ActiveEventLoop, event: InputEvent) {
        let Some(renderer) = self.renderer.as_ref() else {
            return;
        };

        let mut control = CursorControl {
            window: &renderer.window,
        };
        self.modes.handle_event(&event, renderer.size, &mut control);

        if self.modes.is_empty() {
            event_loop.exit();
        }
    }

    fn redraw(&mut self, event_loop: &ActiveEventLoop) {
        let (Some(renderer), Some(imgui)) = (self.renderer.as_mut(), self.imgui.as_mut()) else {
            return;
        };

        let now = Instant::now();
        let elapsed = now - self.last_frame;
        self.last_frame = now;
        imgui.context.io_mut().update_delta_time(elapsed);

        let mut control = CursorControl {
            window: &renderer.window,
        };
        self.modes.update(elapsed.as_secs_f32(), &mut control);

        if self.modes.is_empty() {
            event_loop.exit();
            return;
        }

        let mut frame = Frame::new(renderer.size, &self.metrics);
        self.modes.draw(&mut frame);

        if let Err(e) = imgui
            .platform
            .prepare_frame(imgui.context.io_mut(), &renderer.window)
        {
            log::warn!("Failed to prepare imgui frame: {}", e);
        }
        let ui = imgui.context.new_frame();
        draw_overlay(ui, &frame.overlay);
        imgui.platform.prepare_render(ui, &renderer.window);

        match renderer.render(&frame, &mut imgui.context) {
            Ok(()) => {}
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                renderer.resize(renderer.size);
            }
            Err(wgpu::SurfaceError::OutOfMemory) => {
                log::error!("Out of memory");
                event_loop.exit();
            }
            Err(wgpu::SurfaceError::Timeout) => {
                log::warn!("Timeout");
            }
            Err(other) => {
                log::error!("Unexpected error: {:?}", other);
            }
        }
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.renderer.is_some() {
            return;
        }

        if let Err(e) = self.start(event_loop) {
            self.error = Some(e);
            event_loop.exit();
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        window_id: WindowId,
        event: WindowEvent,
    ) {
        match &event {
            WindowEvent::CloseRequested => {
                event_loop.exit();
            }
            WindowEvent::Resized(new_size) => {
                if let Some(renderer) = self.renderer.as_mut() {
                    renderer.resize(UVec2::new(new_size.width, new_size.height));
                }
            }
            WindowEvent::RedrawRequested => {
                self.redraw(event_loop);
            }
            other => {
                if let Some(input_event) = input::from_window_event(other) {
                    self.dispatch(event_loop, input_event);
                }
            }
        }

        if let (Some(renderer), Some(imgui)) = (self.renderer.as_ref(), self.imgui.as_mut()) {
            imgui.platform.handle_event::<()>(
                imgui.context.io_mut(),
                &renderer.window,
                &Event::WindowEvent { window_id, event },
            );
        }
    }

    fn device_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _device_id: DeviceId,
        event: DeviceEvent,
    ) {
        if let Some(input_event) = input::from_device_event(&event) {
            self.dispatch(event_loop, input_event);
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(renderer) = self.renderer.as_ref() {
            renderer.window.request_redraw();
        }
    }
}

pub async fn run(config: GameConfig) -> anyhow::Result<()> {
    let event_loop = EventLoop::new().context("Failed to create event loop")?;
    let mut app = App::new(config, create_audio());
    event_loop.run_app(&mut app)?;

    match app.error.take() {
        Some(e) => Err(e),
        None => Ok(()),
    }
}
