use std::fs::File;
use std::io::BufReader;
use std::ops::Range;
use std::rc::Rc;

use anyhow::Context;
use glam::{Mat3, Quat, UVec2, Vec2, Vec3, Vec4};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use winit::keyboard::KeyCode;

use crate::asset_pipeline::mesh_buffer::MeshCatalog;
use crate::audio::{AudioOutput, Looping, SampleId, SoundHandle};
use crate::config::GameConfig;
use crate::data_path::data_path;
use crate::input::InputEvent;
use crate::mode::menu_mode::MenuMode;
use crate::mode::{Mode, ModeContext};
use crate::rendering::frame::{Frame, Lighting};
use crate::rendering::program::ProgramHandle;
use crate::scene_graph::camera::CameraId;
use crate::scene_graph::scene::Scene;
use crate::scene_graph::scene_loader::{load_scene, LoadedScene};
use crate::scene_graph::transform::TransformId;

const GRAB_PROMPT: &str = "CLICK TO GRAB MOUSE";
const GRAB_PROMPT_HEIGHT: f32 = 0.06;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
struct Controls {
    forward: bool,
    backward: bool,
    left: bool,
    right: bool,
}

impl Controls {
    fn flag_mut(&mut self, key: KeyCode) -> Option<&mut bool> {
        match key {
            KeyCode::KeyW => Some(&mut self.forward),
            KeyCode::KeyS => Some(&mut self.backward),
            KeyCode::KeyA => Some(&mut self.left),
            KeyCode::KeyD => Some(&mut self.right),
            _ => None,
        }
    }

    /// Returns `false` if `key` is not a movement key.
    fn set(&mut self, key: KeyCode, pressed: bool) -> bool {
        match self.flag_mut(key) {
            Some(flag) => {
                *flag = pressed;
                true
            }
            None => false,
        }
    }
}

/// Free-flying camera through the phone bank, with a phone ringing somewhere
/// near the player every couple of seconds.
pub struct MainMode {
    scene: Scene,
    camera: CameraId,
    camera_transform: TransformId,
    controls: Controls,
    mouse_captured: bool,
    move_speed: f32,
    ring_interval: Range<f32>,
    ring_countdown: f32,
    rng: StdRng,
    audio: Rc<dyn AudioOutput>,
    ring_sample: SampleId,
    music: Option<SoundHandle>,
}

impl MainMode {
    /// Loads the scene and samples named by `config` and starts the music.
    pub fn load(
        config: &GameConfig,
        catalog: &dyn MeshCatalog,
        audio: Rc<dyn AudioOutput>,
    ) -> anyhow::Result<Self> {
        let scene_path = data_path(config, &config.scene_file)?;
        let file = File::open(&scene_path)
            .with_context(|| format!("Failed to open scene {}", scene_path.display()))?;
        let loaded = load_scene(
            &mut BufReader::new(file),
            catalog,
            ProgramHandle::VERTEX_COLOR,
            &config.camera,
        )
        .with_context(|| format!("Failed to load scene {}", scene_path.display()))?;

        let ring_sample = load_sample(config, audio.as_ref(), &config.ring_sample)?;
        let loop_sample = load_sample(config, audio.as_ref(), &config.loop_sample)?;

        Self::new(loaded, audio, ring_sample, loop_sample, config)
    }

    pub fn new(
        loaded: LoadedScene,
        audio: Rc<dyn AudioOutput>,
        ring_sample: SampleId,
        loop_sample: SampleId,
        config: &GameConfig,
    ) -> anyhow::Result<Self> {
        let LoadedScene { scene, camera } = loaded;
        let camera_transform = scene
            .camera(camera)
            .map(|camera| camera.transform)
            .context("Loaded scene has no camera")?;

        let mut mode = Self {
            scene,
            camera,
            camera_transform,
            controls: Controls::default(),
            mouse_captured: false,
            move_speed: config.move_speed,
            ring_interval: config.ring_interval.clone(),
            ring_countdown: config.first_ring_delay,
            rng: StdRng::from_entropy(),
            audio,
            ring_sample,
            music: None,
        };

        let position = mode.camera_position();
        mode.music = Some(
            mode.audio
                .play(loop_sample, position, Looping::Forever)
                .context("Failed to start music")?,
        );

        Ok(mode)
    }

    fn camera_position(&self) -> Vec3 {
        self.scene
            .world_transform(self.camera_transform)
            .w_axis
            .truncate()
    }

    fn show_pause_menu(&self, ctx: &mut ModeContext) {
        log::debug!("Pausing main mode");
        ctx.push(Box::new(MenuMode::pause_menu(ctx.resume_handle())));
    }

    fn look(&mut self, xrel: f32, yrel: f32, window_size: UVec2) {
        let Some(fovy) = self.scene.camera(self.camera).map(|camera| camera.fovy) else {
            return;
        };

        let pixels_to_radians = fovy / window_size.y.max(1) as f32;
        let yaw = -xrel * pixels_to_radians;
        let pitch = -yrel * pixels_to_radians;

        if let Some(transform) = self.scene.transform_mut(self.camera_transform) {
            transform.rotate_local(
                Quat::from_axis_angle(Vec3::Y, yaw) * Quat::from_axis_angle(Vec3::X, pitch),
            );
        }
    }

    fn fly(&mut self, elapsed: f32) {
        let Some(transform) = self.scene.transform_mut(self.camera_transform) else {
            return;
        };

        let directions = Mat3::from_quat(transform.rotation);
        let amount = self.move_speed * elapsed;
        let mut delta = Vec3::ZERO;

        if self.controls.right {
            delta += directions.x_axis;
        }
        if self.controls.left {
            delta -= directions.x_axis;
        }
        // Cameras look down -z
        if self.controls.backward {
            delta += directions.z_axis;
        }
        if self.controls.forward {
            delta -= directions.z_axis;
        }

        transform.translate(delta * amount);
    }

    fn place_listener(&self) {
        let camera_to_world = self.scene.world_transform(self.camera_transform);
        let position = camera_to_world.w_axis.truncate();

        self.audio
            .set_listener(position, camera_to_world.x_axis.truncate().normalize());

        if let Some(music) = self.music {
            self.audio.set_position(music, position);
        }
    }

    fn tick_ring(&mut self, elapsed: f32) {
        self.ring_countdown -= elapsed;
        if self.ring_countdown > 0.0 {
            return;
        }

        self.ring_countdown = self.rng.gen_range(self.ring_interval.clone());

        let position = self.camera_position();
        log::debug!(
            "Ringing at {}, next ring in {:.2}s",
            position,
            self.ring_countdown
        );

        if let Err(e) = self.audio.play(self.ring_sample, position, Looping::Once) {
            log::warn!("Failed to play ring: {:#}", e);
        }
    }
}

fn load_sample(
    config: &GameConfig,
    audio: &dyn AudioOutput,
    name: &str,
) -> anyhow::Result<SampleId> {
    let path = data_path(config, name)?;
    let bytes =
        std::fs::read(&path).with_context(|| format!("Failed to read {}", path.display()))?;
    audio
        .load_sample(bytes)
        .with_context(|| format!("Failed to load sample {}", path.display()))
}

impl Mode for MainMode {
    fn handle_event(
        &mut self,
        event: &InputEvent,
        window_size: UVec2,
        ctx: &mut ModeContext,
    ) -> bool {
        let movement = match *event {
            InputEvent::KeyDown { repeat: true, .. } => return false,
            InputEvent::KeyDown { key, .. } => self.controls.set(key, true),
            InputEvent::KeyUp { key } => self.controls.set(key, false),
            _ => false,
        };
        if movement {
            return true;
        }

        match *event {
            InputEvent::MouseButtonDown { .. } if !self.mouse_captured => {
                ctx.set_relative_mouse(true);
                self.mouse_captured = true;
                true
            }
            InputEvent::KeyDown {
                key: KeyCode::Escape,
                ..
            } if self.mouse_captured => {
                self.show_pause_menu(ctx);
                true
            }
            InputEvent::MouseMotion { xrel, yrel } if self.mouse_captured => {
                self.look(xrel, yrel, window_size);
                true
            }
            _ => false,
        }
    }

    fn update(&mut self, elapsed: f32, _ctx: &mut ModeContext) {
        self.fly(elapsed);
        self.place_listener();
        self.tick_ring(elapsed);
    }

    fn draw(&mut self, frame: &mut Frame) {
        frame.lighting = Some(Lighting::new(
            Vec3::new(0.81, 0.81, 0.76),
            Vec3::new(-0.2, 0.2, 1.0).normalize(),
            Vec3::new(0.4, 0.4, 0.45),
            Vec3::Y,
        ));

        if let Some(camera) = self.scene.camera_mut(self.camera) {
            camera.aspect = frame.aspect();
        }

        self.scene.draw(self.camera, &mut frame.draw_list);

        if frame.foreground && !self.mouse_captured {
            let width = frame.text_width(GRAB_PROMPT, GRAB_PROMPT_HEIGHT);
            frame.draw_text(
                GRAB_PROMPT,
                Vec2::new(-0.5 * width, -0.99),
                GRAB_PROMPT_HEIGHT,
                Vec4::new(0.0, 0.0, 0.0, 0.5),
            );
            frame.draw_text(
                GRAB_PROMPT,
                Vec2::new(-0.5 * width, -1.0),
                GRAB_PROMPT_HEIGHT,
                Vec4::ONE,
            );
        }
    }
}

impl Drop for MainMode {
    fn drop(&mut self) {
        if let Some(music) = self.music.take() {
            self.audio.stop(music);
        }
    }
}
