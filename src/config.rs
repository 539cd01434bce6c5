use std::ops::Range;
use std::path::PathBuf;

use glam::{Quat, Vec3};

pub const DATA_DIR_ENV: &str = "PHONE_BANK_DATA_DIR";

#[derive(Debug, Clone)]
pub struct CameraConfig {
    pub position: Vec3,
    pub rotation: Quat,
    /// Vertical field of view in radians.
    pub fovy: f32,
    pub near: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            position: Vec3::new(0.0, -10.0, 1.0),
            // Cameras look along -z, so tip it up to look at the origin
            rotation: Quat::from_axis_angle(Vec3::X, 90.0_f32.to_radians()),
            fovy: 60.0_f32.to_radians(),
            near: 0.01,
        }
    }
}

#[derive(Debug, Clone)]
pub struct GameConfig {
    /// `None` resolves assets next to the executable.
    pub data_dir: Option<PathBuf>,
    pub scene_file: String,
    pub mesh_file: String,
    pub ring_sample: String,
    pub loop_sample: String,
    /// Units per second.
    pub move_speed: f32,
    pub ring_interval: Range<f32>,
    pub first_ring_delay: f32,
    pub camera: CameraConfig,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            data_dir: None,
            scene_file: "phone-bank.scene".to_string(),
            mesh_file: "phone-bank.pnc".to_string(),
            ring_sample: "ring.wav".to_string(),
            loop_sample: "music.wav".to_string(),
            move_speed: 5.0,
            ring_interval: 0.5..2.5,
            first_ring_delay: 1.0,
            camera: CameraConfig::default(),
        }
    }
}

impl GameConfig {
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Some(dir) = std::env::var_os(DATA_DIR_ENV) {
            log::info!("Using data directory from {}: {:?}", DATA_DIR_ENV, dir);
            config.data_dir = Some(PathBuf::from(dir));
        }

        config
    }
}
