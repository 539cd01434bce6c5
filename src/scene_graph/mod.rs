pub mod camera;
pub mod object;
pub mod scene;
pub mod scene_loader;
pub mod transform;
