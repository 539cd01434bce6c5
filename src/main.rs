use anyhow::Result;

mod asset_pipeline;
mod audio;
mod config;
mod data_path;
mod input;
mod mode;
mod rendering;
mod scene_graph;
#[cfg(test)]
mod test_util;
mod window;

fn main() -> Result<()> {
    pretty_env_logger::init();

    pollster::block_on(window::run(config::GameConfig::from_env()))?;

    Ok(())
}
