use std::path::PathBuf;

use anyhow::Context;

use crate::config::GameConfig;

/// Resolves a logical asset name against the configured data directory,
/// falling back to the directory holding the executable.
pub fn data_path(config: &GameConfig, name: &str) -> anyhow::Result<PathBuf> {
    let base = match &config.data_dir {
        Some(dir) => dir.clone(),
        None => {
            let exe = std::env::current_exe().context("Failed to locate the executable")?;
            exe.parent()
                .map(|dir| dir.to_path_buf())
                .context("Executable path has no parent directory")?
        }
    };

    Ok(base.join(name))
}
