//! Loading a project and its input images from disk.

use color_eyre::eyre::WrapErr;
use color_eyre::Result;
use of_core::config::{apply_env_overrides, load_config, AppConfig};
use of_core::state::NewImage;
use std::path::{Path, PathBuf};

/// Load `.ocrflow/` under `dir` and apply environment overrides.
pub async fn load(dir: &Path) -> Result<AppConfig> {
    let mut config = load_config(dir)
        .await
        .wrap_err_with(|| format!("Failed to load configuration from {}", dir.display()))?;
    apply_env_overrides(&mut config.global);
    Ok(config)
}

/// Read image files. The MIME type is detected from the extension later.
pub fn read_images(paths: &[PathBuf]) -> Result<Vec<NewImage>> {
    paths
        .iter()
        .map(|path| {
            let data = std::fs::read(path)
                .wrap_err_with(|| format!("Failed to read image {}", path.display()))?;
            let name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| path.display().to_string());
            Ok(NewImage::new(name, data))
        })
        .collect()
}
