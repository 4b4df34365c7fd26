//! Configuration management

use crate::error::{Result, YtGrabError};
use crate::types::Config;
use crate::utils::paths::{default_download_dir, ensure_dir, get_config_path};
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::process::Command;

/// Load configuration from the user's config file
pub async fn load_config() -> Result<Config> {
    load_config_from(Path::new(&get_config_path())).await
}

/// Load configuration from `path`, falling back to defaults for missing
/// fields or a missing file
pub async fn load_config_from(path: &Path) -> Result<Config> {
    let mut config = if path.exists() {
        let content = fs::read_to_string(path).await?;
        serde_json::from_str::<Config>(&content).map_err(|e| {
            YtGrabError::InvalidConfig(format!("{}: {}", path.display(), e))
        })?
    } else {
        Config::default()
    };

    // Set download_dir with default if empty
    if config.download_dir.trim().is_empty() {
        config.download_dir = default_download_dir().to_string_lossy().to_string();
    }

    Ok(config)
}

/// Save configuration to the user's config file
pub async fn save_config(config: &Config) -> Result<()> {
    save_config_to(Path::new(&get_config_path()), config).await
}

pub async fn save_config_to(path: &Path, config: &Config) -> Result<()> {
    if let Some(parent) = path.parent() {
        ensure_dir(parent).await?;
    }
    let content = serde_json::to_string_pretty(config)?;
    fs::write(path, content).await?;
    Ok(())
}

/// Open config file in editor
pub async fn edit_config(editor: &str) -> Result<()> {
    let config_path = PathBuf::from(get_config_path());

    // Ensure config file exists
    if !config_path.exists() {
        save_config(&Config::default()).await?;
    }

    Command::new(editor)
        .arg(&config_path)
        .status()
        .await
        .map_err(|source| YtGrabError::Launch {
            program: editor.into(),
            source,
        })?;

    Ok(())
}
