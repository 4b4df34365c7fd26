//! Path utilities for yt-grab
//!
//! Respects XDG Base Directory Specification

use crate::error::Result;
use std::env;
use std::path::PathBuf;
use tokio::fs;

const APP_NAME: &str = "yt-grab";

/// Directory next to the executable that may ship yt-dlp and ffmpeg
const BUNDLED_TOOLS_DIR: &str = "yt-dlp";

/// Get config directory path
/// Respects XDG_CONFIG_HOME, defaults to ~/.config/yt-grab
pub fn get_config_dir() -> String {
    let base = env::var("XDG_CONFIG_HOME")
        .unwrap_or_else(|_| {
            dirs::config_dir()
                .map(|p| p.to_string_lossy().to_string())
                .unwrap_or_else(|| format!("{}/.config", env::var("HOME").unwrap_or_default()))
        });

    format!("{}/{}", base, APP_NAME)
}

/// Get config file path
pub fn get_config_path() -> String {
    format!("{}/config.json", get_config_dir())
}

/// Where downloads go when nothing is configured: videos, then downloads, then cwd
pub fn default_download_dir() -> PathBuf {
    dirs::video_dir()
        .or_else(dirs::download_dir)
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Tools directory shipped alongside the running binary, if it can be found
pub fn bundled_tools_dir() -> Option<PathBuf> {
    let exe = env::current_exe().ok()?;
    Some(exe.parent()?.join(BUNDLED_TOOLS_DIR))
}

/// Ensure a directory exists
pub async fn ensure_dir(path: impl AsRef<std::path::Path>) -> Result<()> {
    fs::create_dir_all(path).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_path_layout() {
        let path = get_config_path();
        assert!(path.ends_with("/yt-grab/config.json"));
        assert!(path.starts_with(&get_config_dir()));
    }

    #[test]
    fn test_bundled_dir_is_next_to_binary() {
        let dir = bundled_tools_dir().unwrap();
        assert!(dir.ends_with(BUNDLED_TOOLS_DIR));
    }

    #[tokio::test]
    async fn test_ensure_dir_creates_nested() {
        let root = tempfile::tempdir().unwrap();
        let nested = root.path().join("a/b/c");
        ensure_dir(&nested).await.unwrap();
        assert!(nested.is_dir());
        // Idempotent
        ensure_dir(&nested).await.unwrap();
    }
}
