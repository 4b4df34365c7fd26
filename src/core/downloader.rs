//! Downloader module - yt-dlp integration

use crate::error::{Result, YtGrabError};
use crate::types::{Config, DownloadRequest, LaunchSpec, Resolution, ToolPaths};
use crate::utils::paths::bundled_tools_dir;
use std::path::{Path, PathBuf};
use tracing::debug;

pub const YTDLP: &str = "yt-dlp";
pub const FFMPEG: &str = "ffmpeg";

/// Output naming template handed to yt-dlp
const OUTPUT_TEMPLATE: &str = "%(title)s.%(ext)s";

/// Build a request, rejecting an empty URL
pub fn new_request(
    url: &str,
    resolution: Resolution,
    output_dir: impl Into<PathBuf>,
) -> Result<DownloadRequest> {
    let url = url.trim();
    if url.is_empty() {
        return Err(YtGrabError::InvalidUrl);
    }

    Ok(DownloadRequest {
        url: url.into(),
        resolution,
        output_dir: output_dir.into(),
    })
}

/// yt-dlp format selector capped at the requested height
pub fn format_selector(resolution: Resolution) -> String {
    format!(
        "bestvideo[height<={}]+bestaudio/best",
        resolution.height()
    )
}

/// Build the yt-dlp invocation for one download
pub fn build_launch_spec(request: &DownloadRequest, tools: &ToolPaths) -> LaunchSpec {
    let output = request.output_dir.join(OUTPUT_TEMPLATE);

    LaunchSpec::new(&tools.ytdlp)
        // One progress report per line
        .arg("--newline")
        .args(["-o".to_string(), output.to_string_lossy().into_owned()])
        .args(["-f".to_string(), format_selector(request.resolution)])
        .args(["--merge-output-format", "mp4"])
        .args([
            "--ffmpeg-location".to_string(),
            tools.ffmpeg.to_string_lossy().into_owned(),
        ])
        .arg(request.url.as_str())
}

/// Locate yt-dlp and ffmpeg, honouring explicit paths from the config
pub fn resolve_tools(config: &Config) -> Result<ToolPaths> {
    let bundled = bundled_tools_dir();
    Ok(ToolPaths {
        ytdlp: locate_tool(YTDLP, &config.ytdlp_path, bundled.as_deref())?,
        ffmpeg: locate_tool(FFMPEG, &config.ffmpeg_path, bundled.as_deref())?,
    })
}

/// Find `name`: configured path first, then the bundled directory, then PATH
pub fn locate_tool(name: &str, configured: &str, bundled_dir: Option<&Path>) -> Result<PathBuf> {
    if !configured.is_empty() {
        let path = PathBuf::from(configured);
        if path.is_file() {
            return Ok(path);
        }
        return Err(YtGrabError::MissingDependency(format!(
            "{} (configured path {} does not exist)",
            name, configured
        )));
    }

    if let Some(dir) = bundled_dir {
        let candidate = dir.join(format!("{}{}", name, std::env::consts::EXE_SUFFIX));
        if candidate.is_file() {
            debug!(tool = name, path = %candidate.display(), "using bundled tool");
            return Ok(candidate);
        }
    }

    which::which(name).map_err(|_| YtGrabError::MissingDependency(name.into()))
}
