//! Type definitions for yt-grab
//!
//! Source of truth for all data structures.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::process::ExitStatus;

// ============================================
// Process Types
// ============================================

/// Which output stream of a child process a line came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StreamKind {
    Stdout,
    Stderr,
}

impl fmt::Display for StreamKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Stdout => f.write_str("stdout"),
            Self::Stderr => f.write_str("stderr"),
        }
    }
}

/// Description of one external process invocation.
///
/// Arguments are kept as a discrete list and handed to the OS as-is; nothing
/// is ever joined into a command string or interpreted by a shell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchSpec {
    executable: PathBuf,
    args: Vec<String>,
    working_dir: Option<PathBuf>,
}

impl LaunchSpec {
    pub fn new(executable: impl Into<PathBuf>) -> Self {
        Self {
            executable: executable.into(),
            args: Vec::new(),
            working_dir: None,
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    pub fn executable(&self) -> &Path {
        &self.executable
    }

    pub fn arguments(&self) -> &[String] {
        &self.args
    }

    pub fn working_dir(&self) -> Option<&Path> {
        self.working_dir.as_deref()
    }

    /// Executable name as shown in logs and errors
    pub fn program(&self) -> String {
        self.executable.display().to_string()
    }
}

/// A parsed progress percentage, always within 0..=100
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct ProgressEvent {
    percentage: u8,
}

impl ProgressEvent {
    pub fn new(percentage: u8) -> Self {
        Self {
            percentage: percentage.min(100),
        }
    }

    pub fn percentage(&self) -> u8 {
        self.percentage
    }
}

/// Terminal result of one process invocation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum RunOutcome {
    Success,
    Failure { exit_code: i32 },
}

impl RunOutcome {
    /// Map an OS exit status. A child killed by a signal has no exit code;
    /// on Unix it reports `128 + signal` like a shell does, elsewhere `-1`.
    pub fn from_status(status: ExitStatus) -> Self {
        match status.code() {
            Some(0) => Self::Success,
            Some(code) => Self::Failure { exit_code: code },
            None => Self::Failure {
                exit_code: signal_exit_code(status),
            },
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success)
    }

    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Success => 0,
            Self::Failure { exit_code } => *exit_code,
        }
    }
}

#[cfg(unix)]
fn signal_exit_code(status: ExitStatus) -> i32 {
    use std::os::unix::process::ExitStatusExt;
    status.signal().map(|signal| 128 + signal).unwrap_or(-1)
}

#[cfg(not(unix))]
fn signal_exit_code(_status: ExitStatus) -> i32 {
    -1
}

/// What the pipeline hands across to the consumer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineEvent {
    Progress(ProgressEvent),
    /// An error or warning line reported by the external tool
    Diagnostic(String),
}

// ============================================
// Download Types
// ============================================

/// Maximum video height to request
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default, clap::ValueEnum,
)]
pub enum Resolution {
    #[default]
    #[serde(rename = "1080")]
    #[value(name = "1080")]
    P1080,
    #[serde(rename = "720")]
    #[value(name = "720")]
    P720,
    #[serde(rename = "480")]
    #[value(name = "480")]
    P480,
    #[serde(rename = "360")]
    #[value(name = "360")]
    P360,
}

impl Resolution {
    pub fn height(&self) -> u32 {
        match self {
            Self::P1080 => 1080,
            Self::P720 => 720,
            Self::P480 => 480,
            Self::P360 => 360,
        }
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}p", self.height())
    }
}

/// One download as requested by the user
#[derive(Debug, Clone)]
pub struct DownloadRequest {
    pub url: String,
    pub resolution: Resolution,
    /// Target folder for the finished file
    pub output_dir: PathBuf,
}

/// Resolved locations of the external tools
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolPaths {
    pub ytdlp: PathBuf,
    pub ffmpeg: PathBuf,
}

// ============================================
// Config Types
// ============================================

/// User configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Download directory path (empty = the user's video folder)
    pub download_dir: String,
    /// Default resolution ceiling
    pub resolution: Resolution,
    /// Explicit yt-dlp location (empty = auto-detect)
    pub ytdlp_path: String,
    /// Explicit ffmpeg location (empty = auto-detect)
    pub ffmpeg_path: String,
    /// Editor command (default: "nvim")
    pub editor: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            download_dir: String::new(), // Set at runtime
            resolution: Resolution::default(),
            ytdlp_path: String::new(),
            ffmpeg_path: String::new(),
            editor: "nvim".into(),
        }
    }
}

// ============================================
// Status Output Types
// ============================================

/// One line of `--json` output
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum StatusMessage {
    Progress {
        percentage: u8,
    },
    Diagnostic {
        text: String,
    },
    Finished {
        success: bool,
        #[serde(skip_serializing_if = "Option::is_none")]
        exit_code: Option<i32>,
    },
    Error {
        message: String,
    },
}

impl From<&PipelineEvent> for StatusMessage {
    fn from(event: &PipelineEvent) -> Self {
        match event {
            PipelineEvent::Progress(progress) => Self::Progress {
                percentage: progress.percentage(),
            },
            PipelineEvent::Diagnostic(text) => Self::Diagnostic { text: text.clone() },
        }
    }
}

impl From<RunOutcome> for StatusMessage {
    fn from(outcome: RunOutcome) -> Self {
        match outcome {
            RunOutcome::Success => Self::Finished {
                success: true,
                exit_code: None,
            },
            RunOutcome::Failure { exit_code } => Self::Finished {
                success: false,
                exit_code: Some(exit_code),
            },
        }
    }
}
