//! Error types for yt-grab

use crate::types::StreamKind;
use thiserror::Error;

/// Coarse classification of failures, for callers that branch on kind
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    // Process errors
    LaunchFailure,
    IoFailure,
    TaskFailure,

    // Dependency errors
    MissingDependency,

    // User errors
    InvalidUrl,
    InvalidConfig,

    // System errors
    FileError,
}

/// Main error type for yt-grab
#[derive(Error, Debug)]
pub enum YtGrabError {
    #[error("Failed to launch {program}: {source}")]
    Launch {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to read {stream} of {program}: {source}")]
    StreamIo {
        program: String,
        stream: StreamKind,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to wait for {program}: {source}")]
    Wait {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Background task failed: {0}")]
    Task(String),

    #[error("Missing dependency: {0}. Please install it.")]
    MissingDependency(String),

    #[error("Please enter a valid video URL.")]
    InvalidUrl,

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("File error: {0}")]
    File(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl YtGrabError {
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::Launch { .. } => ErrorCode::LaunchFailure,
            Self::StreamIo { .. } | Self::Wait { .. } => ErrorCode::IoFailure,
            Self::Task(_) => ErrorCode::TaskFailure,
            Self::MissingDependency(_) => ErrorCode::MissingDependency,
            Self::InvalidUrl => ErrorCode::InvalidUrl,
            Self::InvalidConfig(_) | Self::Json(_) => ErrorCode::InvalidConfig,
            Self::File(_) => ErrorCode::FileError,
        }
    }
}

pub type Result<T> = std::result::Result<T, YtGrabError>;
