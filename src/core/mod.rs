//! Core modules: process runner, progress extraction, pipeline, yt-dlp integration

pub mod downloader;
pub mod lines;
pub mod pipeline;
pub mod progress;
pub mod runner;
