//! yt-grab library
//!
//! Runs an external download tool, streams its output, and turns progress
//! lines into events for a single consumer.

pub mod core;
pub mod error;
pub mod storage;
pub mod types;
pub mod ui;
pub mod utils;
