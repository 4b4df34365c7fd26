//! Progress extraction from free-form tool output
//!
//! yt-dlp reports progress as `[download]  24.3% of 500MiB at 1.5MiB/s`. The
//! number is taken to be the last word before the first `%`. This is a
//! heuristic tied to the tool's current output; lines that do not fit are
//! ignored, so a format change degrades to no progress rather than an error.

use crate::types::ProgressEvent;

/// Extract a progress percentage from one output line.
///
/// Values above 100 are clamped to 100. Negative, NaN, infinite and
/// non-numeric values yield nothing.
pub fn extract(line: &str) -> Option<ProgressEvent> {
    let (before, _) = line.split_once('%')?;
    let token = before.split_whitespace().next_back()?;
    let value: f64 = token.parse().ok()?;

    if !value.is_finite() || value < 0.0 {
        return None;
    }

    // Truncation is intended: 99.9% is not done yet
    let percentage = value.min(100.0) as u8;
    Some(ProgressEvent::new(percentage))
}
