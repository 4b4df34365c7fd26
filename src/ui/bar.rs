//! indicatif progress bar reporter

use crate::error::YtGrabError;
use crate::types::{PipelineEvent, RunOutcome};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

const BAR_TEMPLATE: &str = "{spinner:.green} [{bar:40.cyan/blue}] {pos:>3}% {msg}";

pub struct BarReporter {
    bar: ProgressBar,
}

impl BarReporter {
    pub fn new() -> Self {
        let bar = ProgressBar::new(100);
        bar.set_style(
            ProgressStyle::with_template(BAR_TEMPLATE)
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("#>-"),
        );
        bar.set_message("Downloading...");
        bar.enable_steady_tick(Duration::from_millis(100));
        Self { bar }
    }

    pub fn handle(&self, event: &PipelineEvent) {
        match event {
            PipelineEvent::Progress(progress) => {
                self.bar.set_position(u64::from(progress.percentage()));
            }
            PipelineEvent::Diagnostic(text) => {
                let line = if text.starts_with("ERROR:") {
                    text.as_str().red()
                } else {
                    text.as_str().yellow()
                };
                self.bar.println(line.to_string());
            }
        }
    }

    pub fn finish(&self, result: &Result<RunOutcome, YtGrabError>) {
        self.bar.finish_and_clear();

        match result {
            Ok(RunOutcome::Success) => {
                println!("{}", "✓ Download completed successfully!".green());
            }
            Ok(RunOutcome::Failure { exit_code }) => {
                eprintln!(
                    "{} {}",
                    "An error occurred during the download.".red(),
                    format!("(exit code {})", exit_code).dimmed()
                );
            }
            Err(e) => {
                eprintln!("{} {}", "An error occurred:".red(), e);
            }
        }
    }
}

impl Default for BarReporter {
    fn default() -> Self {
        Self::new()
    }
}
