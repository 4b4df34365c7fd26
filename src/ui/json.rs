//! JSON-lines reporter for scripts and GUI front-ends

use crate::error::YtGrabError;
use crate::types::{PipelineEvent, RunOutcome, StatusMessage};
use std::io::Write;
use tracing::warn;

pub struct JsonReporter;

impl JsonReporter {
    pub fn new() -> Self {
        Self
    }

    pub fn handle(&self, event: &PipelineEvent) {
        emit(&StatusMessage::from(event));
    }

    pub fn finish(&self, result: &Result<RunOutcome, YtGrabError>) {
        let message = match result {
            Ok(outcome) => StatusMessage::from(*outcome),
            Err(e) => StatusMessage::Error {
                message: e.to_string(),
            },
        };
        emit(&message);
    }
}

impl Default for JsonReporter {
    fn default() -> Self {
        Self::new()
    }
}

fn emit(message: &StatusMessage) {
    match serde_json::to_string(message) {
        Ok(line) => {
            let mut stdout = std::io::stdout().lock();
            // Consumers read line by line; flush so progress is not held back
            let _ = writeln!(stdout, "{}", line);
            let _ = stdout.flush();
        }
        Err(e) => warn!("failed to encode status message: {}", e),
    }
}
