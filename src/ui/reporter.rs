//! Reporter enum and factory

use super::bar::BarReporter;
use super::json::JsonReporter;
use crate::error::YtGrabError;
use crate::types::{PipelineEvent, RunOutcome};

/// Where pipeline events end up. Only ever called from the consumer loop.
pub enum Reporter {
    Bar(BarReporter),
    Json(JsonReporter),
}

impl Reporter {
    pub fn handle(&self, event: &PipelineEvent) {
        match self {
            Reporter::Bar(r) => r.handle(event),
            Reporter::Json(r) => r.handle(event),
        }
    }

    pub fn finish(&self, result: &Result<RunOutcome, YtGrabError>) {
        match self {
            Reporter::Bar(r) => r.finish(result),
            Reporter::Json(r) => r.finish(result),
        }
    }
}

/// Create a reporter for the requested output mode
pub fn create_reporter(json: bool) -> Reporter {
    if json {
        Reporter::Json(JsonReporter::new())
    } else {
        Reporter::Bar(BarReporter::new())
    }
}
