//! Progress pipeline - runner output routed through the extractor
//!
//! The consumer (a terminal bar, a GUI event loop) receives events through a
//! channel and is never called from a background task.

use crate::core::{progress, runner};
use crate::error::{Result, YtGrabError};
use crate::types::{LaunchSpec, PipelineEvent, RunOutcome, StreamKind};
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tokio::task::JoinHandle;
use tracing::{debug, trace, warn};

/// Events held for a consumer that is not keeping up
pub const EVENT_CHANNEL_CAPACITY: usize = 256;

/// Run `spec`, sending progress and diagnostics to `events`.
///
/// A dropped receiver does not stop the run; the tool still gets drained and
/// its outcome is still returned. Events that do not fit into a full channel
/// are dropped, so a consumer that never reads costs bounded memory.
pub async fn run_with_progress(
    spec: &LaunchSpec,
    events: mpsc::Sender<PipelineEvent>,
) -> Result<RunOutcome> {
    runner::run(spec, |stream, line| {
        if let Some(event) = route(stream, line) {
            if let Err(TrySendError::Full(event)) = events.try_send(event) {
                debug!(?event, "consumer lagging, event dropped");
            }
        }
    })
    .await
}

/// A pipeline running in the background. Dropping it kills the tool.
pub struct ProgressJob {
    events: mpsc::Receiver<PipelineEvent>,
    handle: JoinHandle<Result<RunOutcome>>,
}

impl ProgressJob {
    /// Next event, or `None` once the tool has finished and all events are read
    pub async fn next_event(&mut self) -> Option<PipelineEvent> {
        self.events.recv().await
    }

    /// Wait for the outcome. Unread events are discarded.
    pub async fn wait(mut self) -> Result<RunOutcome> {
        (&mut self.handle)
            .await
            .map_err(|e| YtGrabError::Task(e.to_string()))?
    }
}

impl Drop for ProgressJob {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// Start `spec` on a background task and return immediately
pub fn spawn(spec: LaunchSpec) -> ProgressJob {
    let (tx, rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
    let handle = tokio::spawn(async move { run_with_progress(&spec, tx).await });

    ProgressJob { events: rx, handle }
}

fn route(stream: StreamKind, line: &str) -> Option<PipelineEvent> {
    match stream {
        StreamKind::Stdout => match progress::extract(line) {
            Some(event) => {
                trace!(percentage = event.percentage(), "progress");
                Some(PipelineEvent::Progress(event))
            }
            None => {
                debug!(target: "yt_grab::tool", "{}", line);
                None
            }
        },
        StreamKind::Stderr => {
            let line = line.trim();
            if is_diagnostic(line) {
                warn!(target: "yt_grab::tool", "{}", line);
                Some(PipelineEvent::Diagnostic(line.to_string()))
            } else {
                debug!(target: "yt_grab::tool", stream = "stderr", "{}", line);
                None
            }
        }
    }
}

fn is_diagnostic(line: &str) -> bool {
    line.starts_with("ERROR:") || line.starts_with("WARNING:")
}
