//! Structured ingestion progress events
//!
//! Progress is reported as values through an mpsc channel rather than a
//! string callback. A slow or absent receiver never blocks ingestion: events
//! are dropped when the channel is full or closed.

use strum::Display;
use tokio::sync::mpsc;

/// Stage of an ingestion run a progress event belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "lowercase")]
pub enum IngestStage {
    Fetching,
    Parsing,
    Storing,
    Epg,
    Completed,
    Failed,
}

/// One progress update from an ingestion run
#[derive(Debug, Clone)]
pub struct ProgressEvent {
    pub stage: IngestStage,
    pub message: String,
    /// Records processed so far in this stage, when known
    pub processed: Option<usize>,
}

impl ProgressEvent {
    pub fn new(stage: IngestStage, message: impl Into<String>) -> Self {
        Self {
            stage,
            message: message.into(),
            processed: None,
        }
    }

    pub fn with_processed(mut self, processed: usize) -> Self {
        self.processed = Some(processed);
        self
    }
}

/// Cheap cloneable handle for emitting progress events
///
/// Wraps an optional sender so callers that do not care about progress can
/// pass [`ProgressReporter::disabled`].
#[derive(Clone)]
pub struct ProgressReporter {
    sender: Option<mpsc::Sender<ProgressEvent>>,
}

impl ProgressReporter {
    pub fn new(sender: mpsc::Sender<ProgressEvent>) -> Self {
        Self {
            sender: Some(sender),
        }
    }

    /// Reporter that swallows every event
    pub fn disabled() -> Self {
        Self { sender: None }
    }

    /// Create a reporter together with its receiving end
    pub fn channel(buffer: usize) -> (Self, mpsc::Receiver<ProgressEvent>) {
        let (tx, rx) = mpsc::channel(buffer);
        (Self::new(tx), rx)
    }

    /// Emit an event; drops it if nobody is listening or the buffer is full
    pub fn report(&self, event: ProgressEvent) {
        if let Some(sender) = &self.sender {
            let _ = sender.try_send(event);
        }
    }

    /// Shorthand for a message-only event
    pub fn message(&self, stage: IngestStage, message: impl Into<String>) {
        self.report(ProgressEvent::new(stage, message));
    }
}
