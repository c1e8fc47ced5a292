//! Service layer
//!
//! [`playlist_service`] orchestrates the source handlers and repositories;
//! [`progress`] carries structured progress events back to the caller.

pub mod playlist_service;
pub mod progress;

pub use playlist_service::{ContentSummary, PlaylistService};
pub use progress::{IngestStage, ProgressEvent, ProgressReporter};
