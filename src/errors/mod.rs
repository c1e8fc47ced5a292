//! Error handling for playlist-ingest
//!
//! Exposes the application error hierarchy and the `AppResult` alias used
//! throughout the ingestion path.

pub mod types;

pub use types::{AppError, RepositoryError, SourceError};

/// Convenience result alias for application operations
pub type AppResult<T> = Result<T, AppError>;
