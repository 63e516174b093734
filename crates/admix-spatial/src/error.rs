//! Error types for the spatial kernel

use thiserror::Error;

/// Spatial kernel error types
///
/// Only construction and layout handling can fail. The per-block path never
/// returns an error.
#[derive(Error, Debug)]
pub enum SpatialError {
    /// Invalid speaker layout
    #[error("Invalid speaker layout: {0}")]
    InvalidLayout(String),

    /// Layout has nothing to pan onto
    #[error("Layout '{0}' has no non-LFE channels")]
    NoPannableChannels(String),

    /// Collaborator scoped to a different channel count
    #[error("Channel count mismatch: expected {expected}, got {got}")]
    ChannelCountMismatch { expected: usize, got: usize },

    /// JSON (de)serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for spatial operations
pub type SpatialResult<T> = Result<T, SpatialError>;
