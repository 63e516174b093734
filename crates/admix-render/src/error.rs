//! Error types for the object renderer

use admix_spatial::SpatialError;
use thiserror::Error;

/// Renderer error types
#[derive(Error, Debug)]
pub enum RenderError {
    /// Spatial kernel error
    #[error("Spatial error: {0}")]
    Spatial(#[from] SpatialError),

    /// Metadata refers to a track the renderer was not configured with
    #[error("Unknown object track: {0}")]
    UnknownTrack(u32),

    /// Input block longer than the configured maximum
    #[error("Block too large: max {max} samples, got {got}")]
    BlockTooLarge { max: usize, got: usize },

    /// Output buffer channel count differs from the layout
    #[error("Output channel mismatch: expected {expected}, got {got}")]
    OutputChannelMismatch { expected: usize, got: usize },

    /// Output buffer shorter than the requested render length
    #[error("Output channel {channel} too short: expected {expected} samples, got {got}")]
    OutputTooShort {
        channel: usize,
        expected: usize,
        got: usize,
    },

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// FFT error
    #[error("FFT error: {0}")]
    Fft(#[from] realfft::FftError),

    /// JSON (de)serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for renderer operations
pub type RenderResult<T> = Result<T, RenderError>;
