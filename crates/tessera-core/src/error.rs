//! Error types for the tessera post-processing pipeline.
//!
//! Pipeline errors are organized by failure kind rather than by stage: the
//! caller (a protocol layer) maps each kind onto its own response, so the
//! kind has to be specific while the message carries the detail.

use thiserror::Error;

/// Top-level error type for tessera operations.
#[derive(Error, Debug)]
pub enum TesseraError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Pipeline processing errors
    #[error("Pipeline error: {0}")]
    Pipeline(#[from] PipelineError),

    /// General I/O errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to read the config file from disk
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    /// Failed to parse TOML configuration
    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Configuration values are invalid
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// Pipeline processing errors.
///
/// A failure in any single frame fails the whole request; there is no
/// partial-success variant.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// The caller handed the pipeline something it cannot work with
    /// (empty frame sequence, missing Encode operation, out-of-bounds crop).
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// An operation the active encoder or feature set cannot honour
    #[error("Unsupported operation: {0}")]
    UnsupportedOperation(String),

    /// The multi-frame join did not complete within its bound
    #[error("Processing {frames} frame(s) timed out after {timeout_secs}s")]
    ProcessingTimeout { frames: usize, timeout_secs: u64 },

    /// Decode or encode failed at the codec boundary
    #[error("Codec failure: {0}")]
    CodecFailure(String),

    /// A single transform step could not complete
    #[error("Transform failed in {stage}: {message}")]
    TransformFailure { stage: String, message: String },
}

impl PipelineError {
    /// Shorthand for a [`PipelineError::TransformFailure`] in `stage`.
    pub fn transform(stage: &str, message: impl Into<String>) -> Self {
        Self::TransformFailure {
            stage: stage.to_string(),
            message: message.into(),
        }
    }
}

impl From<image::ImageError> for PipelineError {
    fn from(err: image::ImageError) -> Self {
        Self::CodecFailure(err.to_string())
    }
}

impl From<std::io::Error> for PipelineError {
    fn from(err: std::io::Error) -> Self {
        Self::CodecFailure(err.to_string())
    }
}

/// Convenience type alias for tessera results.
pub type Result<T> = std::result::Result<T, TesseraError>;

/// Convenience type alias for pipeline-specific results.
pub type PipelineResult<T> = std::result::Result<T, PipelineError>;
