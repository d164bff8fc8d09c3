//! Error types for model construction and training.

use thiserror::Error;

use cmdmend_core::PipelineError;

/// Model-side errors.
#[derive(Debug, Error)]
pub enum ModelError {
    /// A tensor operation failed.
    #[error("Tensor error: {0}")]
    Candle(#[from] candle_core::Error),

    /// The batch pipeline failed; fatal per its own contract.
    #[error("Pipeline error: {0}")]
    Pipeline(#[from] PipelineError),

    /// Checkpoint file could not be written, read, or matched to the net.
    #[error("Checkpoint error: {message}")]
    Checkpoint { message: String },

    /// The batch source stopped producing; it is unbounded by contract.
    #[error("Batch source ended unexpectedly")]
    BatchSourceEnded,

    /// IO error outside the pipeline (models directory, checkpoint files).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for model operations.
pub type ModelResult<T> = Result<T, ModelError>;
