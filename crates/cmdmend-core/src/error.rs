//! Error types for the corruption and encoding pipeline.

use thiserror::Error;

/// Pipeline-specific errors.
///
/// Everything here is fatal by design: startup resources (vocabulary,
/// corpus, config) either load or the run stops, and a padded-length
/// mismatch signals a configuration bug rather than something to retry.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Vocabulary or corpus file could not be read.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration failed to load or validate.
    #[error("Config error: {message}")]
    Config { message: String },

    /// No corpus line survived filtering; `max_cmd_len` is too small for
    /// the corpus content, or the corpus is empty.
    #[error("Filtered corpus is empty: no line fits within {max_cmd_len} characters")]
    EmptyCorpus { max_cmd_len: usize },

    /// A true command did not pad to exactly the fixed width.
    #[error("Padded command length {actual} does not match max_cmd_len {expected}")]
    PaddedLength { expected: usize, actual: usize },
}

/// Result type for pipeline operations.
pub type PipelineResult<T> = Result<T, PipelineError>;
