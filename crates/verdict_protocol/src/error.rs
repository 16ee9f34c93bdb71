//! Shared error taxonomy for intake, scorers, and the aggregator.
//!
//! Each class fixes both the synchronous response shape and the
//! asynchronous disposition (drop vs. redeliver). Every error is logged
//! with full trace context before being converted to a response; none is
//! silently swallowed.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, PipelineError>;

/// Failure classes shared across every component in the pipeline.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum PipelineError {
    /// Malformed or incomplete input. Recovered at the boundary; retry
    /// cannot fix a structurally invalid message.
    #[error("validation failed: {0}")]
    Validation(String),

    /// A scoring algorithm or one of its external capabilities failed.
    #[error("algorithm '{algorithm}' failed: {message}")]
    Algorithm { algorithm: String, message: String },

    /// Required configuration absent or invalid at startup. Fatal until
    /// corrected; never retried per-request.
    #[error("missing or invalid configuration: {0}")]
    Configuration(String),

    /// The aggregate update lost its compare-and-set race repeatedly.
    #[error("score store conflict on '{key}' after {attempts} attempts")]
    StoreConflict { key: String, attempts: u32 },
}

impl PipelineError {
    pub fn validation(message: impl Into<String>) -> Self {
        PipelineError::Validation(message.into())
    }

    pub fn algorithm(algorithm: impl Into<String>, message: impl Into<String>) -> Self {
        PipelineError::Algorithm {
            algorithm: algorithm.into(),
            message: message.into(),
        }
    }

    /// HTTP-equivalent status code for the synchronous path.
    pub fn status_code(&self) -> u16 {
        match self {
            PipelineError::Validation(_) => 400,
            PipelineError::Algorithm { .. } => 500,
            PipelineError::Configuration(_) => 500,
            PipelineError::StoreConflict { .. } => 500,
        }
    }

    /// Whether redelivery may succeed on the asynchronous path.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, PipelineError::Validation(_))
    }
}
