//! Response shaping for the synchronous and asynchronous trigger paths.
//!
//! Core operations return `Result`; a thin adapter per trigger source picks
//! the response shape. The synchronous path always produces a well-formed
//! status/body pair, never an escaped error.

use serde::{Deserialize, Serialize};

use crate::error::PipelineError;

/// HTTP-shaped response returned by every synchronous entry point.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiResponse {
    pub status_code: u16,
    pub body: String,
}

impl ApiResponse {
    pub fn ok(body: impl Into<String>) -> Self {
        Self {
            status_code: 200,
            body: body.into(),
        }
    }

    pub fn bad_request(body: impl Into<String>) -> Self {
        Self {
            status_code: 400,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status_code < 400
    }
}

impl From<&PipelineError> for ApiResponse {
    fn from(error: &PipelineError) -> Self {
        Self {
            status_code: error.status_code(),
            body: format!("Error: {}", error),
        }
    }
}

/// What a message-trigger adapter tells the delivery substrate.
///
/// Validation failures are dropped after logging: redelivering a
/// structurally invalid message cannot succeed. Every other failure is
/// handed back so the runtime can decide whether to redeliver; this core
/// implements no retry loop of its own.
#[derive(Debug, Clone, PartialEq)]
pub enum MessageDisposition {
    /// Message fully processed.
    Handled,
    /// Message invalid; logged and not retried.
    Dropped { reason: String },
    /// Processing failed; the runtime may redeliver.
    Retry { error: PipelineError },
}

impl MessageDisposition {
    pub fn from_error(error: PipelineError) -> Self {
        match error {
            PipelineError::Validation(reason) => MessageDisposition::Dropped { reason },
            other => MessageDisposition::Retry { error: other },
        }
    }

    pub fn is_handled(&self) -> bool {
        matches!(self, MessageDisposition::Handled)
    }
}
