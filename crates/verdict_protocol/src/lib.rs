//! Wire envelopes, trace propagation, and the shared error taxonomy for
//! the verdict scoring pipeline.
//!
//! Fan-out carries a [`ScoreRequest`]; fan-in carries a [`ScoreReport`].
//! Both travel as JSON over an at-least-once, unordered substrate, so every
//! envelope carries the correlation ids needed to tie a scattered set of
//! invocations back to one logical request.

pub mod config;
pub mod defaults;
pub mod envelope;
pub mod error;
pub mod image_ref;
pub mod registry;
pub mod response;
pub mod score;
pub mod trace;

// Re-export types for convenience
pub use config::PipelineConfig;
pub use envelope::{ScoreReport, ScoreRequest, SubmissionAck, SubmissionBody};
pub use error::PipelineError;
pub use image_ref::ImageRef;
pub use response::{ApiResponse, MessageDisposition};
pub use score::SpamScore;
pub use trace::{HopLog, TraceContext, TraceId};
