//! Request and score-report envelopes carried across the fan-out/fan-in
//! topics.
//!
//! Wire field names are camelCase (`imageRef`, `postId`, ...). A missing
//! required field is a validation failure at parse time, never a
//! default-fill.

use serde::{Deserialize, Serialize};

use crate::error::PipelineError;
use crate::image_ref::ImageRef;
use crate::score::SpamScore;
use crate::trace::TraceId;

/// Inbound submission body, before a root trace id is assigned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionBody {
    pub image_ref: ImageRef,
    pub post_id: String,
    pub account_id: String,
    pub source_device: String,
    pub created_at: f64,
}

impl SubmissionBody {
    pub fn from_json(raw: &str) -> Result<Self, PipelineError> {
        let body: SubmissionBody = serde_json::from_str(raw)
            .map_err(|e| PipelineError::validation(format!("invalid message body: {}", e)))?;
        body.validate()?;
        Ok(body)
    }

    /// Presence is checked by serde; emptiness is checked here.
    pub fn validate(&self) -> Result<(), PipelineError> {
        require_non_empty("postId", &self.post_id)?;
        require_non_empty("accountId", &self.account_id)?;
        require_non_empty("sourceDevice", &self.source_device)?;
        Ok(())
    }
}

/// Canonical description of one image-scoring request.
///
/// Immutable once created; carried unchanged through fan-out. The root
/// trace id is assigned once at intake and never regenerated downstream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreRequest {
    pub image_ref: ImageRef,
    pub post_id: String,
    pub account_id: String,
    pub source_device: String,
    pub created_at: f64,
    pub root_trace_id: TraceId,
}

impl ScoreRequest {
    /// Tag a validated submission with its freshly assigned root trace id.
    pub fn from_submission(body: SubmissionBody, root_trace_id: TraceId) -> Self {
        Self {
            image_ref: body.image_ref,
            post_id: body.post_id,
            account_id: body.account_id,
            source_device: body.source_device,
            created_at: body.created_at,
            root_trace_id,
        }
    }

    pub fn from_json(raw: &str) -> Result<Self, PipelineError> {
        let request: ScoreRequest = serde_json::from_str(raw)
            .map_err(|e| PipelineError::validation(format!("invalid score request: {}", e)))?;
        request.validate()?;
        Ok(request)
    }

    pub fn validate(&self) -> Result<(), PipelineError> {
        require_non_empty("postId", &self.post_id)?;
        require_non_empty("accountId", &self.account_id)?;
        require_non_empty("sourceDevice", &self.source_device)?;
        Ok(())
    }
}

/// One algorithm's verdict on one request.
///
/// Immutable once published. The transport may deliver it more than once;
/// the aggregator's upsert makes redelivery idempotent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreReport {
    pub algorithm_name: String,
    pub score: f64,
    pub root_trace_id: TraceId,
    pub scorer_trace_id: TraceId,
    pub image_ref: ImageRef,
    pub account_id: String,
}

impl ScoreReport {
    pub fn from_json(raw: &str) -> Result<Self, PipelineError> {
        let report: ScoreReport = serde_json::from_str(raw)
            .map_err(|e| PipelineError::validation(format!("invalid score report: {}", e)))?;
        report.validate()?;
        Ok(report)
    }

    pub fn validate(&self) -> Result<(), PipelineError> {
        require_non_empty("algorithmName", &self.algorithm_name)?;
        require_non_empty("accountId", &self.account_id)?;
        SpamScore::new(self.score)?;
        Ok(())
    }
}

/// Acknowledgment returned to the submitter.
///
/// Echoes the accepted request with its assigned root trace id. It does not
/// imply any scorer has run; fan-out is asynchronous and best-effort.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionAck {
    pub message: String,
    pub request: ScoreRequest,
}

fn require_non_empty(field: &str, value: &str) -> Result<(), PipelineError> {
    if value.trim().is_empty() {
        return Err(PipelineError::validation(format!(
            "required field '{}' is empty",
            field
        )));
    }
    Ok(())
}
