//! Adult-content detection via image labels.

use std::sync::Arc;

use tracing::debug;
use verdict_protocol::{registry, PipelineError, ScoreRequest};

use crate::harness::SpamScorer;
use crate::vision::LabelExtractor;

/// Label names that count as explicit content.
const EXPLICIT_LABELS: &[&str] = &[
    "Explicit Nudity",
    "Nudity",
    "Graphic Male Nudity",
    "Graphic Female Nudity",
    "Sexual Activity",
    "Adult Content",
];

/// Scores an image by the strongest explicit-content label the vision
/// back end reports at or above the configured confidence threshold.
pub struct AdultContentScorer {
    labels: Arc<dyn LabelExtractor>,
    confidence_threshold: f64,
}

impl AdultContentScorer {
    pub fn new(labels: Arc<dyn LabelExtractor>, confidence_threshold: f64) -> Self {
        Self {
            labels,
            confidence_threshold,
        }
    }

    fn is_explicit(name: &str) -> bool {
        EXPLICIT_LABELS
            .iter()
            .any(|label| label.eq_ignore_ascii_case(name))
    }
}

impl SpamScorer for AdultContentScorer {
    fn name(&self) -> &'static str {
        registry::DETECT_ADULT_CONTENT
    }

    fn score_image(&self, request: &ScoreRequest) -> Result<f64, PipelineError> {
        let labels = self
            .labels
            .extract_labels(&request.image_ref)
            .map_err(|err| PipelineError::algorithm(self.name(), err.to_string()))?;

        let mut strongest: f64 = 0.0;
        for label in &labels {
            debug!(
                label = %label.name,
                confidence = label.confidence,
                "detected label"
            );
            if label.confidence >= self.confidence_threshold && Self::is_explicit(&label.name) {
                strongest = strongest.max(label.confidence);
            }
        }

        Ok(strongest / 100.0)
    }
}
