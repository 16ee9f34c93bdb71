//! Known-bad-content matching via perceptual hashes.

use std::sync::Arc;

use tracing::info;
use verdict_protocol::{registry, PipelineError, ScoreRequest};

use crate::harness::SpamScorer;
use crate::vision::{HashIndex, ImageFetcher};

/// Scores an image 1.0 when its hash matches previously flagged content,
/// 0.0 otherwise.
pub struct KnownBadContentScorer {
    fetcher: Arc<dyn ImageFetcher>,
    index: Arc<dyn HashIndex>,
}

impl KnownBadContentScorer {
    pub fn new(fetcher: Arc<dyn ImageFetcher>, index: Arc<dyn HashIndex>) -> Self {
        Self { fetcher, index }
    }
}

impl SpamScorer for KnownBadContentScorer {
    fn name(&self) -> &'static str {
        registry::DETECT_KNOWN_BAD_CONTENT
    }

    fn score_image(&self, request: &ScoreRequest) -> Result<f64, PipelineError> {
        let bytes = self
            .fetcher
            .fetch(&request.image_ref)
            .map_err(|err| PipelineError::algorithm(self.name(), err.to_string()))?;

        let hash = self.index.perceptual_hash(&bytes);
        match self.index.lookup_closest(&hash) {
            Some((matched, content_id)) => {
                info!(
                    image = %request.image_ref,
                    matched = %matched,
                    content_id = %content_id,
                    "image matches known-bad content"
                );
                Ok(1.0)
            }
            None => Ok(0.0),
        }
    }
}
