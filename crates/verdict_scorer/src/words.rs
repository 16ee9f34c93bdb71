//! Spammy-word detection via text extracted from the image.

use std::sync::Arc;

use tracing::debug;
use verdict_protocol::{registry, PipelineError, ScoreRequest};

use crate::harness::SpamScorer;
use crate::vision::TextExtractor;

/// Built-in wordlist for local runs; deployments supply their own.
const DEFAULT_FLAGGED_WORDS: &[&str] = &["red", "green", "blue", "yellow", "purple", "orange"];

/// Scores an image by the share of detected words that appear on a
/// flagged-word list.
pub struct SpammyWordsScorer {
    text: Arc<dyn TextExtractor>,
    confidence_threshold: f64,
    flagged_words: Vec<String>,
}

impl SpammyWordsScorer {
    pub fn new(text: Arc<dyn TextExtractor>, confidence_threshold: f64) -> Self {
        Self::with_wordlist(
            text,
            confidence_threshold,
            DEFAULT_FLAGGED_WORDS.iter().map(|w| w.to_string()).collect(),
        )
    }

    pub fn with_wordlist(
        text: Arc<dyn TextExtractor>,
        confidence_threshold: f64,
        flagged_words: Vec<String>,
    ) -> Self {
        Self {
            text,
            confidence_threshold,
            flagged_words,
        }
    }

    fn is_flagged(&self, word: &str) -> bool {
        self.flagged_words
            .iter()
            .any(|flagged| flagged.eq_ignore_ascii_case(word))
    }

    /// Ratio of flagged words to detected words, both capped at 10 so a
    /// handful of hits in a text-dense image still registers.
    fn calculate_score(total_words: usize, flagged_words: usize) -> f64 {
        flagged_words.min(10) as f64 / total_words.min(10) as f64
    }
}

impl SpamScorer for SpammyWordsScorer {
    fn name(&self) -> &'static str {
        registry::DETECT_SPAMMY_WORDS
    }

    fn score_image(&self, request: &ScoreRequest) -> Result<f64, PipelineError> {
        let detections = self
            .text
            .extract_text(&request.image_ref)
            .map_err(|err| PipelineError::algorithm(self.name(), err.to_string()))?;

        // No text at all is not evidence either way.
        if detections.is_empty() {
            return Ok(0.0);
        }

        let mut flagged = 0usize;
        for detection in &detections {
            debug!(
                text = %detection.text,
                confidence = detection.confidence,
                "detected text"
            );
            if detection.confidence >= self.confidence_threshold && self.is_flagged(&detection.text)
            {
                flagged += 1;
            }
        }

        Ok(Self::calculate_score(detections.len(), flagged))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vision::{DetectedText, VisionError};
    use verdict_protocol::{ImageRef, TraceId};

    struct FixedText(Vec<DetectedText>);

    impl TextExtractor for FixedText {
        fn extract_text(&self, _image: &ImageRef) -> Result<Vec<DetectedText>, VisionError> {
            Ok(self.0.clone())
        }
    }

    fn request() -> ScoreRequest {
        ScoreRequest {
            image_ref: ImageRef::parse("s3://demo/words.png").unwrap(),
            post_id: "p1".to_string(),
            account_id: "a1".to_string(),
            source_device: "web".to_string(),
            created_at: 1.0,
            root_trace_id: TraceId::new(),
        }
    }

    fn text(value: &str, confidence: f64) -> DetectedText {
        DetectedText {
            text: value.to_string(),
            confidence,
        }
    }

    #[test]
    fn flagged_ratio_drives_the_score() {
        let scorer = SpammyWordsScorer::new(
            Arc::new(FixedText(vec![
                text("green", 99.0),
                text("hello", 99.0),
                text("blue", 95.0),
                text("world", 92.0),
            ])),
            80.0,
        );
        assert_eq!(scorer.score_image(&request()).unwrap(), 0.5);
    }

    #[test]
    fn no_detected_text_scores_zero() {
        let scorer = SpammyWordsScorer::new(Arc::new(FixedText(vec![])), 80.0);
        assert_eq!(scorer.score_image(&request()).unwrap(), 0.0);
    }

    #[test]
    fn low_confidence_detections_do_not_count() {
        let scorer = SpammyWordsScorer::new(
            Arc::new(FixedText(vec![text("green", 50.0), text("blue", 79.9)])),
            80.0,
        );
        assert_eq!(scorer.score_image(&request()).unwrap(), 0.0);
    }

    #[test]
    fn caps_keep_dense_images_in_range() {
        let detections: Vec<DetectedText> = (0..40).map(|_| text("purple", 99.0)).collect();
        let scorer = SpammyWordsScorer::new(Arc::new(FixedText(detections)), 80.0);
        assert_eq!(scorer.score_image(&request()).unwrap(), 1.0);
    }

    #[test]
    fn custom_wordlist_overrides_default() {
        let scorer = SpammyWordsScorer::with_wordlist(
            Arc::new(FixedText(vec![text("win-big", 99.0), text("hello", 99.0)])),
            80.0,
            vec!["win-big".to_string()],
        );
        assert_eq!(scorer.score_image(&request()).unwrap(), 0.5);
    }
}
