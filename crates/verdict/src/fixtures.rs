//! Fixture vision backends for local runs.
//!
//! Stand-ins for the external label/text-extraction capabilities. The
//! detections are fixed at construction time; object fetches fall back to
//! the URI bytes so every referenced image "exists" locally.

use std::collections::HashMap;

use verdict_protocol::ImageRef;
use verdict_scorer::{
    DetectedLabel, DetectedText, ImageFetcher, LabelExtractor, TextExtractor, VisionError,
};

pub struct FixtureVision {
    labels: Vec<DetectedLabel>,
    text: Vec<DetectedText>,
    objects: HashMap<String, Vec<u8>>,
}

impl FixtureVision {
    /// A backend that detects nothing.
    pub fn clean() -> Self {
        Self {
            labels: Vec::new(),
            text: Vec::new(),
            objects: HashMap::new(),
        }
    }

    pub fn with_labels(mut self, labels: Vec<DetectedLabel>) -> Self {
        self.labels = labels;
        self
    }

    pub fn with_text(mut self, text: Vec<DetectedText>) -> Self {
        self.text = text;
        self
    }

    pub fn with_object(mut self, uri: impl Into<String>, bytes: Vec<u8>) -> Self {
        self.objects.insert(uri.into(), bytes);
        self
    }
}

impl LabelExtractor for FixtureVision {
    fn extract_labels(&self, _image: &ImageRef) -> Result<Vec<DetectedLabel>, VisionError> {
        Ok(self.labels.clone())
    }
}

impl TextExtractor for FixtureVision {
    fn extract_text(&self, _image: &ImageRef) -> Result<Vec<DetectedText>, VisionError> {
        Ok(self.text.clone())
    }
}

impl ImageFetcher for FixtureVision {
    fn fetch(&self, image: &ImageRef) -> Result<Vec<u8>, VisionError> {
        Ok(self
            .objects
            .get(image.as_str())
            .cloned()
            .unwrap_or_else(|| image.as_str().as_bytes().to_vec()))
    }
}
