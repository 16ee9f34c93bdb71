//! External vision capability seams.
//!
//! Scorers reach the computer-vision back end through these narrow
//! interfaces; the back end itself is an external collaborator. Detection
//! confidences are percentages in `[0, 100]`.

use std::collections::HashMap;
use std::fmt;
use std::sync::Mutex;
use thiserror::Error;

use verdict_protocol::ImageRef;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum VisionError {
    /// Image bytes could not be retrieved from object storage.
    #[error("failed to fetch '{image}': {message}")]
    Fetch { image: String, message: String },

    /// The detection back end returned an error or malformed response.
    #[error("detection backend failed: {0}")]
    Backend(String),
}

/// One label detected in an image.
#[derive(Debug, Clone, PartialEq)]
pub struct DetectedLabel {
    pub name: String,
    pub confidence: f64,
}

/// One run of text detected in an image.
#[derive(Debug, Clone, PartialEq)]
pub struct DetectedText {
    pub text: String,
    pub confidence: f64,
}

pub trait LabelExtractor: Send + Sync {
    fn extract_labels(&self, image: &ImageRef) -> Result<Vec<DetectedLabel>, VisionError>;
}

pub trait TextExtractor: Send + Sync {
    fn extract_text(&self, image: &ImageRef) -> Result<Vec<DetectedText>, VisionError>;
}

pub trait ImageFetcher: Send + Sync {
    fn fetch(&self, image: &ImageRef) -> Result<Vec<u8>, VisionError>;
}

/// Hash of image content, printable as hex.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ContentHash(String);

impl ContentHash {
    pub fn of_bytes(bytes: &[u8]) -> Self {
        Self(blake3::hash(bytes).to_hex().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Index of known-bad content hashes.
pub trait HashIndex: Send + Sync {
    /// Hash image bytes the way this index expects.
    fn perceptual_hash(&self, bytes: &[u8]) -> ContentHash;

    /// The closest known-bad hash and its content id, if any.
    fn lookup_closest(&self, hash: &ContentHash) -> Option<(ContentHash, String)>;
}

/// Exact-match local index over blake3 content hashes.
///
/// Distance-based matching is a back-end concern; this index answers only
/// "have these exact bytes been flagged before".
pub struct InMemoryHashIndex {
    known: Mutex<HashMap<ContentHash, String>>,
}

impl InMemoryHashIndex {
    pub fn new() -> Self {
        Self {
            known: Mutex::new(HashMap::new()),
        }
    }

    /// Register known-bad content bytes under a content id.
    pub fn insert(&self, bytes: &[u8], content_id: impl Into<String>) {
        self.known
            .lock()
            .expect("hash index lock poisoned")
            .insert(ContentHash::of_bytes(bytes), content_id.into());
    }
}

impl Default for InMemoryHashIndex {
    fn default() -> Self {
        Self::new()
    }
}

impl HashIndex for InMemoryHashIndex {
    fn perceptual_hash(&self, bytes: &[u8]) -> ContentHash {
        ContentHash::of_bytes(bytes)
    }

    fn lookup_closest(&self, hash: &ContentHash) -> Option<(ContentHash, String)> {
        self.known
            .lock()
            .expect("hash index lock poisoned")
            .get(hash)
            .map(|id| (hash.clone(), id.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_hash_is_stable() {
        let a = ContentHash::of_bytes(b"same bytes");
        let b = ContentHash::of_bytes(b"same bytes");
        assert_eq!(a, b);
        assert_ne!(a, ContentHash::of_bytes(b"other bytes"));
    }

    #[test]
    fn index_matches_registered_content_only() {
        let index = InMemoryHashIndex::new();
        index.insert(b"banned image", "bad-001");

        let hit = index.perceptual_hash(b"banned image");
        let (matched, id) = index.lookup_closest(&hit).unwrap();
        assert_eq!(matched, hit);
        assert_eq!(id, "bad-001");

        let miss = index.perceptual_hash(b"innocent image");
        assert!(index.lookup_closest(&miss).is_none());
    }
}
