//! Object-store image references.

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use url::Url;

use crate::error::PipelineError;

/// URI of an image in object storage, e.g. `s3://bucket/path/file.jpeg`.
///
/// Parsed eagerly so scheme, bucket and key are unambiguous before any
/// scorer runs. Serializes as the raw URI string.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ImageRef {
    raw: String,
    scheme: String,
    bucket: String,
    key: String,
}

impl ImageRef {
    pub fn parse(raw: &str) -> Result<Self, PipelineError> {
        let url = Url::parse(raw).map_err(|e| {
            PipelineError::validation(format!("invalid image reference '{}': {}", raw, e))
        })?;

        let bucket = url.host_str().unwrap_or("").to_string();
        if bucket.is_empty() {
            return Err(PipelineError::validation(format!(
                "image reference '{}' has no bucket",
                raw
            )));
        }

        let key = url.path().trim_start_matches('/').to_string();
        if key.is_empty() {
            return Err(PipelineError::validation(format!(
                "image reference '{}' has no object key",
                raw
            )));
        }

        Ok(Self {
            raw: raw.to_string(),
            scheme: url.scheme().to_string(),
            bucket,
            key,
        })
    }

    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }
}

impl fmt::Display for ImageRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.raw)
    }
}

impl FromStr for ImageRef {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for ImageRef {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.raw)
    }
}

impl<'de> Deserialize<'de> for ImageRef {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        ImageRef::parse(&raw).map_err(de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_s3_url() {
        let image = ImageRef::parse("s3://bucket/path/file.jpeg").unwrap();
        assert_eq!(image.scheme(), "s3");
        assert_eq!(image.bucket(), "bucket");
        assert_eq!(image.key(), "path/file.jpeg");
        assert_eq!(image.as_str(), "s3://bucket/path/file.jpeg");
    }

    #[test]
    fn rejects_missing_bucket_or_key() {
        assert!(ImageRef::parse("s3:///file.jpeg").is_err());
        assert!(ImageRef::parse("s3://bucket").is_err());
        assert!(ImageRef::parse("s3://bucket/").is_err());
        assert!(ImageRef::parse("not a uri").is_err());
    }

    #[test]
    fn serde_round_trips_as_string() {
        let image = ImageRef::parse("s3://demo/green.png").unwrap();
        let json = serde_json::to_string(&image).unwrap();
        assert_eq!(json, "\"s3://demo/green.png\"");

        let back: ImageRef = serde_json::from_str(&json).unwrap();
        assert_eq!(back, image);

        let invalid: Result<ImageRef, _> = serde_json::from_str("\"s3://bucket\"");
        assert!(invalid.is_err());
    }
}
