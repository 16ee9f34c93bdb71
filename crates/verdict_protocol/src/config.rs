//! Pipeline configuration resolved once at startup.
//!
//! Components never read the environment mid-request; everything they need
//! is resolved here and passed in at construction time. A missing value is
//! a startup failure, not a runtime surprise.

use crate::error::PipelineError;
use crate::registry;

/// Environment variable naming the detection confidence threshold
/// (percent, 0-100).
pub const CONFIDENCE_THRESHOLD_VAR: &str = "VERDICT_CONFIDENCE_THRESHOLD";

/// Environment variable overriding the registered algorithm set
/// (comma-separated names).
pub const ALGORITHMS_VAR: &str = "VERDICT_ALGORITHMS";

/// Canonical pipeline configuration used by every component.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineConfig {
    /// Detections below this confidence (percent) are ignored as evidence.
    pub confidence_threshold: f64,
    /// Algorithms expected to report; the aggregator's quorum.
    pub registered_algorithms: Vec<String>,
}

impl PipelineConfig {
    /// Resolve from the process environment.
    pub fn from_env() -> Result<Self, PipelineError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Resolve from an arbitrary lookup (test seam).
    pub fn from_lookup(
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, PipelineError> {
        let raw = lookup(CONFIDENCE_THRESHOLD_VAR).ok_or_else(|| {
            PipelineError::Configuration(format!("{} is not set", CONFIDENCE_THRESHOLD_VAR))
        })?;
        let confidence_threshold = raw.trim().parse::<f64>().map_err(|_| {
            PipelineError::Configuration(format!(
                "{} is not a number: '{}'",
                CONFIDENCE_THRESHOLD_VAR, raw
            ))
        })?;
        if !(0.0..=100.0).contains(&confidence_threshold) {
            return Err(PipelineError::Configuration(format!(
                "{} must be in [0, 100], got {}",
                CONFIDENCE_THRESHOLD_VAR, confidence_threshold
            )));
        }

        let registered_algorithms = match lookup(ALGORITHMS_VAR) {
            Some(raw) => raw
                .split(',')
                .map(str::trim)
                .filter(|name| !name.is_empty())
                .map(str::to_string)
                .collect(),
            None => registry::all(),
        };
        if registered_algorithms.is_empty() {
            return Err(PipelineError::Configuration(format!(
                "{} names no algorithms",
                ALGORITHMS_VAR
            )));
        }

        Ok(Self {
            confidence_threshold,
            registered_algorithms,
        })
    }

    /// Configuration with the built-in registry and a given threshold.
    pub fn with_threshold(confidence_threshold: f64) -> Self {
        Self {
            confidence_threshold,
            registered_algorithms: registry::all(),
        }
    }

    pub fn quorum(&self) -> usize {
        self.registered_algorithms.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_threshold_and_default_registry() {
        let config = PipelineConfig::from_lookup(|name| {
            (name == CONFIDENCE_THRESHOLD_VAR).then(|| "80".to_string())
        })
        .unwrap();
        assert_eq!(config.confidence_threshold, 80.0);
        assert_eq!(config.registered_algorithms, registry::all());
        assert_eq!(config.quorum(), 3);
    }

    #[test]
    fn missing_threshold_is_a_configuration_error() {
        let err = PipelineConfig::from_lookup(|_| None).unwrap_err();
        assert!(matches!(err, PipelineError::Configuration(_)));
        assert_eq!(err.status_code(), 500);
    }

    #[test]
    fn rejects_threshold_out_of_range() {
        let err = PipelineConfig::from_lookup(|name| {
            (name == CONFIDENCE_THRESHOLD_VAR).then(|| "180".to_string())
        })
        .unwrap_err();
        assert!(matches!(err, PipelineError::Configuration(_)));
    }

    #[test]
    fn algorithm_override_sets_quorum() {
        let config = PipelineConfig::from_lookup(|name| match name {
            CONFIDENCE_THRESHOLD_VAR => Some("50".to_string()),
            ALGORITHMS_VAR => Some("detect_spammy_words, detect_adult_content".to_string()),
            _ => None,
        })
        .unwrap();
        assert_eq!(config.quorum(), 2);
    }

    #[test]
    fn empty_algorithm_override_is_rejected() {
        let err = PipelineConfig::from_lookup(|name| match name {
            CONFIDENCE_THRESHOLD_VAR => Some("50".to_string()),
            ALGORITHMS_VAR => Some(" , ".to_string()),
            _ => None,
        })
        .unwrap_err();
        assert!(matches!(err, PipelineError::Configuration(_)));
    }
}
