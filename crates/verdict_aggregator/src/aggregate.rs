//! Per-request aggregate score set.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use verdict_protocol::{ImageRef, ScoreReport};

/// Store key for one logical request.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RequestKey {
    pub account_id: String,
    pub image_ref: ImageRef,
}

impl RequestKey {
    pub fn from_report(report: &ScoreReport) -> Self {
        Self {
            account_id: report.account_id.clone(),
            image_ref: report.image_ref.clone(),
        }
    }
}

impl fmt::Display for RequestKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.account_id, self.image_ref)
    }
}

/// Latest score per algorithm for one request.
///
/// At most one entry per algorithm: a later report overwrites the earlier
/// one, which makes redelivery idempotent and differing redelivery
/// last-write-wins. Derived values are recomputed on read, never cached.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScoreSet {
    scores: BTreeMap<String, f64>,
}

impl ScoreSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn upsert(&mut self, algorithm: &str, score: f64) {
        self.scores.insert(algorithm.to_string(), score);
    }

    pub fn get(&self, algorithm: &str) -> Option<f64> {
        self.scores.get(algorithm).copied()
    }

    pub fn report_count(&self) -> usize {
        self.scores.len()
    }

    pub fn max_score(&self) -> f64 {
        self.scores.values().copied().fold(0.0, f64::max)
    }

    pub fn average_score(&self) -> f64 {
        if self.scores.is_empty() {
            return 0.0;
        }
        self.scores.values().sum::<f64>() / self.scores.len() as f64
    }

    pub fn scores(&self) -> &BTreeMap<String, f64> {
        &self.scores
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upsert_overwrites_per_algorithm() {
        let mut set = ScoreSet::new();
        set.upsert("a", 0.2);
        set.upsert("b", 0.4);
        set.upsert("a", 0.6);

        assert_eq!(set.report_count(), 2);
        assert_eq!(set.get("a"), Some(0.6));
        assert_eq!(set.get("b"), Some(0.4));
    }

    #[test]
    fn derived_values_recomputed_on_read() {
        let mut set = ScoreSet::new();
        assert_eq!(set.max_score(), 0.0);
        assert_eq!(set.average_score(), 0.0);

        set.upsert("a", 0.9);
        set.upsert("b", 0.1);
        assert_eq!(set.max_score(), 0.9);
        assert_eq!(set.average_score(), 0.5);

        set.upsert("a", 0.3);
        assert_eq!(set.max_score(), 0.3);
        assert!((set.average_score() - 0.2).abs() < 1e-12);
    }
}
