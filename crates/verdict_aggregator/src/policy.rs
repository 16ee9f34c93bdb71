//! Spam/not-spam decision policy.

use serde::Serialize;
use std::collections::BTreeMap;

use verdict_protocol::{defaults, TraceId};

use crate::aggregate::ScoreSet;

/// Thresholds and quorum for the spam decision.
///
/// Deliberately asymmetric: one high-confidence algorithm decides alone at
/// any time; a moderate average needs every registered scorer to have
/// reported first.
#[derive(Debug, Clone, PartialEq)]
pub struct DecisionPolicy {
    pub max_score_threshold: f64,
    pub average_score_threshold: f64,
    /// Distinct algorithms required before the average branch is eligible.
    pub quorum: usize,
}

impl DecisionPolicy {
    /// Canonical thresholds with the given quorum.
    pub fn with_quorum(quorum: usize) -> Self {
        Self {
            max_score_threshold: defaults::MAX_SCORE_THRESHOLD,
            average_score_threshold: defaults::AVERAGE_SCORE_THRESHOLD,
            quorum,
        }
    }

    pub fn evaluate(&self, scores: &ScoreSet) -> bool {
        scores.max_score() > self.max_score_threshold
            || (scores.average_score() > self.average_score_threshold
                && scores.report_count() == self.quorum)
    }
}

/// The decision for one request given the evidence recorded so far.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Verdict {
    pub is_spam: bool,
    pub max_score: f64,
    pub average_score: f64,
    pub report_count: usize,
    pub scores: BTreeMap<String, f64>,
    pub root_trace_id: TraceId,
}
