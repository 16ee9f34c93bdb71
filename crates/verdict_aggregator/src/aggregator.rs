//! Fan-in consolidation and the spam decision.

use std::sync::Arc;

use tracing::{error, info, warn};
use verdict_protocol::{
    defaults, ApiResponse, HopLog, MessageDisposition, PipelineError, ScoreReport, TraceContext,
};

use crate::aggregate::{RequestKey, ScoreSet};
use crate::policy::{DecisionPolicy, Verdict};
use crate::store::{ScoreStore, StoreError};

/// Hop name in trace records.
const HOP: &str = "update_spam_score";

pub struct Aggregator {
    store: Arc<dyn ScoreStore>,
    policy: DecisionPolicy,
}

impl Aggregator {
    pub fn new(store: Arc<dyn ScoreStore>, policy: DecisionPolicy) -> Self {
        Self { store, policy }
    }

    /// Record one report and re-evaluate the decision.
    ///
    /// Correct under arbitrary arrival order and duplicate delivery: the
    /// upsert overwrites per algorithm and the policy is evaluated fresh
    /// on every call, not only once all algorithms have reported.
    pub fn record_score(&self, report: &ScoreReport) -> Result<Verdict, PipelineError> {
        if let Err(err) = report.validate() {
            warn!(hop = HOP, error = %err, "rejected invalid score report");
            return Err(err);
        }

        let trace = TraceContext::rejoin(
            report.root_trace_id.clone(),
            report.scorer_trace_id.clone(),
        );
        let hop = HopLog::start(HOP, &trace);

        match self.upsert_and_decide(report) {
            Ok(verdict) => {
                info!(
                    hop = HOP,
                    algorithm = %report.algorithm_name,
                    score = report.score,
                    is_spam = verdict.is_spam,
                    max_score = verdict.max_score,
                    average_score = verdict.average_score,
                    report_count = verdict.report_count,
                    root_trace_id = %verdict.root_trace_id,
                    "verdict updated"
                );
                hop.finish(200);
                Ok(verdict)
            }
            Err(err) => {
                error!(
                    hop = HOP,
                    root_trace_id = %trace.root_trace_id,
                    current_trace_id = %trace.current_trace_id,
                    error = %err,
                    "failed to record score"
                );
                hop.finish(err.status_code());
                Err(err)
            }
        }
    }

    fn upsert_and_decide(&self, report: &ScoreReport) -> Result<Verdict, PipelineError> {
        let key = RequestKey::from_report(report);

        for attempt in 1..=defaults::MAX_STORE_ATTEMPTS {
            let current = self
                .store
                .load(&key)
                .map_err(|err| PipelineError::algorithm(HOP, err.to_string()))?;

            let (expected_version, mut scores) = match current {
                Some(entry) => (Some(entry.version), entry.scores),
                None => (None, ScoreSet::new()),
            };
            scores.upsert(&report.algorithm_name, report.score);

            match self.store.store(&key, expected_version, &scores) {
                Ok(_) => return Ok(self.verdict_for(report, &scores)),
                Err(StoreError::Conflict { .. }) => {
                    warn!(
                        hop = HOP,
                        key = %key,
                        attempt,
                        "lost compare-and-set race, re-reading"
                    );
                }
                Err(err) => return Err(PipelineError::algorithm(HOP, err.to_string())),
            }
        }

        Err(PipelineError::StoreConflict {
            key: key.to_string(),
            attempts: defaults::MAX_STORE_ATTEMPTS,
        })
    }

    fn verdict_for(&self, report: &ScoreReport, scores: &ScoreSet) -> Verdict {
        Verdict {
            is_spam: self.policy.evaluate(scores),
            max_score: scores.max_score(),
            average_score: scores.average_score(),
            report_count: scores.report_count(),
            scores: scores.scores().clone(),
            root_trace_id: report.root_trace_id.clone(),
        }
    }

    /// Synchronous (HTTP-shaped) adapter.
    pub fn handle_http(&self, raw: &str) -> ApiResponse {
        let report = match ScoreReport::from_json(raw) {
            Ok(report) => report,
            Err(err) => return ApiResponse::from(&err),
        };
        match self.record_score(&report) {
            Ok(verdict) => match serde_json::to_string(&verdict) {
                Ok(body) => ApiResponse::ok(body),
                Err(err) => ApiResponse::from(&PipelineError::algorithm(
                    HOP,
                    format!("failed to encode verdict: {}", err),
                )),
            },
            Err(err) => ApiResponse::from(&err),
        }
    }

    /// Message-trigger adapter.
    pub fn handle_message(&self, raw: &str) -> MessageDisposition {
        let report = match ScoreReport::from_json(raw) {
            Ok(report) => report,
            Err(err) => {
                warn!(hop = HOP, error = %err, "dropping malformed score report");
                return MessageDisposition::from_error(err);
            }
        };
        match self.record_score(&report) {
            Ok(_) => MessageDisposition::Handled,
            Err(err) => MessageDisposition::from_error(err),
        }
    }
}
