//! The detection harness: shared orchestration around every scorer variant.
//!
//! Centralizing validation, tracing, publishing, and error shaping here
//! means only the scoring function varies between algorithms. The harness
//! never lets a failure escape unshaped; an escaped failure would look like
//! a crash to the delivery substrate and trigger redelivery.

use std::sync::Arc;

use tracing::{error, info, warn};
use verdict_bus::Publisher;
use verdict_protocol::{
    ApiResponse, HopLog, MessageDisposition, PipelineError, ScoreReport, ScoreRequest, SpamScore,
    TraceContext,
};

/// The one method a detection algorithm must supply.
///
/// The envelope is received read-only; algorithms may call external
/// capabilities but must not mutate the request.
pub trait SpamScorer: Send + Sync {
    fn name(&self) -> &'static str;

    /// Compute this algorithm's spam score in `[0.0, 1.0]`.
    fn score_image(&self, request: &ScoreRequest) -> Result<f64, PipelineError>;
}

/// Non-overridable driver that runs one scorer variant against inbound
/// score requests.
pub struct DetectionHarness {
    scorer: Arc<dyn SpamScorer>,
    reports: Arc<dyn Publisher<ScoreReport>>,
}

impl DetectionHarness {
    pub fn new(scorer: Arc<dyn SpamScorer>, reports: Arc<dyn Publisher<ScoreReport>>) -> Self {
        Self { scorer, reports }
    }

    pub fn algorithm_name(&self) -> &'static str {
        self.scorer.name()
    }

    /// Core operation: validate, derive a child trace, score, publish.
    ///
    /// The algorithm is never invoked for a request that fails validation.
    pub fn handle(&self, raw: &str) -> Result<ScoreReport, PipelineError> {
        let request = match ScoreRequest::from_json(raw) {
            Ok(request) => request,
            Err(err) => {
                warn!(
                    hop = self.scorer.name(),
                    error = %err,
                    "rejected malformed score request"
                );
                return Err(err);
            }
        };

        // The intake's current id equals its root id, so the message
        // boundary rejoins from (root, root).
        let trace = TraceContext::rejoin(
            request.root_trace_id.clone(),
            request.root_trace_id.clone(),
        );
        let hop = HopLog::start(self.scorer.name(), &trace);

        match self.score_and_publish(&request, &trace) {
            Ok(report) => {
                hop.finish(200);
                Ok(report)
            }
            Err(err) => {
                error!(
                    hop = self.scorer.name(),
                    root_trace_id = %trace.root_trace_id,
                    current_trace_id = %trace.current_trace_id,
                    error = %err,
                    "scoring failed"
                );
                hop.finish(err.status_code());
                Err(err)
            }
        }
    }

    fn score_and_publish(
        &self,
        request: &ScoreRequest,
        trace: &TraceContext,
    ) -> Result<ScoreReport, PipelineError> {
        let value = self
            .scorer
            .score_image(request)
            .map_err(|err| self.as_algorithm_error(err))?;

        // An out-of-range score from the algorithm is structurally invalid
        // evidence; redelivery cannot fix it.
        let score = SpamScore::new(value)?;

        let report = ScoreReport {
            algorithm_name: self.scorer.name().to_string(),
            score: score.value(),
            root_trace_id: request.root_trace_id.clone(),
            scorer_trace_id: trace.current_trace_id.clone(),
            image_ref: request.image_ref.clone(),
            account_id: request.account_id.clone(),
        };

        self.reports.publish(report.clone()).map_err(|err| {
            PipelineError::algorithm(
                self.scorer.name(),
                format!("failed to publish score report: {}", err),
            )
        })?;

        info!(
            algorithm = self.scorer.name(),
            score = score.value(),
            root_trace_id = %report.root_trace_id,
            "score reported"
        );
        Ok(report)
    }

    fn as_algorithm_error(&self, err: PipelineError) -> PipelineError {
        match err {
            err @ PipelineError::Algorithm { .. } => err,
            other => PipelineError::algorithm(self.scorer.name(), other.to_string()),
        }
    }

    /// Synchronous (HTTP-shaped) adapter.
    pub fn handle_http(&self, raw: &str) -> ApiResponse {
        match self.handle(raw) {
            Ok(report) => ApiResponse::ok(format!(
                "{} scored {} as {}",
                report.algorithm_name, report.image_ref, report.score
            )),
            Err(err) => ApiResponse::from(&err),
        }
    }

    /// Message-trigger adapter.
    pub fn handle_message(&self, raw: &str) -> MessageDisposition {
        match self.handle(raw) {
            Ok(_) => MessageDisposition::Handled,
            Err(err) => MessageDisposition::from_error(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use verdict_bus::CapturingPublisher;
    use verdict_protocol::TraceId;

    struct FixedScorer {
        value: f64,
    }

    impl SpamScorer for FixedScorer {
        fn name(&self) -> &'static str {
            "fixed"
        }

        fn score_image(&self, _request: &ScoreRequest) -> Result<f64, PipelineError> {
            Ok(self.value)
        }
    }

    struct FailingScorer;

    impl SpamScorer for FailingScorer {
        fn name(&self) -> &'static str {
            "failing"
        }

        fn score_image(&self, _request: &ScoreRequest) -> Result<f64, PipelineError> {
            Err(PipelineError::algorithm("failing", "backend timeout"))
        }
    }

    fn request_json(root: &TraceId) -> String {
        format!(
            r#"{{
                "imageRef": "s3://demo/green.png",
                "postId": "xyz123",
                "accountId": "789",
                "sourceDevice": "iOS",
                "createdAt": 1572457843.0,
                "rootTraceId": "{}"
            }}"#,
            root
        )
    }

    fn make_harness(
        scorer: impl SpamScorer + 'static,
    ) -> (DetectionHarness, Arc<CapturingPublisher<ScoreReport>>) {
        let reports = Arc::new(CapturingPublisher::new());
        let harness = DetectionHarness::new(Arc::new(scorer), reports.clone());
        (harness, reports)
    }

    #[test]
    fn publishes_report_with_propagated_root() {
        let (harness, reports) = make_harness(FixedScorer { value: 0.4 });
        let root = TraceId::new();

        let report = harness.handle(&request_json(&root)).unwrap();
        assert_eq!(report.root_trace_id, root);
        assert_ne!(report.scorer_trace_id, root);
        assert_eq!(report.algorithm_name, "fixed");
        assert_eq!(report.score, 0.4);

        let published = reports.messages();
        assert_eq!(published.len(), 1);
        assert_eq!(published[0], report);
    }

    #[test]
    fn scorer_trace_id_differs_per_invocation() {
        let (harness, _reports) = make_harness(FixedScorer { value: 0.1 });
        let root = TraceId::new();

        let first = harness.handle(&request_json(&root)).unwrap();
        let second = harness.handle(&request_json(&root)).unwrap();
        assert_eq!(first.root_trace_id, second.root_trace_id);
        assert_ne!(first.scorer_trace_id, second.scorer_trace_id);
    }

    #[test]
    fn invalid_request_never_reaches_the_algorithm() {
        let (harness, reports) = make_harness(FixedScorer { value: 0.4 });

        let response = harness.handle_http(r#"{"imageRef": "s3://b/k"}"#);
        assert_eq!(response.status_code, 400);
        assert!(reports.messages().is_empty());
    }

    #[test]
    fn algorithm_failure_is_shaped_not_thrown() {
        let (harness, reports) = make_harness(FailingScorer);
        let root = TraceId::new();

        let response = harness.handle_http(&request_json(&root));
        assert_eq!(response.status_code, 500);
        assert!(response.body.contains("failing"));
        assert!(reports.messages().is_empty());
    }

    #[test]
    fn out_of_range_score_is_rejected_unpublished() {
        let (harness, reports) = make_harness(FixedScorer { value: 1.5 });
        let root = TraceId::new();

        let err = harness.handle(&request_json(&root)).unwrap_err();
        assert!(matches!(err, PipelineError::Validation(_)));
        assert!(reports.messages().is_empty());
    }

    #[test]
    fn message_adapter_maps_errors_to_dispositions() {
        let (harness, _) = make_harness(FixedScorer { value: 0.2 });
        let root = TraceId::new();
        assert!(harness.handle_message(&request_json(&root)).is_handled());

        let (harness, _) = make_harness(FixedScorer { value: 0.2 });
        let dropped = harness.handle_message("not json");
        assert!(matches!(dropped, MessageDisposition::Dropped { .. }));

        let (harness, _) = make_harness(FailingScorer);
        let retry = harness.handle_message(&request_json(&root));
        assert!(matches!(retry, MessageDisposition::Retry { .. }));
    }
}
