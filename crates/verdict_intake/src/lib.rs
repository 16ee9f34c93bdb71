//! Intake coordinator: the single entry point that turns an external
//! submission into a score request and starts a new logical request.
//!
//! Acceptance only means the request was published for fan-out; it never
//! implies any scorer has run.

use std::sync::Arc;

use tracing::{error, warn};
use verdict_bus::Publisher;
use verdict_protocol::{
    ApiResponse, HopLog, PipelineError, ScoreRequest, SubmissionAck, SubmissionBody, TraceContext,
};

/// Hop name in trace records.
const HOP: &str = "analyze_image";

pub struct IntakeCoordinator {
    requests: Arc<dyn Publisher<ScoreRequest>>,
}

impl IntakeCoordinator {
    pub fn new(requests: Arc<dyn Publisher<ScoreRequest>>) -> Self {
        Self { requests }
    }

    /// Core operation: validate, allocate a root trace, publish for
    /// fan-out.
    pub fn accept(&self, body: &str) -> Result<SubmissionAck, PipelineError> {
        let body = match SubmissionBody::from_json(body) {
            Ok(body) => body,
            Err(err) => {
                warn!(hop = HOP, error = %err, "rejected submission");
                return Err(err);
            }
        };

        let trace = TraceContext::new_root();
        let hop = HopLog::start(HOP, &trace);

        let request = ScoreRequest::from_submission(body, trace.root_trace_id.clone());
        match self.requests.publish(request.clone()) {
            Ok(()) => {
                hop.finish(200);
                Ok(SubmissionAck {
                    message: "Successfully accepted for processing".to_string(),
                    request,
                })
            }
            Err(err) => {
                let err = PipelineError::algorithm(
                    HOP,
                    format!("failed to publish score request: {}", err),
                );
                error!(
                    hop = HOP,
                    root_trace_id = %trace.root_trace_id,
                    error = %err,
                    "submission not published"
                );
                hop.finish(err.status_code());
                Err(err)
            }
        }
    }

    /// Synchronous (HTTP-shaped) adapter.
    pub fn submit(&self, body: Option<&str>) -> ApiResponse {
        let Some(body) = body else {
            return ApiResponse::bad_request("Error: no POST data received");
        };
        match self.accept(body) {
            Ok(ack) => match serde_json::to_string(&ack) {
                Ok(encoded) => ApiResponse::ok(encoded),
                Err(err) => ApiResponse::from(&PipelineError::algorithm(
                    HOP,
                    format!("failed to encode acknowledgment: {}", err),
                )),
            },
            Err(err) => ApiResponse::from(&err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use verdict_bus::{CapturingPublisher, InMemoryTopic};

    fn body_json() -> &'static str {
        r#"{
            "imageRef": "s3://scalyr-serverless-demo/green.png",
            "postId": "xyz123",
            "accountId": "789",
            "sourceDevice": "iOS",
            "createdAt": 1572457843.0
        }"#
    }

    #[test]
    fn valid_submission_is_acked_and_published() {
        let requests = Arc::new(CapturingPublisher::new());
        let intake = IntakeCoordinator::new(requests.clone());

        let response = intake.submit(Some(body_json()));
        assert_eq!(response.status_code, 200);
        assert!(response.body.contains("rootTraceId"));

        let published = requests.messages();
        assert_eq!(published.len(), 1);
        assert_eq!(published[0].post_id, "xyz123");
    }

    #[test]
    fn each_submission_gets_a_fresh_root() {
        let requests = Arc::new(CapturingPublisher::new());
        let intake = IntakeCoordinator::new(requests.clone());

        intake.accept(body_json()).unwrap();
        intake.accept(body_json()).unwrap();

        let published = requests.messages();
        assert_eq!(published.len(), 2);
        assert_ne!(published[0].root_trace_id, published[1].root_trace_id);
    }

    #[test]
    fn missing_body_is_a_client_error() {
        let intake = IntakeCoordinator::new(Arc::new(CapturingPublisher::new()));
        let response = intake.submit(None);
        assert_eq!(response.status_code, 400);
        assert!(response.body.contains("no POST data"));
    }

    #[test]
    fn missing_field_emits_no_fanout_message() {
        let requests = Arc::new(CapturingPublisher::new());
        let intake = IntakeCoordinator::new(requests.clone());

        let raw = r#"{"imageRef": "s3://b/k", "postId": "p"}"#;
        let response = intake.submit(Some(raw));
        assert_eq!(response.status_code, 400);
        assert!(requests.messages().is_empty());
    }

    #[test]
    fn publish_failure_is_shaped_not_thrown() {
        // A topic with no subscribers rejects the publish.
        let intake = IntakeCoordinator::new(Arc::new(InMemoryTopic::new("analyze_requests")));
        let response = intake.submit(Some(body_json()));
        assert_eq!(response.status_code, 500);
    }

    #[test]
    fn ack_echoes_submission_fields() {
        let intake = IntakeCoordinator::new(Arc::new(CapturingPublisher::new()));
        let ack = intake.accept(body_json()).unwrap();
        assert_eq!(ack.request.post_id, "xyz123");
        assert_eq!(ack.request.account_id, "789");
        assert_eq!(ack.request.source_device, "iOS");
        assert_eq!(ack.request.image_ref.bucket(), "scalyr-serverless-demo");
    }
}
