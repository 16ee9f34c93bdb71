//! In-process wiring of the full fan-out/fan-in pipeline.
//!
//! Topics, the score store, and the scorer set are constructed once per
//! process and injected; consumer tasks are the transport's parallelism.
//! Each scorer sees every request independently, and the aggregator sees
//! every report.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::warn;

use verdict_aggregator::{Aggregator, DecisionPolicy, InMemoryScoreStore, Verdict};
use verdict_bus::{InMemoryTopic, Publisher};
use verdict_intake::IntakeCoordinator;
use verdict_protocol::{registry, ApiResponse, PipelineConfig, ScoreReport, ScoreRequest};
use verdict_scorer::{
    AdultContentScorer, DetectionHarness, InMemoryHashIndex, KnownBadContentScorer, SpamScorer,
    SpammyWordsScorer,
};

use crate::fixtures::FixtureVision;

/// How long to wait for any single verdict before giving up on the rest.
const VERDICT_WAIT: Duration = Duration::from_secs(5);

/// A running in-process pipeline.
pub struct Pipeline {
    intake: IntakeCoordinator,
    reports_topic: Arc<InMemoryTopic<ScoreReport>>,
    verdicts: mpsc::UnboundedReceiver<Verdict>,
    tasks: Vec<JoinHandle<()>>,
    quorum: usize,
}

impl Pipeline {
    /// Construct topics, store, and consumers, and start the consumer
    /// tasks.
    pub fn start(
        config: &PipelineConfig,
        vision: Arc<FixtureVision>,
        index: Arc<InMemoryHashIndex>,
    ) -> Self {
        let fan_out: Arc<InMemoryTopic<ScoreRequest>> =
            Arc::new(InMemoryTopic::new("analyze_requests"));
        let fan_in: Arc<InMemoryTopic<ScoreReport>> =
            Arc::new(InMemoryTopic::new("score_reports"));

        let mut tasks = Vec::new();
        for scorer in build_scorers(config, vision, index) {
            let mut requests = fan_out.subscribe();
            let harness = DetectionHarness::new(
                scorer,
                fan_in.clone() as Arc<dyn Publisher<ScoreReport>>,
            );
            tasks.push(tokio::spawn(async move {
                while let Some(request) = requests.recv().await {
                    let raw = match serde_json::to_string(&request) {
                        Ok(raw) => raw,
                        Err(err) => {
                            warn!(error = %err, "failed to encode score request");
                            continue;
                        }
                    };
                    let disposition = harness.handle_message(&raw);
                    if !disposition.is_handled() {
                        warn!(
                            algorithm = harness.algorithm_name(),
                            ?disposition,
                            "score request not handled"
                        );
                    }
                }
            }));
        }

        let store = Arc::new(InMemoryScoreStore::new());
        let aggregator = Aggregator::new(store, DecisionPolicy::with_quorum(config.quorum()));
        let (verdict_tx, verdict_rx) = mpsc::unbounded_channel();
        let mut reports = fan_in.subscribe();
        tasks.push(tokio::spawn(async move {
            while let Some(report) = reports.recv().await {
                match aggregator.record_score(&report) {
                    Ok(verdict) => {
                        let _ = verdict_tx.send(verdict);
                    }
                    Err(err) => warn!(error = %err, "score report rejected"),
                }
            }
        }));

        Self {
            intake: IntakeCoordinator::new(fan_out as Arc<dyn Publisher<ScoreRequest>>),
            reports_topic: fan_in,
            verdicts: verdict_rx,
            tasks,
            quorum: config.quorum(),
        }
    }

    /// Observe the fan-in topic. Subscribe before submitting.
    pub fn observe_reports(&self) -> mpsc::UnboundedReceiver<ScoreReport> {
        self.reports_topic.subscribe()
    }

    /// Submit a body and wait until every registered scorer's report has
    /// been aggregated (or the wait times out, e.g. a scorer failed).
    ///
    /// Returns the intake response and the verdicts in arrival order; the
    /// last one is the final verdict.
    pub async fn submit_and_wait(&mut self, body: &str) -> (ApiResponse, Vec<Verdict>) {
        let response = self.intake.submit(Some(body));
        if !response.is_success() {
            return (response, Vec::new());
        }

        let mut verdicts = Vec::new();
        while verdicts.len() < self.quorum {
            match tokio::time::timeout(VERDICT_WAIT, self.verdicts.recv()).await {
                Ok(Some(verdict)) => verdicts.push(verdict),
                Ok(None) => break,
                Err(_) => {
                    warn!(
                        received = verdicts.len(),
                        expected = self.quorum,
                        "timed out waiting for verdicts"
                    );
                    break;
                }
            }
        }
        (response, verdicts)
    }

    /// Drain the consumer tasks. Dropping the publishers closes every
    /// subscription, so each task ends once its queue is empty.
    pub async fn shutdown(self) -> Result<()> {
        let Pipeline {
            intake,
            reports_topic,
            verdicts,
            tasks,
            ..
        } = self;
        drop(intake);
        drop(reports_topic);
        drop(verdicts);
        for task in tasks {
            task.await?;
        }
        Ok(())
    }
}

/// One scorer instance per registered algorithm name.
fn build_scorers(
    config: &PipelineConfig,
    vision: Arc<FixtureVision>,
    index: Arc<InMemoryHashIndex>,
) -> Vec<Arc<dyn SpamScorer>> {
    let mut scorers: Vec<Arc<dyn SpamScorer>> = Vec::new();
    for name in &config.registered_algorithms {
        match name.as_str() {
            registry::DETECT_ADULT_CONTENT => scorers.push(Arc::new(AdultContentScorer::new(
                vision.clone(),
                config.confidence_threshold,
            ))),
            registry::DETECT_SPAMMY_WORDS => scorers.push(Arc::new(SpammyWordsScorer::new(
                vision.clone(),
                config.confidence_threshold,
            ))),
            registry::DETECT_KNOWN_BAD_CONTENT => scorers.push(Arc::new(
                KnownBadContentScorer::new(vision.clone(), index.clone()),
            )),
            other => warn!(algorithm = other, "no scorer implementation registered"),
        }
    }
    scorers
}
