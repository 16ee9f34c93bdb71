//! verdict - image spam-scoring pipeline
//!
//! Usage:
//!     VERDICT_CONFIDENCE_THRESHOLD=80 verdict submit \
//!         --image s3://demo-bucket/green.png \
//!         --post-id xyz123 --account-id 789 --source-device ios \
//!         --text green:99 --text hello:97

use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};

use verdict::fixtures::FixtureVision;
use verdict::pipeline::Pipeline;
use verdict_logging::{init_logging, LogConfig};
use verdict_protocol::config::CONFIDENCE_THRESHOLD_VAR;
use verdict_protocol::{PipelineConfig, SubmissionBody};
use verdict_scorer::{DetectedLabel, DetectedText, InMemoryHashIndex};

#[derive(Parser, Debug)]
#[command(name = "verdict", about = "Image spam-scoring pipeline")]
struct Args {
    /// Verbose logging
    #[arg(long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Submit an image and run the local pipeline to a verdict
    Submit {
        /// Object-store URI of the image, e.g. s3://bucket/key
        #[arg(long)]
        image: String,

        /// Unique id of the post
        #[arg(long)]
        post_id: String,

        /// Unique id of the posting account
        #[arg(long)]
        account_id: String,

        /// Device type like ios, android, web
        #[arg(long, default_value = "web")]
        source_device: String,

        /// Unix timestamp of the submission; defaults to now
        #[arg(long)]
        created_at: Option<f64>,

        /// Confidence threshold override (percent, 0-100)
        #[arg(long)]
        confidence_threshold: Option<f64>,

        /// Fixture label as NAME:CONFIDENCE (repeatable)
        #[arg(long = "label")]
        labels: Vec<String>,

        /// Fixture detected text as WORD:CONFIDENCE (repeatable)
        #[arg(long = "text")]
        text: Vec<String>,

        /// URI whose content counts as known-bad (repeatable)
        #[arg(long = "known-bad")]
        known_bad: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    init_logging(LogConfig {
        app_name: "verdict",
        verbose: args.verbose,
        log_to_file: false,
    })?;

    match args.command {
        Command::Submit {
            image,
            post_id,
            account_id,
            source_device,
            created_at,
            confidence_threshold,
            labels,
            text,
            known_bad,
        } => {
            // Flag beats environment; a missing threshold is fatal before
            // any request is processed.
            let config = PipelineConfig::from_lookup(|name| {
                if name == CONFIDENCE_THRESHOLD_VAR {
                    if let Some(threshold) = confidence_threshold {
                        return Some(threshold.to_string());
                    }
                }
                std::env::var(name).ok()
            })?;

            let vision = Arc::new(
                FixtureVision::clean()
                    .with_labels(parse_labels(&labels)?)
                    .with_text(parse_text(&text)?),
            );
            let index = Arc::new(InMemoryHashIndex::new());
            for uri in &known_bad {
                index.insert(uri.as_bytes(), format!("cli:{}", uri));
            }

            let body = SubmissionBody {
                image_ref: image.parse()?,
                post_id,
                account_id,
                source_device,
                created_at: created_at
                    .unwrap_or_else(|| chrono::Utc::now().timestamp() as f64),
            };
            let raw = serde_json::to_string(&body).context("failed to encode submission")?;

            tracing::info!(image = %body.image_ref, "starting local pipeline");
            let mut pipeline = Pipeline::start(&config, vision, index);
            let (response, verdicts) = pipeline.submit_and_wait(&raw).await;

            println!("intake: {} {}", response.status_code, response.body);
            for verdict in &verdicts {
                println!(
                    "report {}/{}: spam={} max={:.3} avg={:.3}",
                    verdict.report_count,
                    config.quorum(),
                    verdict.is_spam,
                    verdict.max_score,
                    verdict.average_score
                );
            }

            pipeline.shutdown().await?;

            match verdicts.last() {
                Some(finale) => {
                    println!(
                        "verdict: {}",
                        serde_json::to_string_pretty(finale)
                            .context("failed to encode verdict")?
                    );
                    Ok(())
                }
                None => bail!("no verdict produced"),
            }
        }
    }
}

fn parse_labels(raw: &[String]) -> Result<Vec<DetectedLabel>> {
    raw.iter()
        .map(|entry| {
            let (name, confidence) = parse_detection(entry)?;
            Ok(DetectedLabel { name, confidence })
        })
        .collect()
}

fn parse_text(raw: &[String]) -> Result<Vec<DetectedText>> {
    raw.iter()
        .map(|entry| {
            let (text, confidence) = parse_detection(entry)?;
            Ok(DetectedText { text, confidence })
        })
        .collect()
}

/// Parse `VALUE:CONFIDENCE`, e.g. `green:99` or `Explicit Nudity:86.5`.
fn parse_detection(entry: &str) -> Result<(String, f64)> {
    let Some((value, confidence)) = entry.rsplit_once(':') else {
        bail!("expected VALUE:CONFIDENCE, got '{}'", entry);
    };
    let confidence: f64 = confidence
        .parse()
        .with_context(|| format!("invalid confidence in '{}'", entry))?;
    Ok((value.to_string(), confidence))
}
