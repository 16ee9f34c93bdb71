//! Canonical default values shared across the pipeline.

/// A single score above this decides spam on its own, regardless of quorum.
pub const MAX_SCORE_THRESHOLD: f64 = 0.75;

/// Average-score branch threshold; only eligible at full quorum.
pub const AVERAGE_SCORE_THRESHOLD: f64 = 0.5;

/// Bounded attempts for the aggregator's compare-and-set loop.
pub const MAX_STORE_ATTEMPTS: u32 = 3;
