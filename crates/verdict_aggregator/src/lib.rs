//! Fan-in consolidation for the verdict pipeline.
//!
//! Score reports arrive in arbitrary order, possibly more than once. The
//! aggregator upserts each report into a per-request score set behind a
//! compare-and-set store seam and re-evaluates the decision policy after
//! every single update - a late high-confidence report can flip the
//! verdict.

pub mod aggregate;
pub mod aggregator;
pub mod policy;
pub mod store;

// Re-export types for convenience
pub use aggregate::{RequestKey, ScoreSet};
pub use aggregator::Aggregator;
pub use policy::{DecisionPolicy, Verdict};
pub use store::{InMemoryScoreStore, ScoreStore, StoreError, VersionedScores};
