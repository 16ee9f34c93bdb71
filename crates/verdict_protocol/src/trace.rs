//! Trace context propagation for correlating asynchronous hops.
//!
//! A logical request is identified by a root trace id assigned exactly once
//! at intake. Every downstream hop derives a child context: the root id is
//! carried verbatim, the parent id becomes the upstream hop's current id,
//! and the current id is freshly assigned per invocation. Ids are assigned,
//! never computed from content.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Instant;
use uuid::Uuid;

/// Error returned when parsing a trace id fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraceIdParseError {
    message: String,
}

impl fmt::Display for TraceIdParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for TraceIdParseError {}

/// Opaque identifier for one execution hop.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TraceId(String);

impl TraceId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn parse(value: &str) -> Result<Self, TraceIdParseError> {
        Uuid::parse_str(value).map_err(|e| TraceIdParseError {
            message: format!("Invalid trace ID: {}", e),
        })?;
        Ok(Self(value.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for TraceId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TraceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for TraceId {
    type Err = TraceIdParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Root/parent/current identifier triple for one invocation.
///
/// The root id identifies the entire logical request, the parent id the
/// immediate upstream hop, and the current id this invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraceContext {
    pub root_trace_id: TraceId,
    pub parent_trace_id: TraceId,
    pub current_trace_id: TraceId,
}

impl TraceContext {
    /// Start a new logical request. All three ids collapse to one fresh id.
    ///
    /// Used only at the intake coordinator.
    pub fn new_root() -> Self {
        let id = TraceId::new();
        Self {
            root_trace_id: id.clone(),
            parent_trace_id: id.clone(),
            current_trace_id: id,
        }
    }

    /// Derive the context for a downstream hop from an in-process parent.
    pub fn child_of(parent: &TraceContext) -> Self {
        Self {
            root_trace_id: parent.root_trace_id.clone(),
            parent_trace_id: parent.current_trace_id.clone(),
            current_trace_id: TraceId::new(),
        }
    }

    /// Rebuild a child context at a message boundary, where only the
    /// correlation ids travelled with the envelope.
    ///
    /// A scorer rejoins from `(root, root)` - the intake's current id equals
    /// its root id by construction. The aggregator rejoins from
    /// `(root, scorer_trace_id)`.
    pub fn rejoin(root_trace_id: TraceId, parent_trace_id: TraceId) -> Self {
        Self {
            root_trace_id,
            parent_trace_id,
            current_trace_id: TraceId::new(),
        }
    }
}

/// Structured start/end records for one hop.
///
/// Every component emits a start record on entry and an end record with the
/// response status and elapsed time on exit, on every path including
/// failure. These records are the only observability signal that crosses
/// the asynchronous boundary.
#[derive(Debug)]
pub struct HopLog {
    hop: &'static str,
    trace: TraceContext,
    started: Instant,
}

impl HopLog {
    pub fn start(hop: &'static str, trace: &TraceContext) -> Self {
        tracing::info!(
            hop,
            root_trace_id = %trace.root_trace_id,
            parent_trace_id = %trace.parent_trace_id,
            current_trace_id = %trace.current_trace_id,
            "hop start"
        );
        Self {
            hop,
            trace: trace.clone(),
            started: Instant::now(),
        }
    }

    pub fn finish(self, status_code: u16) {
        let elapsed_ms = self.started.elapsed().as_millis() as u64;
        tracing::info!(
            hop = self.hop,
            status_code,
            root_trace_id = %self.trace.root_trace_id,
            parent_trace_id = %self.trace.parent_trace_id,
            current_trace_id = %self.trace.current_trace_id,
            elapsed_ms,
            "hop end"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_root_collapses_all_ids() {
        let ctx = TraceContext::new_root();
        assert_eq!(ctx.root_trace_id, ctx.parent_trace_id);
        assert_eq!(ctx.root_trace_id, ctx.current_trace_id);
    }

    #[test]
    fn distinct_roots_get_distinct_ids() {
        let a = TraceContext::new_root();
        let b = TraceContext::new_root();
        assert_ne!(a.root_trace_id, b.root_trace_id);
    }

    #[test]
    fn child_carries_root_verbatim() {
        let root = TraceContext::new_root();
        let child = TraceContext::child_of(&root);
        assert_eq!(child.root_trace_id, root.root_trace_id);
        assert_eq!(child.parent_trace_id, root.current_trace_id);
        assert_ne!(child.current_trace_id, root.current_trace_id);

        let grandchild = TraceContext::child_of(&child);
        assert_eq!(grandchild.root_trace_id, root.root_trace_id);
        assert_eq!(grandchild.parent_trace_id, child.current_trace_id);
    }

    #[test]
    fn rejoin_assigns_fresh_current() {
        let root = TraceId::new();
        let parent = TraceId::new();
        let ctx = TraceContext::rejoin(root.clone(), parent.clone());
        assert_eq!(ctx.root_trace_id, root);
        assert_eq!(ctx.parent_trace_id, parent);
        assert_ne!(ctx.current_trace_id, root);
        assert_ne!(ctx.current_trace_id, parent);
    }

    #[test]
    fn trace_id_parse_round_trip() {
        let id = TraceId::new();
        let parsed = TraceId::parse(id.as_str()).unwrap();
        assert_eq!(parsed, id);

        assert!(TraceId::parse("not-a-uuid").is_err());
    }
}
