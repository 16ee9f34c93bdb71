//! Versioned score store seam.
//!
//! The real store is an external collaborator; the aggregator only needs
//! keyed load plus a compare-and-set write. The version check turns every
//! read-modify-write into a single atomic update, so concurrent reports
//! for one request key cannot lose each other's scores.

use std::collections::HashMap;
use std::sync::Mutex;
use thiserror::Error;

use crate::aggregate::{RequestKey, ScoreSet};

#[derive(Debug, Error, Clone, PartialEq)]
pub enum StoreError {
    /// The aggregate changed between load and store.
    #[error("version conflict on '{key}'")]
    Conflict { key: String },

    /// The backing store itself failed.
    #[error("store backend failed: {0}")]
    Backend(String),
}

/// One versioned aggregate as read from the store.
#[derive(Debug, Clone, PartialEq)]
pub struct VersionedScores {
    pub version: u64,
    pub scores: ScoreSet,
}

/// Keyed, versioned storage for aggregate score sets.
///
/// `store` succeeds only when `expected_version` matches the stored
/// version; `None` means "create, nothing may exist yet". Aggregates are
/// never deleted here; retention is the store's concern.
pub trait ScoreStore: Send + Sync {
    fn load(&self, key: &RequestKey) -> Result<Option<VersionedScores>, StoreError>;

    fn store(
        &self,
        key: &RequestKey,
        expected_version: Option<u64>,
        scores: &ScoreSet,
    ) -> Result<u64, StoreError>;
}

/// In-memory backend for local runs and tests.
pub struct InMemoryScoreStore {
    entries: Mutex<HashMap<RequestKey, VersionedScores>>,
}

impl InMemoryScoreStore {
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
        }
    }
}

impl Default for InMemoryScoreStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ScoreStore for InMemoryScoreStore {
    fn load(&self, key: &RequestKey) -> Result<Option<VersionedScores>, StoreError> {
        let entries = self.entries.lock().expect("score store lock poisoned");
        Ok(entries.get(key).cloned())
    }

    fn store(
        &self,
        key: &RequestKey,
        expected_version: Option<u64>,
        scores: &ScoreSet,
    ) -> Result<u64, StoreError> {
        let mut entries = self.entries.lock().expect("score store lock poisoned");
        let current_version = entries.get(key).map(|entry| entry.version);
        if current_version != expected_version {
            return Err(StoreError::Conflict {
                key: key.to_string(),
            });
        }

        let version = current_version.unwrap_or(0) + 1;
        entries.insert(
            key.clone(),
            VersionedScores {
                version,
                scores: scores.clone(),
            },
        );
        Ok(version)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use verdict_protocol::ImageRef;

    fn key(account: &str) -> RequestKey {
        RequestKey {
            account_id: account.to_string(),
            image_ref: ImageRef::parse("s3://demo/pic.png").unwrap(),
        }
    }

    #[test]
    fn create_then_update_bumps_version() {
        let store = InMemoryScoreStore::new();
        let key = key("acct-1");

        assert_eq!(store.load(&key).unwrap(), None);

        let mut scores = ScoreSet::new();
        scores.upsert("a", 0.5);
        let v1 = store.store(&key, None, &scores).unwrap();
        assert_eq!(v1, 1);

        scores.upsert("b", 0.7);
        let v2 = store.store(&key, Some(v1), &scores).unwrap();
        assert_eq!(v2, 2);

        let loaded = store.load(&key).unwrap().unwrap();
        assert_eq!(loaded.version, 2);
        assert_eq!(loaded.scores, scores);
    }

    #[test]
    fn stale_version_conflicts() {
        let store = InMemoryScoreStore::new();
        let key = key("acct-1");
        let scores = ScoreSet::new();

        store.store(&key, None, &scores).unwrap();

        // Create-if-absent against an existing entry.
        assert!(matches!(
            store.store(&key, None, &scores),
            Err(StoreError::Conflict { .. })
        ));

        // Update against a stale version.
        assert!(matches!(
            store.store(&key, Some(99), &scores),
            Err(StoreError::Conflict { .. })
        ));
    }
}
