//! Pub/sub seam between the pipeline components.
//!
//! The real delivery substrate is external to the core; components only
//! depend on the [`Publisher`] trait. [`InMemoryTopic`] provides the same
//! contract in-process for local runs and tests: every subscriber receives
//! every message, delivery order across publishers is not guaranteed, and
//! consumers must tolerate duplicates.

use std::sync::Mutex;
use thiserror::Error;
use tokio::sync::mpsc;

pub type Result<T> = std::result::Result<T, BusError>;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BusError {
    /// The topic has no live subscribers; the message went nowhere.
    #[error("topic '{topic}' has no subscribers")]
    NoSubscribers { topic: String },
}

/// Write side of a topic. Publishing is non-blocking.
pub trait Publisher<T>: Send + Sync {
    fn publish(&self, message: T) -> Result<()>;
}

/// In-process fan-out topic.
///
/// Each subscriber gets its own unbounded channel; `publish` clones the
/// message into every live channel. Closed subscribers are pruned on the
/// next publish.
pub struct InMemoryTopic<T> {
    name: String,
    subscribers: Mutex<Vec<mpsc::UnboundedSender<T>>>,
}

impl<T: Clone + Send + 'static> InMemoryTopic<T> {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            subscribers: Mutex::new(Vec::new()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn subscribe(&self) -> mpsc::UnboundedReceiver<T> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.subscribers
            .lock()
            .expect("subscriber list lock poisoned")
            .push(tx);
        rx
    }
}

impl<T: Clone + Send + 'static> Publisher<T> for InMemoryTopic<T> {
    fn publish(&self, message: T) -> Result<()> {
        let mut subscribers = self
            .subscribers
            .lock()
            .expect("subscriber list lock poisoned");
        subscribers.retain(|tx| !tx.is_closed());
        if subscribers.is_empty() {
            return Err(BusError::NoSubscribers {
                topic: self.name.clone(),
            });
        }
        for tx in subscribers.iter() {
            // Receiver liveness was checked above; a concurrent close here
            // is indistinguishable from a crash after delivery.
            let _ = tx.send(message.clone());
        }
        Ok(())
    }
}

/// Test double that records everything published to it.
pub struct CapturingPublisher<T> {
    messages: Mutex<Vec<T>>,
}

impl<T: Clone> CapturingPublisher<T> {
    pub fn new() -> Self {
        Self {
            messages: Mutex::new(Vec::new()),
        }
    }

    pub fn messages(&self) -> Vec<T> {
        self.messages.lock().expect("capture lock poisoned").clone()
    }
}

impl<T: Clone> Default for CapturingPublisher<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone + Send + Sync> Publisher<T> for CapturingPublisher<T> {
    fn publish(&self, message: T) -> Result<()> {
        self.messages
            .lock()
            .expect("capture lock poisoned")
            .push(message);
        Ok(())
    }
}
