//! Test publishers — mock `EventPublisher` implementations for tests.

use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use chronicle_core::error::PublicationError;
use chronicle_core::event::DomainEvent;
use chronicle_core::store::EventPublisher;

/// A lightweight record of one published event.
#[derive(Debug, Clone, PartialEq)]
pub struct PublishedEvent {
    /// The published event's discriminator.
    pub event_type: &'static str,
    /// The aggregate the event belongs to.
    pub aggregate_id: Uuid,
    /// The event's per-aggregate version.
    pub version: i64,
    /// The event's creation instant.
    pub occurred_at: DateTime<Utc>,
    /// The serialized payload that was published.
    pub payload: serde_json::Value,
}

/// A publisher that records every published event and always succeeds.
#[derive(Debug, Default)]
pub struct RecordingPublisher {
    published: Mutex<Vec<PublishedEvent>>,
}

impl RecordingPublisher {
    /// Creates an empty recording publisher.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a snapshot of everything published so far, in order.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    #[must_use]
    pub fn published(&self) -> Vec<PublishedEvent> {
        self.published.lock().unwrap().clone()
    }
}

#[async_trait]
impl EventPublisher for RecordingPublisher {
    async fn publish(&self, event: &dyn DomainEvent) -> Result<(), PublicationError> {
        self.published.lock().unwrap().push(PublishedEvent {
            event_type: event.event_type(),
            aggregate_id: event.aggregate_id(),
            version: event.version(),
            occurred_at: event.occurred_at(),
            payload: event.to_payload(),
        });
        Ok(())
    }
}

/// A publisher that always fails. Useful for testing the store-then-publish
/// failure path.
#[derive(Debug, Default)]
pub struct FailingPublisher;

#[async_trait]
impl EventPublisher for FailingPublisher {
    async fn publish(&self, _event: &dyn DomainEvent) -> Result<(), PublicationError> {
        Err(PublicationError("broker unavailable".into()))
    }
}

/// A publisher that succeeds a fixed number of times, then fails. Useful
/// for testing that rows persisted before a publication failure stay
/// persisted.
#[derive(Debug)]
pub struct FailAfterPublisher {
    remaining: Mutex<usize>,
}

impl FailAfterPublisher {
    /// Creates a publisher that will succeed `successes` times.
    #[must_use]
    pub fn new(successes: usize) -> Self {
        Self {
            remaining: Mutex::new(successes),
        }
    }
}

#[async_trait]
impl EventPublisher for FailAfterPublisher {
    async fn publish(&self, _event: &dyn DomainEvent) -> Result<(), PublicationError> {
        let mut remaining = self.remaining.lock().unwrap();
        if *remaining == 0 {
            return Err(PublicationError("broker unavailable".into()));
        }
        *remaining -= 1;
        Ok(())
    }
}
