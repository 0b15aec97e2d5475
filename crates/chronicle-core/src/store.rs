//! The abstract persistence boundary.

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::{EventStoreError, PublicationError};
use crate::event::{BoxedEvent, DomainEvent};
use crate::field::FieldMap;

/// Event-publication collaborator.
///
/// Invoked once per saved event, after that event's row is durably
/// persisted and before the next event in the batch is processed.
#[async_trait]
pub trait EventPublisher: Send + Sync {
    /// Publishes one saved event.
    ///
    /// # Errors
    ///
    /// Any failure propagates synchronously to the `save` caller.
    async fn publish(&self, event: &dyn DomainEvent) -> Result<(), PublicationError>;
}

/// Post-construction hook assigning store-managed metadata — minimally
/// `version` and `occurredAt` — onto a freshly constructed event.
///
/// Implemented by each concrete store and invoked by the shared
/// reconstruction routine after the constructor has run, with the parsed
/// payload field map. The hook is infallible: metadata it cannot find is
/// left at the constructor's placeholder values.
pub trait AdditionalMappings: Send + Sync {
    /// Populates fields the constructor does not accept directly.
    fn apply(&self, event: &mut dyn DomainEvent, fields: &FieldMap);
}

/// The abstract event store: an append-only log of serialized events.
///
/// `save` persists then publishes each event in input order. A publication
/// failure propagates to the caller while rows persisted before the failure
/// remain persisted — store-then-publish, at-least-once; consumers must be
/// idempotent. `get` replays one aggregate's history in strictly increasing
/// version order. Both operations suspend only on backing-store I/O and
/// publication; cancellation is dropping the in-flight future, and the
/// reconstruction work itself is not a cancellation point.
#[async_trait]
pub trait EventStore: Send + Sync {
    /// Appends the given events, in order, publishing each one after its
    /// row is persisted.
    ///
    /// The version, aggregate id, and timestamp of each row are copied from
    /// the event; the sequence index is assigned by the backing store.
    ///
    /// # Errors
    ///
    /// Returns [`EventStoreError::Storage`] if persistence fails and
    /// [`EventStoreError::Publication`] if the publish step fails.
    async fn save(&self, events: &[BoxedEvent]) -> Result<(), EventStoreError>;

    /// Returns all events for `aggregate_id` with version greater than
    /// `from_version`, in strictly increasing version order.
    ///
    /// An aggregate with no stored rows yields an empty list — success, not
    /// an error. The first row that fails to reconstruct aborts the call
    /// with full row context; callers that prefer skip-and-log drive the
    /// reconstructor over raw rows themselves.
    ///
    /// # Errors
    ///
    /// Returns [`EventStoreError::Storage`] if the read fails and
    /// [`EventStoreError::Reconstruct`] if a row cannot be rebuilt.
    async fn get(
        &self,
        aggregate_id: Uuid,
        from_version: i64,
    ) -> Result<Vec<BoxedEvent>, EventStoreError>;
}
