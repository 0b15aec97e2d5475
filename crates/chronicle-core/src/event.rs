//! Domain event abstractions.

use std::any::Any;

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Trait that all domain events implement.
///
/// Events are flat values: the domain fields authored by the aggregate plus
/// the store-managed `version` and `occurred_at` metadata. The metadata has
/// assigners because reconstruction builds an event from its constructor
/// arguments first, then lets the concrete store assign metadata through its
/// [`AdditionalMappings`](crate::store::AdditionalMappings) hook.
pub trait DomainEvent: Send + Sync + std::fmt::Debug {
    /// Returns the event type name (the stored discriminator).
    fn event_type(&self) -> &'static str;

    /// Returns the aggregate this event belongs to.
    fn aggregate_id(&self) -> Uuid;

    /// Returns the per-aggregate version of this event.
    fn version(&self) -> i64;

    /// Assigns the per-aggregate version (store-managed).
    fn assign_version(&mut self, version: i64);

    /// Returns the creation instant, UTC.
    fn occurred_at(&self) -> DateTime<Utc>;

    /// Assigns the creation instant (store-managed).
    fn assign_occurred_at(&mut self, occurred_at: DateTime<Utc>);

    /// Serializes the event to its payload form.
    ///
    /// Payloads are JSON objects with camelCase field names. The whole event
    /// is serialized, so `version` and `occurredAt` travel alongside the
    /// domain fields and are available to the reconstruction hook.
    fn to_payload(&self) -> serde_json::Value;

    /// Upcast used to downcast to the concrete event type.
    fn as_any(&self) -> &dyn Any;
}

/// An owned, type-erased domain event.
pub type BoxedEvent = Box<dyn DomainEvent>;

impl DomainEvent for BoxedEvent {
    fn event_type(&self) -> &'static str {
        (**self).event_type()
    }

    fn aggregate_id(&self) -> Uuid {
        (**self).aggregate_id()
    }

    fn version(&self) -> i64 {
        (**self).version()
    }

    fn assign_version(&mut self, version: i64) {
        (**self).assign_version(version);
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        (**self).occurred_at()
    }

    fn assign_occurred_at(&mut self, occurred_at: DateTime<Utc>) {
        (**self).assign_occurred_at(occurred_at);
    }

    fn to_payload(&self) -> serde_json::Value {
        (**self).to_payload()
    }

    fn as_any(&self) -> &dyn Any {
        (**self).as_any()
    }
}
