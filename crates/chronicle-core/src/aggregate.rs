//! Aggregate root abstraction.

use uuid::Uuid;

use crate::event::DomainEvent;

/// Trait for aggregate roots whose state derives entirely from replaying
/// their ordered event history.
pub trait AggregateRoot: Send + Sync {
    /// The event type this aggregate produces and consumes.
    type Event: DomainEvent;

    /// Returns the aggregate identifier.
    fn aggregate_id(&self) -> Uuid;

    /// Returns the current version (number of events applied).
    fn version(&self) -> i64;

    /// Applies one event to mutate internal state.
    fn apply(&mut self, event: &Self::Event);

    /// Returns uncommitted events produced by domain methods, in the order
    /// they were recorded.
    fn uncommitted_events(&self) -> &[Self::Event];

    /// Clears uncommitted events after persistence.
    fn clear_uncommitted_events(&mut self);

    /// Replays a sequence of already-persisted events in order, typically
    /// the result of `EventStore::get`.
    fn replay(&mut self, events: impl IntoIterator<Item = Self::Event>)
    where
        Self: Sized,
    {
        for event in events {
            self.apply(&event);
        }
    }
}
