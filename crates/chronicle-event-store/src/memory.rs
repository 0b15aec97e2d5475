//! In-memory event store for tests and examples.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use uuid::Uuid;

use chronicle_core::error::EventStoreError;
use chronicle_core::event::{BoxedEvent, DomainEvent};
use chronicle_core::field::FieldMap;
use chronicle_core::reconstruct::EventReconstructor;
use chronicle_core::registry::EventTypeRegistry;
use chronicle_core::row::StoredEventRow;
use chronicle_core::store::{AdditionalMappings, EventPublisher, EventStore};

use crate::mappings::assign_store_metadata;

/// Thread-safe in-memory event store.
///
/// Keeps per-aggregate streams in a hash map with a global sequence
/// counter and enforces the gap-free version invariant on append. `Clone`
/// is cheap: all state is `Arc`-wrapped. The stream lock is never held
/// across an await; publication happens after the write guard drops.
#[derive(Clone)]
pub struct InMemoryEventStore {
    reconstructor: Arc<EventReconstructor>,
    publisher: Arc<dyn EventPublisher>,
    inner: Arc<RwLock<Inner>>,
}

struct Inner {
    streams: HashMap<Uuid, Vec<StoredEventRow>>,
    next_sequence: i64,
}

impl std::fmt::Debug for InMemoryEventStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.read().expect("in-memory store lock poisoned");
        f.debug_struct("InMemoryEventStore")
            .field("streams", &inner.streams.len())
            .field("next_sequence", &inner.next_sequence)
            .finish_non_exhaustive()
    }
}

impl InMemoryEventStore {
    /// Creates a store over a startup-validated registry and a publisher.
    #[must_use]
    pub fn new(registry: Arc<EventTypeRegistry>, publisher: Arc<dyn EventPublisher>) -> Self {
        Self {
            reconstructor: Arc::new(EventReconstructor::new(registry)),
            publisher,
            inner: Arc::new(RwLock::new(Inner {
                streams: HashMap::new(),
                next_sequence: 1,
            })),
        }
    }

    /// The reconstructor driving this store's read path, exposed so tests
    /// can observe the activator cache.
    #[must_use]
    pub fn reconstructor(&self) -> &EventReconstructor {
        &self.reconstructor
    }

    /// Returns a snapshot of the stored rows for one aggregate, in version
    /// order. Intended for diagnostics and tests.
    ///
    /// # Panics
    ///
    /// Panics if the stream lock is poisoned.
    #[must_use]
    pub fn rows(&self, aggregate_id: Uuid) -> Vec<StoredEventRow> {
        let inner = self.inner.read().expect("in-memory store lock poisoned");
        inner
            .streams
            .get(&aggregate_id)
            .cloned()
            .unwrap_or_default()
    }

    fn append_row(&self, event: &dyn DomainEvent) -> Result<(), EventStoreError> {
        let payload = event.to_payload();
        let mut inner = self.inner.write().expect("in-memory store lock poisoned");

        let expected = inner
            .streams
            .get(&event.aggregate_id())
            .and_then(|stream| stream.last())
            .map_or(1, |row| row.version + 1);
        if event.version() != expected {
            return Err(EventStoreError::Storage(format!(
                "version conflict on aggregate {}: expected {expected}, got {}",
                event.aggregate_id(),
                event.version()
            )));
        }

        let sequence_index = inner.next_sequence;
        inner.next_sequence += 1;
        inner
            .streams
            .entry(event.aggregate_id())
            .or_default()
            .push(StoredEventRow {
                sequence_index,
                aggregate_id: event.aggregate_id(),
                version: event.version(),
                payload,
                occurred_at: event.occurred_at(),
                event_type_name: event.event_type().to_owned(),
            });
        Ok(())
    }
}

#[async_trait]
impl EventStore for InMemoryEventStore {
    #[tracing::instrument(skip(self, events), fields(event_count = events.len()))]
    async fn save(&self, events: &[BoxedEvent]) -> Result<(), EventStoreError> {
        for event in events {
            self.append_row(event.as_ref())?;
            self.publisher
                .publish(event.as_ref())
                .await
                .map_err(|source| EventStoreError::Publication {
                    aggregate_id: event.aggregate_id(),
                    version: event.version(),
                    source,
                })?;
        }
        tracing::debug!(events_appended = events.len(), "events saved");
        Ok(())
    }

    #[tracing::instrument(skip(self))]
    async fn get(
        &self,
        aggregate_id: Uuid,
        from_version: i64,
    ) -> Result<Vec<BoxedEvent>, EventStoreError> {
        let rows: Vec<StoredEventRow> = {
            let inner = self.inner.read().expect("in-memory store lock poisoned");
            inner.streams.get(&aggregate_id).map_or_else(Vec::new, |stream| {
                stream
                    .iter()
                    .filter(|row| row.version > from_version)
                    .cloned()
                    .collect()
            })
        };

        let mut events = Vec::with_capacity(rows.len());
        for row in &rows {
            events.push(self.reconstructor.reconstruct(row, self)?);
        }
        tracing::debug!(count = events.len(), "replayed events");
        Ok(events)
    }
}

impl AdditionalMappings for InMemoryEventStore {
    fn apply(&self, event: &mut dyn DomainEvent, fields: &FieldMap) {
        assign_store_metadata(event, fields);
    }
}

#[cfg(test)]
mod tests {
    use std::any::Any;
    use std::sync::Arc;

    use chrono::{DateTime, TimeZone, Utc};
    use serde_json::json;
    use uuid::Uuid;

    use chronicle_core::error::EventStoreError;
    use chronicle_core::event::{BoxedEvent, DomainEvent};
    use chronicle_core::field::FieldKind;
    use chronicle_core::registry::{EventTypeRegistration, EventTypeRegistry};
    use chronicle_core::store::EventStore;
    use chronicle_test_support::RecordingPublisher;

    use super::InMemoryEventStore;

    #[derive(Debug, Clone)]
    struct Counted {
        aggregate_id: Uuid,
        count: i64,
        version: i64,
        occurred_at: DateTime<Utc>,
    }

    impl Counted {
        fn boxed(aggregate_id: Uuid, count: i64, version: i64) -> BoxedEvent {
            Box::new(Self {
                aggregate_id,
                count,
                version,
                occurred_at: Utc.with_ymd_and_hms(2026, 1, 15, 10, 0, 0).unwrap(),
            })
        }
    }

    impl DomainEvent for Counted {
        fn event_type(&self) -> &'static str {
            "test.counted"
        }

        fn aggregate_id(&self) -> Uuid {
            self.aggregate_id
        }

        fn version(&self) -> i64 {
            self.version
        }

        fn assign_version(&mut self, version: i64) {
            self.version = version;
        }

        fn occurred_at(&self) -> DateTime<Utc> {
            self.occurred_at
        }

        fn assign_occurred_at(&mut self, occurred_at: DateTime<Utc>) {
            self.occurred_at = occurred_at;
        }

        fn to_payload(&self) -> serde_json::Value {
            json!({
                "aggregateId": self.aggregate_id,
                "count": self.count,
                "version": self.version,
                "occurredAt": self.occurred_at,
            })
        }

        fn as_any(&self) -> &dyn Any {
            self
        }
    }

    fn registry() -> Arc<EventTypeRegistry> {
        let registration = EventTypeRegistration::builder("test.counted")
            .parameter("aggregate_id", FieldKind::Uuid)
            .parameter("count", FieldKind::Int)
            .constructor(|mut args| {
                Ok(Box::new(Counted {
                    aggregate_id: args.next_uuid()?,
                    count: args.next_int()?,
                    version: 0,
                    occurred_at: DateTime::UNIX_EPOCH,
                }))
            });
        Arc::new(
            EventTypeRegistry::builder()
                .register(registration)
                .build()
                .unwrap(),
        )
    }

    fn store() -> InMemoryEventStore {
        InMemoryEventStore::new(registry(), Arc::new(RecordingPublisher::new()))
    }

    #[tokio::test]
    async fn test_append_rejects_version_gaps() {
        let store = store();
        let aggregate_id = Uuid::new_v4();

        let result = store.save(&[Counted::boxed(aggregate_id, 1, 5)]).await;

        assert!(matches!(result.unwrap_err(), EventStoreError::Storage(_)));
        assert!(store.rows(aggregate_id).is_empty());
    }

    #[tokio::test]
    async fn test_append_rejects_duplicate_versions() {
        let store = store();
        let aggregate_id = Uuid::new_v4();
        store
            .save(&[Counted::boxed(aggregate_id, 1, 1)])
            .await
            .unwrap();

        let result = store.save(&[Counted::boxed(aggregate_id, 2, 1)]).await;

        assert!(matches!(result.unwrap_err(), EventStoreError::Storage(_)));
        assert_eq!(store.rows(aggregate_id).len(), 1);
    }

    #[tokio::test]
    async fn test_sequence_indexes_increase_across_aggregates() {
        let store = store();
        let first = Uuid::new_v4();
        let second = Uuid::new_v4();

        store.save(&[Counted::boxed(first, 1, 1)]).await.unwrap();
        store.save(&[Counted::boxed(second, 1, 1)]).await.unwrap();
        store.save(&[Counted::boxed(first, 2, 2)]).await.unwrap();

        assert_eq!(
            store
                .rows(first)
                .iter()
                .map(|row| row.sequence_index)
                .collect::<Vec<_>>(),
            [1, 3]
        );
        assert_eq!(store.rows(second)[0].sequence_index, 2);
    }

    #[tokio::test]
    async fn test_round_trips_through_the_reconstructor() {
        let store = store();
        let aggregate_id = Uuid::new_v4();
        store
            .save(&[
                Counted::boxed(aggregate_id, 10, 1),
                Counted::boxed(aggregate_id, 20, 2),
            ])
            .await
            .unwrap();

        let events = store.get(aggregate_id, 0).await.unwrap();

        assert_eq!(events.len(), 2);
        let last = events[1].as_any().downcast_ref::<Counted>().unwrap();
        assert_eq!(last.count, 20);
        assert_eq!(last.version, 2);
    }
}
