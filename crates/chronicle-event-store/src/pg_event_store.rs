//! PostgreSQL implementation of the event store.

use std::sync::Arc;

use async_trait::async_trait;
use sqlx::Row;
use sqlx::postgres::{PgPool, PgPoolOptions, PgRow};
use uuid::Uuid;

use chronicle_core::error::EventStoreError;
use chronicle_core::event::{BoxedEvent, DomainEvent};
use chronicle_core::field::FieldMap;
use chronicle_core::reconstruct::EventReconstructor;
use chronicle_core::registry::EventTypeRegistry;
use chronicle_core::row::StoredEventRow;
use chronicle_core::store::{AdditionalMappings, EventPublisher, EventStore};

use crate::mappings::assign_store_metadata;

/// PostgreSQL-backed event store.
///
/// Rows live in the `event_rows` table (see [`crate::schema`]).
/// `sequence_index` is assigned by the database, and the unique constraint
/// on `(aggregate_id, version)` enforces per-aggregate version uniqueness;
/// a violation surfaces as a version-conflict storage error.
#[derive(Clone)]
pub struct PgEventStore {
    pool: PgPool,
    reconstructor: Arc<EventReconstructor>,
    publisher: Arc<dyn EventPublisher>,
}

impl std::fmt::Debug for PgEventStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PgEventStore").finish_non_exhaustive()
    }
}

impl PgEventStore {
    /// Creates a store over an existing connection pool.
    #[must_use]
    pub fn new(
        pool: PgPool,
        registry: Arc<EventTypeRegistry>,
        publisher: Arc<dyn EventPublisher>,
    ) -> Self {
        Self {
            pool,
            reconstructor: Arc::new(EventReconstructor::new(registry)),
            publisher,
        }
    }

    /// Connects a pool from a database URL (typically `DATABASE_URL`) and
    /// builds a store over it.
    ///
    /// # Errors
    ///
    /// Returns [`EventStoreError::Storage`] if the connection fails.
    pub async fn connect(
        database_url: &str,
        registry: Arc<EventTypeRegistry>,
        publisher: Arc<dyn EventPublisher>,
    ) -> Result<Self, EventStoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect(database_url)
            .await
            .map_err(|error| EventStoreError::Storage(error.to_string()))?;
        Ok(Self::new(pool, registry, publisher))
    }

    /// The reconstructor driving this store's read path, exposed so tests
    /// can observe the activator cache.
    #[must_use]
    pub fn reconstructor(&self) -> &EventReconstructor {
        &self.reconstructor
    }
}

fn map_insert_error(error: &sqlx::Error, event: &dyn DomainEvent) -> EventStoreError {
    if let sqlx::Error::Database(db_error) = error {
        if db_error.is_unique_violation() {
            return EventStoreError::Storage(format!(
                "version conflict on aggregate {} at version {}",
                event.aggregate_id(),
                event.version()
            ));
        }
    }
    EventStoreError::Storage(error.to_string())
}

fn row_from_pg(row: &PgRow) -> Result<StoredEventRow, sqlx::Error> {
    Ok(StoredEventRow {
        sequence_index: row.try_get("sequence_index")?,
        aggregate_id: row.try_get("aggregate_id")?,
        version: row.try_get("version")?,
        payload: row.try_get("payload")?,
        occurred_at: row.try_get("occurred_at")?,
        event_type_name: row.try_get("event_type_name")?,
    })
}

#[async_trait]
impl EventStore for PgEventStore {
    #[tracing::instrument(skip(self, events), fields(event_count = events.len()))]
    async fn save(&self, events: &[BoxedEvent]) -> Result<(), EventStoreError> {
        for event in events {
            let payload = event.to_payload();
            sqlx::query(
                "INSERT INTO event_rows (aggregate_id, version, event_type_name, payload, occurred_at) \
                 VALUES ($1, $2, $3, $4, $5)",
            )
            .bind(event.aggregate_id())
            .bind(event.version())
            .bind(event.event_type())
            .bind(&payload)
            .bind(event.occurred_at())
            .execute(&self.pool)
            .await
            .map_err(|error| map_insert_error(&error, event.as_ref()))?;

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
        let rows = sqlx::query(
            "SELECT sequence_index, aggregate_id, version, event_type_name, payload, occurred_at \
             FROM event_rows WHERE aggregate_id = $1 AND version > $2 ORDER BY version",
        )
        .bind(aggregate_id)
        .bind(from_version)
        .fetch_all(&self.pool)
        .await
        .map_err(|error| EventStoreError::Storage(error.to_string()))?;

        let mut events = Vec::with_capacity(rows.len());
        for row in &rows {
            let stored =
                row_from_pg(row).map_err(|error| EventStoreError::Storage(error.to_string()))?;
            events.push(self.reconstructor.reconstruct(&stored, self)?);
        }
        tracing::debug!(count = events.len(), "replayed events");
        Ok(events)
    }
}

impl AdditionalMappings for PgEventStore {
    fn apply(&self, event: &mut dyn DomainEvent, fields: &FieldMap) {
        assign_store_metadata(event, fields);
    }
}
