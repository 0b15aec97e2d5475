//! Integration tests for `PgEventStore`.
//!
//! These run against a live PostgreSQL server and are ignored by default;
//! set `DATABASE_URL` and run with `cargo test -- --ignored` to exercise
//! them.

use std::any::Any;
use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};
use serde_json::json;
use uuid::Uuid;

use chronicle_core::event::{BoxedEvent, DomainEvent};
use chronicle_core::field::FieldKind;
use chronicle_core::registry::{EventTypeRegistration, EventTypeRegistry};
use chronicle_core::store::EventStore;
use chronicle_event_store::pg_event_store::PgEventStore;
use chronicle_event_store::schema::CREATE_EVENT_ROWS_TABLE;
use chronicle_test_support::RecordingPublisher;

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

async fn connect_store() -> PgEventStore {
    let database_url =
        std::env::var("DATABASE_URL").expect("DATABASE_URL must be set for pg tests");
    PgEventStore::connect(&database_url, registry(), Arc::new(RecordingPublisher::new()))
        .await
        .unwrap()
}

async fn ensure_schema(database_url: &str) {
    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(1)
        .connect(database_url)
        .await
        .unwrap();
    sqlx::raw_sql(CREATE_EVENT_ROWS_TABLE)
        .execute(&pool)
        .await
        .unwrap();
}

#[tokio::test]
#[ignore = "requires DATABASE_URL pointing at a PostgreSQL server"]
async fn test_save_and_get_round_trip() {
    let database_url = std::env::var("DATABASE_URL").unwrap();
    ensure_schema(&database_url).await;
    let store = connect_store().await;
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

#[tokio::test]
#[ignore = "requires DATABASE_URL pointing at a PostgreSQL server"]
async fn test_duplicate_version_maps_to_version_conflict() {
    let database_url = std::env::var("DATABASE_URL").unwrap();
    ensure_schema(&database_url).await;
    let store = connect_store().await;
    let aggregate_id = Uuid::new_v4();

    store
        .save(&[Counted::boxed(aggregate_id, 1, 1)])
        .await
        .unwrap();
    let result = store.save(&[Counted::boxed(aggregate_id, 2, 1)]).await;

    let error = result.unwrap_err();
    assert!(error.to_string().contains("version conflict"));
}

#[tokio::test]
#[ignore = "requires DATABASE_URL pointing at a PostgreSQL server"]
async fn test_get_unknown_aggregate_returns_empty() {
    let database_url = std::env::var("DATABASE_URL").unwrap();
    ensure_schema(&database_url).await;
    let store = connect_store().await;

    let events = store.get(Uuid::new_v4(), 0).await.unwrap();

    assert!(events.is_empty());
}
