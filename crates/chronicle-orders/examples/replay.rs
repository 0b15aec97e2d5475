//! Saves a short order history to the in-memory store and replays it.
//!
//! Run with `cargo run -p chronicle-orders --example replay`.

use std::error::Error;
use std::sync::Arc;

use tracing_subscriber::EnvFilter;
use uuid::Uuid;

use chronicle_core::aggregate::AggregateRoot;
use chronicle_core::clock::SystemClock;
use chronicle_core::store::EventStore;
use chronicle_event_store::memory::InMemoryEventStore;
use chronicle_orders::domain::aggregates::Order;
use chronicle_orders::registry::event_registry;
use chronicle_test_support::RecordingPublisher;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // Initialize tracing subscriber.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let registry = Arc::new(event_registry()?);
    let publisher = Arc::new(RecordingPublisher::new());
    let store = InMemoryEventStore::new(registry, publisher.clone());

    let clock = SystemClock;
    let order_id = Uuid::new_v4();
    let mut order = Order::new(order_id);
    order.create(Some("ACME-1042".to_owned()), &clock);
    order.add_item("SKU-001", 19.99, &clock);
    order.add_item("SKU-002", 5.00, &clock);

    store.save(order.uncommitted_events()).await?;
    order.clear_uncommitted_events();

    let mut replayed = Order::new(order_id);
    replayed.replay(store.get(order_id, 0).await?);

    tracing::info!(
        %order_id,
        total_price = replayed.total_price(),
        published = publisher.published().len(),
        "order replayed from the event log"
    );
    Ok(())
}
