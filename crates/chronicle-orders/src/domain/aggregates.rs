//! Aggregate roots for the Orders context.

use uuid::Uuid;

use chronicle_core::aggregate::AggregateRoot;
use chronicle_core::clock::Clock;
use chronicle_core::event::{BoxedEvent, DomainEvent};
use chronicle_core::range::DateRange;

use super::events::{ItemAdded, OrderCreated, PromotionApplied};

/// The aggregate root for an order.
///
/// State derives entirely from replaying the order's event history.
#[derive(Debug)]
pub struct Order {
    /// Aggregate identifier.
    pub id: Uuid,
    /// Current version (event count).
    pub(crate) version: i64,
    /// Whether the order has been opened.
    created: bool,
    /// Running total over the added line items.
    total_price: f64,
    /// Validity windows of applied promotions.
    promotion_windows: Vec<DateRange>,
    /// Uncommitted events pending persistence.
    uncommitted_events: Vec<BoxedEvent>,
}

impl Order {
    /// Creates an empty aggregate shell, ready for replay or for opening a
    /// new order.
    #[must_use]
    pub fn new(id: Uuid) -> Self {
        Self {
            id,
            version: 0,
            created: false,
            total_price: 0.0,
            promotion_windows: Vec::new(),
            uncommitted_events: Vec::new(),
        }
    }

    /// Whether an `OrderCreated` event has been applied.
    #[must_use]
    pub fn is_created(&self) -> bool {
        self.created
    }

    /// Running total over the added line items.
    #[must_use]
    pub fn total_price(&self) -> f64 {
        self.total_price
    }

    /// Validity windows of the applied promotions.
    #[must_use]
    pub fn promotion_windows(&self) -> &[DateRange] {
        &self.promotion_windows
    }

    /// Returns the version the next recorded event will carry.
    #[allow(clippy::cast_possible_wrap)]
    fn next_version(&self) -> i64 {
        self.version + self.uncommitted_events.len() as i64 + 1
    }

    /// Opens the order, producing an `OrderCreated` event.
    pub fn create(&mut self, customer_ref: Option<String>, clock: &dyn Clock) {
        let event = OrderCreated {
            order_id: self.id,
            customer_ref,
            version: self.next_version(),
            occurred_at: clock.now(),
        };
        self.uncommitted_events.push(Box::new(event));
    }

    /// Adds a line item at the given price, producing an `ItemAdded` event.
    pub fn add_item(&mut self, sku: impl Into<String>, price: f64, clock: &dyn Clock) {
        let event = ItemAdded {
            order_id: self.id,
            sku: sku.into(),
            price,
            version: self.next_version(),
            occurred_at: clock.now(),
        };
        self.uncommitted_events.push(Box::new(event));
    }

    /// Applies a promotion over the given validity window, producing a
    /// `PromotionApplied` event. `terms` stays serialized; the pricing
    /// engine re-parses it downstream.
    pub fn apply_promotion(
        &mut self,
        window: DateRange,
        terms: impl Into<String>,
        clock: &dyn Clock,
    ) {
        let event = PromotionApplied {
            order_id: self.id,
            window,
            terms: terms.into(),
            version: self.next_version(),
            occurred_at: clock.now(),
        };
        self.uncommitted_events.push(Box::new(event));
    }
}

impl AggregateRoot for Order {
    type Event = BoxedEvent;

    fn aggregate_id(&self) -> Uuid {
        self.id
    }

    fn version(&self) -> i64 {
        self.version
    }

    fn apply(&mut self, event: &BoxedEvent) {
        if event.as_any().downcast_ref::<OrderCreated>().is_some() {
            self.created = true;
        } else if let Some(added) = event.as_any().downcast_ref::<ItemAdded>() {
            self.total_price += added.price;
        } else if let Some(promotion) = event.as_any().downcast_ref::<PromotionApplied>() {
            self.promotion_windows.push(promotion.window);
        }
        self.version = event.version();
    }

    fn uncommitted_events(&self) -> &[BoxedEvent] {
        &self.uncommitted_events
    }

    fn clear_uncommitted_events(&mut self) {
        self.uncommitted_events.clear();
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use uuid::Uuid;

    use chronicle_core::aggregate::AggregateRoot;
    use chronicle_core::clock::Clock;
    use chronicle_core::event::DomainEvent;
    use chronicle_core::range::DateRange;

    use super::Order;
    use crate::domain::events::{
        ITEM_ADDED_EVENT_TYPE, ItemAdded, ORDER_CREATED_EVENT_TYPE, OrderCreated,
    };

    #[derive(Debug)]
    struct FixedClock(chrono::DateTime<Utc>);

    impl Clock for FixedClock {
        fn now(&self) -> chrono::DateTime<Utc> {
            self.0
        }
    }

    #[test]
    fn test_create_produces_order_created_event() {
        // Arrange
        let order_id = Uuid::new_v4();
        let fixed_now = Utc.with_ymd_and_hms(2026, 1, 15, 10, 0, 0).unwrap();
        let clock = FixedClock(fixed_now);
        let mut order = Order::new(order_id);

        // Act
        order.create(Some("ACME-1042".to_owned()), &clock);

        // Assert
        let events = order.uncommitted_events();
        assert_eq!(events.len(), 1);

        let event = &events[0];
        assert_eq!(event.event_type(), ORDER_CREATED_EVENT_TYPE);
        assert_eq!(event.aggregate_id(), order_id);
        assert_eq!(event.version(), 1);
        assert_eq!(event.occurred_at(), fixed_now);

        let created = event.as_any().downcast_ref::<OrderCreated>().unwrap();
        assert_eq!(created.customer_ref.as_deref(), Some("ACME-1042"));
    }

    #[test]
    fn test_recorded_events_carry_consecutive_versions() {
        // Arrange
        let fixed_now = Utc.with_ymd_and_hms(2026, 1, 15, 10, 0, 0).unwrap();
        let clock = FixedClock(fixed_now);
        let mut order = Order::new(Uuid::new_v4());

        // Act
        order.create(None, &clock);
        order.add_item("SKU-001", 19.99, &clock);
        order.add_item("SKU-002", 5.00, &clock);

        // Assert
        let versions: Vec<i64> = order
            .uncommitted_events()
            .iter()
            .map(DomainEvent::version)
            .collect();
        assert_eq!(versions, [1, 2, 3]);

        let second = order.uncommitted_events()[1]
            .as_any()
            .downcast_ref::<ItemAdded>()
            .unwrap();
        assert_eq!(second.event_type(), ITEM_ADDED_EVENT_TYPE);
        assert_eq!(second.sku, "SKU-001");
    }

    #[test]
    fn test_apply_accumulates_price_and_version() {
        // Arrange
        let fixed_now = Utc.with_ymd_and_hms(2026, 1, 15, 10, 0, 0).unwrap();
        let clock = FixedClock(fixed_now);
        let mut order = Order::new(Uuid::new_v4());
        order.create(None, &clock);
        order.add_item("SKU-001", 1.23, &clock);
        order.add_item("SKU-002", 1.23, &clock);

        // Act
        let recorded = std::mem::take(&mut order.uncommitted_events);
        order.replay(recorded);

        // Assert
        assert!(order.is_created());
        assert!((order.total_price() - 2.46).abs() < f64::EPSILON);
        assert_eq!(order.version(), 3);
    }

    #[test]
    fn test_apply_records_promotion_windows() {
        // Arrange
        let fixed_now = Utc.with_ymd_and_hms(2026, 1, 15, 10, 0, 0).unwrap();
        let clock = FixedClock(fixed_now);
        let window = DateRange::new(
            Utc.with_ymd_and_hms(2026, 2, 1, 0, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2026, 3, 1, 0, 0, 0).unwrap(),
        )
        .unwrap();
        let mut order = Order::new(Uuid::new_v4());
        order.create(None, &clock);
        order.apply_promotion(window, "{\"pct\":10}", &clock);

        // Act
        let recorded = std::mem::take(&mut order.uncommitted_events);
        order.replay(recorded);

        // Assert
        assert_eq!(order.promotion_windows().to_vec(), vec![window]);
    }
}
