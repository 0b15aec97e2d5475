//! Domain events for the Orders context.

use std::any::Any;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use chronicle_core::event::DomainEvent;
use chronicle_core::range::DateRange;

/// Discriminator for [`OrderCreated`].
pub const ORDER_CREATED_EVENT_TYPE: &str = "orders.order_created";
/// Discriminator for [`ItemAdded`].
pub const ITEM_ADDED_EVENT_TYPE: &str = "orders.item_added";
/// Discriminator for [`PromotionApplied`].
pub const PROMOTION_APPLIED_EVENT_TYPE: &str = "orders.promotion_applied";

/// Emitted when an order is opened.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderCreated {
    /// The order identifier (the aggregate id).
    pub order_id: Uuid,
    /// Optional external customer reference.
    pub customer_ref: Option<String>,
    /// Per-aggregate version, assigned when the aggregate records the event.
    pub version: i64,
    /// Creation instant.
    pub occurred_at: DateTime<Utc>,
}

impl DomainEvent for OrderCreated {
    fn event_type(&self) -> &'static str {
        ORDER_CREATED_EVENT_TYPE
    }

    fn aggregate_id(&self) -> Uuid {
        self.order_id
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
        serde_json::to_value(self).expect("OrderCreated serialization is infallible")
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Emitted when a line item is added to an order.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemAdded {
    /// The order identifier.
    pub order_id: Uuid,
    /// Stock-keeping unit of the added item.
    pub sku: String,
    /// Price contributed by the item.
    pub price: f64,
    /// Per-aggregate version, assigned when the aggregate records the event.
    pub version: i64,
    /// Creation instant.
    pub occurred_at: DateTime<Utc>,
}

impl DomainEvent for ItemAdded {
    fn event_type(&self) -> &'static str {
        ITEM_ADDED_EVENT_TYPE
    }

    fn aggregate_id(&self) -> Uuid {
        self.order_id
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
        serde_json::to_value(self).expect("ItemAdded serialization is infallible")
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Emitted when a promotion is applied to an order.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromotionApplied {
    /// The order identifier.
    pub order_id: Uuid,
    /// Validity window of the promotion.
    pub window: DateRange,
    /// Raw promotion terms, kept as serialized text; the pricing engine
    /// re-parses these downstream.
    pub terms: String,
    /// Per-aggregate version, assigned when the aggregate records the event.
    pub version: i64,
    /// Creation instant.
    pub occurred_at: DateTime<Utc>,
}

impl DomainEvent for PromotionApplied {
    fn event_type(&self) -> &'static str {
        PROMOTION_APPLIED_EVENT_TYPE
    }

    fn aggregate_id(&self) -> Uuid {
        self.order_id
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
        serde_json::to_value(self).expect("PromotionApplied serialization is infallible")
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
