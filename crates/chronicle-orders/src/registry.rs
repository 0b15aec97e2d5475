//! Startup registration of the Orders event types.
//!
//! Every event type the context persists registers here, keyed by its
//! stored discriminator. Production wiring calls [`event_registry`] once at
//! process startup; tests build a fresh registry per test.

use chrono::DateTime;

use chronicle_core::error::RegistryError;
use chronicle_core::field::FieldKind;
use chronicle_core::registry::{EventTypeRegistration, EventTypeRegistry};

use crate::domain::events::{
    ITEM_ADDED_EVENT_TYPE, ItemAdded, ORDER_CREATED_EVENT_TYPE, OrderCreated,
    PROMOTION_APPLIED_EVENT_TYPE, PromotionApplied,
};

/// Registration for [`OrderCreated`].
#[must_use]
pub fn order_created_registration() -> EventTypeRegistration {
    EventTypeRegistration::builder(ORDER_CREATED_EVENT_TYPE)
        .parameter("order_id", FieldKind::Uuid)
        .nullable_parameter("customer_ref", FieldKind::Text)
        .constructor(|mut args| {
            Ok(Box::new(OrderCreated {
                order_id: args.next_uuid()?,
                customer_ref: args.next_opt_text()?,
                version: 0,
                occurred_at: DateTime::UNIX_EPOCH,
            }))
        })
}

/// Registration for [`ItemAdded`].
#[must_use]
pub fn item_added_registration() -> EventTypeRegistration {
    EventTypeRegistration::builder(ITEM_ADDED_EVENT_TYPE)
        .parameter("order_id", FieldKind::Uuid)
        .parameter("sku", FieldKind::Text)
        .parameter("price", FieldKind::Float)
        .constructor(|mut args| {
            Ok(Box::new(ItemAdded {
                order_id: args.next_uuid()?,
                sku: args.next_text()?,
                price: args.next_float()?,
                version: 0,
                occurred_at: DateTime::UNIX_EPOCH,
            }))
        })
}

/// Registration for [`PromotionApplied`].
#[must_use]
pub fn promotion_applied_registration() -> EventTypeRegistration {
    EventTypeRegistration::builder(PROMOTION_APPLIED_EVENT_TYPE)
        .parameter("order_id", FieldKind::Uuid)
        .parameter("window", FieldKind::DateRange)
        .parameter("terms", FieldKind::Raw)
        .constructor(|mut args| {
            Ok(Box::new(PromotionApplied {
                order_id: args.next_uuid()?,
                window: args.next_range()?,
                terms: args.next_raw()?,
                version: 0,
                occurred_at: DateTime::UNIX_EPOCH,
            }))
        })
}

/// Builds the event-type registry for the Orders context.
///
/// # Errors
///
/// Returns [`RegistryError`] if the registrations are inconsistent; a
/// failure here is a defect in this module and surfaces at startup, before
/// any row is reconstructed.
pub fn event_registry() -> Result<EventTypeRegistry, RegistryError> {
    EventTypeRegistry::builder()
        .register(order_created_registration())
        .register(item_added_registration())
        .register(promotion_applied_registration())
        .build()
}
