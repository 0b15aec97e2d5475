//! Shared fixtures for the crate's unit tests.

use std::any::Any;

use chrono::{DateTime, Utc};
use serde_json::json;
use uuid::Uuid;

use crate::event::DomainEvent;
use crate::field::{FieldKind, FieldMap};
use crate::registry::EventTypeRegistration;
use crate::store::AdditionalMappings;

/// Minimal event type exercising the reconstruction path.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct StubRecorded {
    pub aggregate_id: Uuid,
    pub label: String,
    pub amount: i64,
    pub version: i64,
    pub occurred_at: DateTime<Utc>,
}

impl DomainEvent for StubRecorded {
    fn event_type(&self) -> &'static str {
        "test.stub_recorded"
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
            "label": self.label,
            "amount": self.amount,
            "version": self.version,
            "occurredAt": self.occurred_at,
        })
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Registration for [`StubRecorded`]; parameter names are snake_case, so
/// the compiled wire names come out camelCase.
pub(crate) fn stub_registration() -> EventTypeRegistration {
    EventTypeRegistration::builder("test.stub_recorded")
        .parameter("aggregate_id", FieldKind::Uuid)
        .parameter("label", FieldKind::Text)
        .parameter("amount", FieldKind::Int)
        .constructor(|mut args| {
            Ok(Box::new(StubRecorded {
                aggregate_id: args.next_uuid()?,
                label: args.next_text()?,
                amount: args.next_int()?,
                version: 0,
                occurred_at: DateTime::UNIX_EPOCH,
            }))
        })
}

/// Hook that assigns nothing.
pub(crate) struct NullMappings;

impl AdditionalMappings for NullMappings {
    fn apply(&self, _event: &mut dyn DomainEvent, _fields: &FieldMap) {}
}

/// Hook that assigns `version`/`occurredAt` from the field map, mirroring
/// what the concrete stores do.
pub(crate) struct MetadataMappings;

impl AdditionalMappings for MetadataMappings {
    fn apply(&self, event: &mut dyn DomainEvent, fields: &FieldMap) {
        if let Some(version) = fields.get("version").and_then(serde_json::Value::as_i64) {
            event.assign_version(version);
        }
        if let Some(instant) = fields
            .get("occurredAt")
            .and_then(serde_json::Value::as_str)
            .and_then(|text| DateTime::parse_from_rfc3339(text).ok())
        {
            event.assign_occurred_at(instant.with_timezone(&Utc));
        }
    }
}
