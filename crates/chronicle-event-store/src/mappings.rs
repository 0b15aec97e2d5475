//! Store-managed metadata assignment shared by the concrete stores.

use chrono::{DateTime, Utc};
use serde_json::Value;

use chronicle_core::event::DomainEvent;
use chronicle_core::field::FieldMap;

/// Assigns `version` and `occurredAt` from the payload field map onto a
/// freshly constructed event.
///
/// The write path serializes the whole event, so both fields are present in
/// every payload this crate produced. Absent or malformed metadata leaves
/// the constructor placeholders in place; the hook is infallible by
/// contract.
pub(crate) fn assign_store_metadata(event: &mut dyn DomainEvent, fields: &FieldMap) {
    if let Some(version) = fields.get("version").and_then(Value::as_i64) {
        event.assign_version(version);
    }
    if let Some(occurred_at) = fields
        .get("occurredAt")
        .and_then(Value::as_str)
        .and_then(|text| DateTime::parse_from_rfc3339(text).ok())
    {
        event.assign_occurred_at(occurred_at.with_timezone(&Utc));
    }
}

#[cfg(test)]
mod tests {
    use std::any::Any;

    use chrono::{DateTime, TimeZone, Utc};
    use serde_json::json;
    use uuid::Uuid;

    use chronicle_core::event::DomainEvent;
    use chronicle_core::field::FieldMap;

    use super::assign_store_metadata;

    #[derive(Debug)]
    struct Bare {
        id: Uuid,
        version: i64,
        occurred_at: DateTime<Utc>,
    }

    impl DomainEvent for Bare {
        fn event_type(&self) -> &'static str {
            "test.bare"
        }

        fn aggregate_id(&self) -> Uuid {
            self.id
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
            json!({})
        }

        fn as_any(&self) -> &dyn Any {
            self
        }
    }

    #[test]
    fn test_assigns_version_and_timestamp_from_fields() {
        let mut event = Bare {
            id: Uuid::new_v4(),
            version: 0,
            occurred_at: DateTime::UNIX_EPOCH,
        };
        let fields = FieldMap::from_payload(&json!({
            "version": 4,
            "occurredAt": "2026-01-15T10:00:00Z",
        }))
        .unwrap();

        assign_store_metadata(&mut event, &fields);

        assert_eq!(event.version(), 4);
        assert_eq!(
            event.occurred_at(),
            Utc.with_ymd_and_hms(2026, 1, 15, 10, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_absent_metadata_leaves_placeholders() {
        let mut event = Bare {
            id: Uuid::new_v4(),
            version: 0,
            occurred_at: DateTime::UNIX_EPOCH,
        };
        let fields = FieldMap::from_payload(&json!({"other": true})).unwrap();

        assign_store_metadata(&mut event, &fields);

        assert_eq!(event.version(), 0);
        assert_eq!(event.occurred_at(), DateTime::UNIX_EPOCH);
    }
}
