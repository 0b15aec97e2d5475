//! Stored event rows — the durable unit of the append-only log.

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// A single persisted event, as laid out in the backing store.
///
/// Rows are immutable once written; the log is append-only and rows are
/// never updated. `version` is unique and gap-free per aggregate, starting
/// at 1. `sequence_index` is assigned by the backing store, never by callers
/// of this crate. `event_type_name` must remain resolvable for as long as
/// historical replay is required.
#[derive(Debug, Clone)]
pub struct StoredEventRow {
    /// Store-assigned, monotonically increasing clustering key.
    pub sequence_index: i64,
    /// Aggregate this event belongs to.
    pub aggregate_id: Uuid,
    /// Per-aggregate version, strictly increasing from 1; equals the
    /// aggregate's event count at the time this event was appended.
    pub version: i64,
    /// Serialized event payload: a JSON object with camelCase field names.
    pub payload: serde_json::Value,
    /// Creation instant, UTC.
    pub occurred_at: DateTime<Utc>,
    /// Discriminator resolving to the concrete event type.
    pub event_type_name: String,
}
