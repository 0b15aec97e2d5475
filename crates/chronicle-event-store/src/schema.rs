//! Event store database schema.

/// SQL to create the event rows table.
///
/// `sequence_index` is the store-assigned clustering key; the unique
/// constraint on `(aggregate_id, version)` enforces per-aggregate version
/// uniqueness at the database level.
pub const CREATE_EVENT_ROWS_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS event_rows (
    sequence_index  BIGSERIAL PRIMARY KEY,
    aggregate_id    UUID NOT NULL,
    version         BIGINT NOT NULL,
    event_type_name VARCHAR(255) NOT NULL,
    payload         JSONB NOT NULL,
    occurred_at     TIMESTAMPTZ NOT NULL,
    UNIQUE (aggregate_id, version)
);

CREATE INDEX IF NOT EXISTS idx_event_rows_aggregate_id
    ON event_rows (aggregate_id, version);
";
