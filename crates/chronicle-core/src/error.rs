//! Error types for the persistence core.
//!
//! No error here is ever swallowed or defaulted: every failure aborts
//! processing of the current row or event and carries enough context
//! (aggregate id, version, type name, parameter name as applicable) to
//! diagnose a malformed historical record.

use thiserror::Error;
use uuid::Uuid;

use crate::field::FieldKind;

/// A payload field could not be converted to the value its constructor
/// parameter expects. Fatal for the event being reconstructed; no partially
/// populated event is ever produced.
#[derive(Debug, Error)]
pub enum ConversionError {
    /// The field is absent from the payload and the parameter is not
    /// nullable.
    #[error("missing field `{field}` for non-nullable parameter `{parameter}`")]
    MissingField {
        /// The constructor parameter being converted.
        parameter: String,
        /// The wire field name that was looked up.
        field: String,
    },

    /// The field is null and the parameter is not nullable.
    #[error("field `{field}` is null but parameter `{parameter}` is not nullable")]
    UnexpectedNull {
        /// The constructor parameter being converted.
        parameter: String,
        /// The wire field name that was looked up.
        field: String,
    },

    /// The field's JSON type cannot represent the parameter's kind.
    #[error("parameter `{parameter}` expects {expected}, found {actual}")]
    TypeMismatch {
        /// The constructor parameter being converted.
        parameter: String,
        /// The kind the parameter expects.
        expected: FieldKind,
        /// The JSON type actually found in the payload.
        actual: &'static str,
    },

    /// The field's text form failed to parse as the parameter's kind.
    #[error("parameter `{parameter}` expects {expected}, could not parse `{value}`")]
    InvalidValue {
        /// The constructor parameter being converted.
        parameter: String,
        /// The kind the parameter expects.
        expected: FieldKind,
        /// The text that failed to parse.
        value: String,
    },

    /// A date-range field is structurally invalid.
    #[error("parameter `{parameter}` expects a date range: {detail}")]
    InvalidRange {
        /// The constructor parameter being converted.
        parameter: String,
        /// What was wrong with the range.
        detail: String,
    },
}

/// A registration's constructor consumed its arguments inconsistently with
/// the parameters it declared. This is a defect in the registration code
/// itself — never in stored data — and fails loudly at first use.
#[derive(Debug, Error)]
pub enum ActivationError {
    /// The constructor was handed the wrong number of arguments.
    #[error("constructor expected {expected} arguments, received {actual}")]
    ArityMismatch {
        /// Number of declared parameters.
        expected: usize,
        /// Number of arguments supplied.
        actual: usize,
    },

    /// The constructor consumed more arguments than were declared.
    #[error("constructor consumed argument {index} as {expected}, but only {available} were supplied")]
    MissingArgument {
        /// Zero-based index of the argument the constructor asked for.
        index: usize,
        /// What the constructor asked for.
        expected: &'static str,
        /// Number of arguments that were supplied.
        available: usize,
    },

    /// The constructor consumed an argument as the wrong kind.
    #[error("constructor argument {index} is {actual}, consumed as {expected}")]
    ArgumentMismatch {
        /// Zero-based index of the mismatched argument.
        index: usize,
        /// What the constructor asked for.
        expected: &'static str,
        /// The kind of value actually at that position.
        actual: &'static str,
    },
}

/// A registration set failed startup validation. Surfaced by
/// `EventTypeRegistryBuilder::build`, before any row is reconstructed.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// A registration carries an empty type discriminator.
    #[error("event type name must not be empty")]
    EmptyEventTypeName,

    /// Two registrations share one discriminator.
    #[error("duplicate event type registration `{0}`")]
    DuplicateEventType(String),

    /// A registration declares the same parameter name twice.
    #[error("event type `{event_type}` declares duplicate parameter `{parameter}`")]
    DuplicateParameter {
        /// The registration's discriminator.
        event_type: String,
        /// The repeated parameter name.
        parameter: String,
    },
}

/// A stored row could not be reconstructed into a typed event.
#[derive(Debug, Error)]
pub enum ReconstructError {
    /// The row's discriminator no longer resolves to a registered event
    /// type — the type was removed or renamed since the row was written.
    /// The caller decides whether to abort the replay or skip and log.
    #[error("unknown event type `{event_type}` for aggregate {aggregate_id} at version {version}")]
    UnknownEventType {
        /// The unresolvable discriminator.
        event_type: String,
        /// The aggregate the row belongs to.
        aggregate_id: Uuid,
        /// The row's per-aggregate version.
        version: i64,
    },

    /// The row's payload is not a JSON object.
    #[error("malformed payload for aggregate {aggregate_id} at version {version}: {detail}")]
    MalformedPayload {
        /// The aggregate the row belongs to.
        aggregate_id: Uuid,
        /// The row's per-aggregate version.
        version: i64,
        /// What was wrong with the payload.
        detail: String,
    },

    /// A payload field could not be converted to its parameter's type.
    #[error("cannot convert `{event_type}` for aggregate {aggregate_id} at version {version}")]
    Conversion {
        /// The row's discriminator.
        event_type: String,
        /// The aggregate the row belongs to.
        aggregate_id: Uuid,
        /// The row's per-aggregate version.
        version: i64,
        /// The underlying conversion failure.
        #[source]
        source: ConversionError,
    },

    /// The registration's constructor is defective.
    #[error("cannot construct `{event_type}` for aggregate {aggregate_id} at version {version}")]
    Activation {
        /// The row's discriminator.
        event_type: String,
        /// The aggregate the row belongs to.
        aggregate_id: Uuid,
        /// The row's per-aggregate version.
        version: i64,
        /// The underlying constructor defect.
        #[source]
        source: ActivationError,
    },
}

/// Failure reported by an event-publication collaborator.
#[derive(Debug, Error)]
#[error("event publication failed: {0}")]
pub struct PublicationError(pub String);

/// Top-level error for the store boundary.
#[derive(Debug, Error)]
pub enum EventStoreError {
    /// A stored row could not be reconstructed into a typed event.
    #[error(transparent)]
    Reconstruct(#[from] ReconstructError),

    /// Publishing a saved event failed. Rows persisted before the failure
    /// remain persisted; consumers must tolerate redelivery.
    #[error("publication failed for aggregate {aggregate_id} at version {version}")]
    Publication {
        /// The aggregate whose event failed to publish.
        aggregate_id: Uuid,
        /// The version of the event that failed to publish.
        version: i64,
        /// The publisher's failure.
        #[source]
        source: PublicationError,
    },

    /// The backing store failed.
    #[error("storage error: {0}")]
    Storage(String),
}
