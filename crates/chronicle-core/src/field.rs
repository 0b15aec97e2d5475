//! Payload field model and value conversion.
//!
//! Event payloads use a finite set of field types. Conversion from the raw
//! JSON form into constructor argument values is an explicit dispatch over
//! [`FieldKind`] rather than an open-ended converter lookup, so every
//! supported conversion is visible here.

use std::fmt;

use chrono::{DateTime, Utc};
use serde_json::Value;
use uuid::Uuid;

use crate::error::ConversionError;
use crate::range::DateRange;

/// The finite set of field types event payloads may use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// A boolean flag.
    Bool,
    /// A 64-bit signed integer.
    Int,
    /// A 64-bit float.
    Float,
    /// UTF-8 text.
    Text,
    /// A UUID, carried on the wire as text.
    Uuid,
    /// A UTC instant, carried on the wire as RFC 3339 text.
    Timestamp,
    /// The compound closed-interval type, deserialized structurally.
    DateRange,
    /// Opaque passthrough: the raw serialized text reaches the constructor
    /// unconverted and the event re-parses it itself.
    Raw,
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Bool => "bool",
            Self::Int => "int",
            Self::Float => "float",
            Self::Text => "text",
            Self::Uuid => "uuid",
            Self::Timestamp => "timestamp",
            Self::DateRange => "date range",
            Self::Raw => "raw",
        };
        f.write_str(name)
    }
}

/// A converted field value, ready for consumption by an event constructor.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    /// Absent or null field for a nullable parameter.
    Null,
    /// A boolean.
    Bool(bool),
    /// An integer.
    Int(i64),
    /// A float.
    Float(f64),
    /// Text.
    Text(String),
    /// A UUID.
    Uuid(Uuid),
    /// A UTC instant.
    Timestamp(DateTime<Utc>),
    /// A closed date-time interval.
    DateRange(DateRange),
    /// Raw serialized text passed through unconverted.
    Raw(String),
}

impl FieldValue {
    /// Short name of the contained variant, for diagnostics.
    #[must_use]
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Float(_) => "float",
            Self::Text(_) => "text",
            Self::Uuid(_) => "uuid",
            Self::Timestamp(_) => "timestamp",
            Self::DateRange(_) => "date range",
            Self::Raw(_) => "raw",
        }
    }
}

/// Parsed payload: wire field name to raw JSON value.
#[derive(Debug, Clone)]
pub struct FieldMap {
    fields: serde_json::Map<String, Value>,
}

impl FieldMap {
    /// Builds a field map from a payload, if the payload is a JSON object.
    #[must_use]
    pub fn from_payload(payload: &Value) -> Option<Self> {
        match payload {
            Value::Object(fields) => Some(Self {
                fields: fields.clone(),
            }),
            _ => None,
        }
    }

    /// Looks up a raw field value by its wire name.
    #[must_use]
    pub fn get(&self, wire_name: &str) -> Option<&Value> {
        self.fields.get(wire_name)
    }
}

/// Name of a JSON value's type, for diagnostics.
pub(crate) fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Translates a snake_case parameter name into its camelCase wire name.
///
/// This is the single naming-translation rule between constructor parameter
/// names and payload field names. It runs in exactly one direction
/// (parameter to wire) and is applied once, when a factory is compiled.
#[must_use]
pub fn wire_name(parameter: &str) -> String {
    let mut out = String::with_capacity(parameter.len());
    let mut upper_next = false;
    for ch in parameter.chars() {
        if ch == '_' {
            upper_next = true;
        } else if upper_next {
            out.extend(ch.to_uppercase());
            upper_next = false;
        } else {
            out.push(ch);
        }
    }
    out
}

/// Converts one raw payload field into the value its constructor parameter
/// expects.
///
/// Policy, in order: null and absent fields resolve to [`FieldValue::Null`]
/// for nullable parameters and fail otherwise; [`FieldKind::Raw`] passes the
/// raw serialized text through unconverted; [`FieldKind::DateRange`] is
/// deserialized structurally, bound by bound; every other kind accepts its
/// native JSON form directly or parses its text form.
///
/// # Errors
///
/// Returns [`ConversionError`] naming the parameter and its expected kind
/// when the field is missing, null, of the wrong JSON type, or fails to
/// parse.
pub fn convert_field(
    raw: Option<&Value>,
    parameter: &str,
    field: &str,
    kind: FieldKind,
    nullable: bool,
) -> Result<FieldValue, ConversionError> {
    let Some(value) = raw else {
        if nullable {
            return Ok(FieldValue::Null);
        }
        return Err(ConversionError::MissingField {
            parameter: parameter.to_owned(),
            field: field.to_owned(),
        });
    };

    if value.is_null() {
        if nullable {
            return Ok(FieldValue::Null);
        }
        return Err(ConversionError::UnexpectedNull {
            parameter: parameter.to_owned(),
            field: field.to_owned(),
        });
    }

    match kind {
        FieldKind::Raw => Ok(FieldValue::Raw(match value {
            Value::String(text) => text.clone(),
            other => other.to_string(),
        })),
        FieldKind::DateRange => convert_range(value, parameter),
        FieldKind::Bool => match value {
            Value::Bool(flag) => Ok(FieldValue::Bool(*flag)),
            Value::String(text) => text
                .parse::<bool>()
                .map(FieldValue::Bool)
                .map_err(|_| invalid(parameter, kind, text)),
            other => Err(mismatch(parameter, kind, other)),
        },
        FieldKind::Int => match value {
            Value::Number(number) => number
                .as_i64()
                .map(FieldValue::Int)
                .ok_or_else(|| invalid(parameter, kind, &number.to_string())),
            Value::String(text) => text
                .parse::<i64>()
                .map(FieldValue::Int)
                .map_err(|_| invalid(parameter, kind, text)),
            other => Err(mismatch(parameter, kind, other)),
        },
        FieldKind::Float => match value {
            Value::Number(number) => number
                .as_f64()
                .map(FieldValue::Float)
                .ok_or_else(|| invalid(parameter, kind, &number.to_string())),
            Value::String(text) => text
                .parse::<f64>()
                .map(FieldValue::Float)
                .map_err(|_| invalid(parameter, kind, text)),
            other => Err(mismatch(parameter, kind, other)),
        },
        FieldKind::Text => match value {
            Value::String(text) => Ok(FieldValue::Text(text.clone())),
            other => Err(mismatch(parameter, kind, other)),
        },
        FieldKind::Uuid => match value {
            Value::String(text) => Uuid::parse_str(text)
                .map(FieldValue::Uuid)
                .map_err(|_| invalid(parameter, kind, text)),
            other => Err(mismatch(parameter, kind, other)),
        },
        FieldKind::Timestamp => match value {
            Value::String(text) => parse_instant(text)
                .map(FieldValue::Timestamp)
                .ok_or_else(|| invalid(parameter, kind, text)),
            other => Err(mismatch(parameter, kind, other)),
        },
    }
}

fn convert_range(value: &Value, parameter: &str) -> Result<FieldValue, ConversionError> {
    let Value::Object(bounds) = value else {
        return Err(mismatch(parameter, FieldKind::DateRange, value));
    };
    let start = range_bound(bounds.get("start"), parameter, "start")?;
    let end = range_bound(bounds.get("end"), parameter, "end")?;
    DateRange::new(start, end)
        .map(FieldValue::DateRange)
        .map_err(|error| ConversionError::InvalidRange {
            parameter: parameter.to_owned(),
            detail: error.to_string(),
        })
}

fn range_bound(
    value: Option<&Value>,
    parameter: &str,
    bound: &str,
) -> Result<DateTime<Utc>, ConversionError> {
    match value {
        Some(Value::String(text)) => {
            parse_instant(text).ok_or_else(|| ConversionError::InvalidRange {
                parameter: parameter.to_owned(),
                detail: format!("bound `{bound}` is not an RFC 3339 timestamp"),
            })
        }
        Some(other) => Err(ConversionError::InvalidRange {
            parameter: parameter.to_owned(),
            detail: format!(
                "bound `{bound}` must be a string, found {}",
                json_type_name(other)
            ),
        }),
        None => Err(ConversionError::InvalidRange {
            parameter: parameter.to_owned(),
            detail: format!("missing bound `{bound}`"),
        }),
    }
}

fn parse_instant(text: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(text)
        .ok()
        .map(|instant| instant.with_timezone(&Utc))
}

fn mismatch(parameter: &str, expected: FieldKind, actual: &Value) -> ConversionError {
    ConversionError::TypeMismatch {
        parameter: parameter.to_owned(),
        expected,
        actual: json_type_name(actual),
    }
}

fn invalid(parameter: &str, expected: FieldKind, value: &str) -> ConversionError {
    ConversionError::InvalidValue {
        parameter: parameter.to_owned(),
        expected,
        value: value.to_owned(),
    }
}
