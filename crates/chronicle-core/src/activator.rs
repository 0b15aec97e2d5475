//! Factory compilation and caching.
//!
//! Compiling a factory — deriving each parameter's wire field name and
//! capturing the registration's constructor — is the expensive, once-per-type
//! step. The cache guarantees it happens at most once per event type for the
//! process lifetime, no matter how many rows of that type are reconstructed
//! or how many threads reconstruct concurrently.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::{ActivationError, ConversionError};
use crate::event::BoxedEvent;
use crate::field::{self, FieldKind, FieldMap, FieldValue};
use crate::range::DateRange;
use crate::registry::{EventConstructor, EventTypeRegistration, ParameterSpec};

/// A constructor parameter with its precomputed wire field name.
#[derive(Debug, Clone)]
pub struct CompiledParameter {
    name: String,
    wire_name: String,
    kind: FieldKind,
    nullable: bool,
}

impl CompiledParameter {
    fn compile(spec: &ParameterSpec) -> Self {
        Self {
            name: spec.name().to_owned(),
            wire_name: field::wire_name(spec.name()),
            kind: spec.kind(),
            nullable: spec.is_nullable(),
        }
    }

    /// The parameter name, as declared (snake_case).
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The camelCase payload field name this parameter reads.
    #[must_use]
    pub fn wire_name(&self) -> &str {
        &self.wire_name
    }

    /// Converts this parameter's raw payload field into its argument value.
    ///
    /// # Errors
    ///
    /// Returns [`ConversionError`] when the field is missing, null, of the
    /// wrong JSON type, or fails to parse.
    pub fn convert(&self, fields: &FieldMap) -> Result<FieldValue, ConversionError> {
        field::convert_field(
            fields.get(&self.wire_name),
            &self.name,
            &self.wire_name,
            self.kind,
            self.nullable,
        )
    }
}

/// A compiled factory for one event type: the parameter plan plus the
/// constructor.
#[derive(Debug)]
pub struct EventFactory {
    type_name: String,
    parameters: Vec<CompiledParameter>,
    constructor: EventConstructor,
}

impl EventFactory {
    fn compile(registration: &EventTypeRegistration) -> Self {
        let parameters = registration
            .parameters()
            .iter()
            .map(CompiledParameter::compile)
            .collect();
        Self {
            type_name: registration.type_name().to_owned(),
            parameters,
            constructor: registration.constructor(),
        }
    }

    /// The discriminator this factory constructs.
    #[must_use]
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// The parameter plan, in constructor declaration order.
    #[must_use]
    pub fn parameters(&self) -> &[CompiledParameter] {
        &self.parameters
    }

    /// Invokes the constructor with the ordered converted arguments.
    ///
    /// # Errors
    ///
    /// Returns [`ActivationError`] when the argument count does not match
    /// the parameter plan or the constructor consumes an argument as the
    /// wrong kind — a defect in the registration, never in stored data.
    pub fn invoke(&self, args: Vec<FieldValue>) -> Result<BoxedEvent, ActivationError> {
        if args.len() != self.parameters.len() {
            return Err(ActivationError::ArityMismatch {
                expected: self.parameters.len(),
                actual: args.len(),
            });
        }
        (self.constructor)(ConvertedArgs::new(args))
    }
}

/// Ordered converted arguments handed to a registration's constructor.
///
/// Constructors consume the arguments in declaration order with the
/// `next_*` accessors. A kind mismatch means the constructor disagrees with
/// the parameters it declared and fails loudly.
#[derive(Debug)]
pub struct ConvertedArgs {
    values: std::vec::IntoIter<FieldValue>,
    supplied: usize,
    index: usize,
}

impl ConvertedArgs {
    /// Wraps an ordered argument list.
    #[must_use]
    pub fn new(values: Vec<FieldValue>) -> Self {
        let supplied = values.len();
        Self {
            values: values.into_iter(),
            supplied,
            index: 0,
        }
    }

    fn next(&mut self, expected: &'static str) -> Result<FieldValue, ActivationError> {
        let index = self.index;
        self.index += 1;
        self.values
            .next()
            .ok_or(ActivationError::MissingArgument {
                index,
                expected,
                available: self.supplied,
            })
    }

    fn mismatch(&self, expected: &'static str, actual: &FieldValue) -> ActivationError {
        ActivationError::ArgumentMismatch {
            index: self.index - 1,
            expected,
            actual: actual.kind_name(),
        }
    }

    /// Consumes the next argument as a bool.
    ///
    /// # Errors
    ///
    /// Returns [`ActivationError`] if the next argument is not a bool.
    pub fn next_bool(&mut self) -> Result<bool, ActivationError> {
        match self.next("bool")? {
            FieldValue::Bool(value) => Ok(value),
            other => Err(self.mismatch("bool", &other)),
        }
    }

    /// Consumes the next argument as an integer.
    ///
    /// # Errors
    ///
    /// Returns [`ActivationError`] if the next argument is not an int.
    pub fn next_int(&mut self) -> Result<i64, ActivationError> {
        match self.next("int")? {
            FieldValue::Int(value) => Ok(value),
            other => Err(self.mismatch("int", &other)),
        }
    }

    /// Consumes the next argument as a float.
    ///
    /// # Errors
    ///
    /// Returns [`ActivationError`] if the next argument is not a float.
    pub fn next_float(&mut self) -> Result<f64, ActivationError> {
        match self.next("float")? {
            FieldValue::Float(value) => Ok(value),
            other => Err(self.mismatch("float", &other)),
        }
    }

    /// Consumes the next argument as text.
    ///
    /// # Errors
    ///
    /// Returns [`ActivationError`] if the next argument is not text.
    pub fn next_text(&mut self) -> Result<String, ActivationError> {
        match self.next("text")? {
            FieldValue::Text(value) => Ok(value),
            other => Err(self.mismatch("text", &other)),
        }
    }

    /// Consumes the next argument as a UUID.
    ///
    /// # Errors
    ///
    /// Returns [`ActivationError`] if the next argument is not a uuid.
    pub fn next_uuid(&mut self) -> Result<Uuid, ActivationError> {
        match self.next("uuid")? {
            FieldValue::Uuid(value) => Ok(value),
            other => Err(self.mismatch("uuid", &other)),
        }
    }

    /// Consumes the next argument as a UTC instant.
    ///
    /// # Errors
    ///
    /// Returns [`ActivationError`] if the next argument is not a timestamp.
    pub fn next_timestamp(&mut self) -> Result<DateTime<Utc>, ActivationError> {
        match self.next("timestamp")? {
            FieldValue::Timestamp(value) => Ok(value),
            other => Err(self.mismatch("timestamp", &other)),
        }
    }

    /// Consumes the next argument as a date range.
    ///
    /// # Errors
    ///
    /// Returns [`ActivationError`] if the next argument is not a date range.
    pub fn next_range(&mut self) -> Result<DateRange, ActivationError> {
        match self.next("date range")? {
            FieldValue::DateRange(value) => Ok(value),
            other => Err(self.mismatch("date range", &other)),
        }
    }

    /// Consumes the next argument as raw passthrough text.
    ///
    /// # Errors
    ///
    /// Returns [`ActivationError`] if the next argument is not raw text.
    pub fn next_raw(&mut self) -> Result<String, ActivationError> {
        match self.next("raw")? {
            FieldValue::Raw(value) => Ok(value),
            other => Err(self.mismatch("raw", &other)),
        }
    }

    /// Consumes the next argument as nullable text.
    ///
    /// # Errors
    ///
    /// Returns [`ActivationError`] if the next argument is neither text nor
    /// null.
    pub fn next_opt_text(&mut self) -> Result<Option<String>, ActivationError> {
        match self.next("text or null")? {
            FieldValue::Null => Ok(None),
            FieldValue::Text(value) => Ok(Some(value)),
            other => Err(self.mismatch("text or null", &other)),
        }
    }

    /// Consumes the next argument as a nullable integer.
    ///
    /// # Errors
    ///
    /// Returns [`ActivationError`] if the next argument is neither an int
    /// nor null.
    pub fn next_opt_int(&mut self) -> Result<Option<i64>, ActivationError> {
        match self.next("int or null")? {
            FieldValue::Null => Ok(None),
            FieldValue::Int(value) => Ok(Some(value)),
            other => Err(self.mismatch("int or null", &other)),
        }
    }

    /// Consumes the next argument as a nullable UUID.
    ///
    /// # Errors
    ///
    /// Returns [`ActivationError`] if the next argument is neither a uuid
    /// nor null.
    pub fn next_opt_uuid(&mut self) -> Result<Option<Uuid>, ActivationError> {
        match self.next("uuid or null")? {
            FieldValue::Null => Ok(None),
            FieldValue::Uuid(value) => Ok(Some(value)),
            other => Err(self.mismatch("uuid or null", &other)),
        }
    }
}

/// Process-wide cache of compiled event factories.
///
/// The mutex covers only the check-then-insert on the factory map; argument
/// conversion and constructor invocation happen outside the lock, so
/// concurrent reconstruction of different types never serializes on each
/// other and the lock never covers I/O or conversion work.
#[derive(Debug, Default)]
pub struct ActivatorCache {
    factories: Mutex<HashMap<String, Arc<EventFactory>>>,
    builds: AtomicU64,
}

impl ActivatorCache {
    /// Creates an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the compiled factory for a registration, compiling it on
    /// first use.
    pub fn factory_for(&self, registration: &EventTypeRegistration) -> Arc<EventFactory> {
        let mut factories = self
            .factories
            .lock()
            .expect("activator cache lock poisoned");
        if let Some(factory) = factories.get(registration.type_name()) {
            return Arc::clone(factory);
        }
        let factory = Arc::new(EventFactory::compile(registration));
        self.builds.fetch_add(1, Ordering::Relaxed);
        factories.insert(registration.type_name().to_owned(), Arc::clone(&factory));
        tracing::debug!(event_type = registration.type_name(), "compiled event factory");
        factory
    }

    /// Number of factory compilations since construction: exactly one per
    /// event type, regardless of how many rows of that type were
    /// reconstructed.
    #[must_use]
    pub fn build_count(&self) -> u64 {
        self.builds.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::{ActivatorCache, ConvertedArgs};
    use crate::error::ActivationError;
    use crate::field::FieldValue;
    use crate::test_fixtures::stub_registration;

    #[test]
    fn test_factory_is_compiled_once_per_type() {
        let cache = ActivatorCache::new();
        let registration = stub_registration();

        let first = cache.factory_for(&registration);
        let second = cache.factory_for(&registration);

        assert_eq!(cache.build_count(), 1);
        assert!(std::sync::Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn test_compiled_parameters_carry_camel_case_wire_names() {
        let cache = ActivatorCache::new();
        let factory = cache.factory_for(&stub_registration());

        let wire_names: Vec<&str> = factory
            .parameters()
            .iter()
            .map(super::CompiledParameter::wire_name)
            .collect();

        assert_eq!(wire_names, ["aggregateId", "label", "amount"]);
    }

    #[test]
    fn test_invoke_rejects_wrong_argument_count() {
        let cache = ActivatorCache::new();
        let factory = cache.factory_for(&stub_registration());

        let result = factory.invoke(vec![FieldValue::Int(1)]);

        assert!(matches!(
            result.unwrap_err(),
            ActivationError::ArityMismatch {
                expected: 3,
                actual: 1,
            }
        ));
    }

    #[test]
    fn test_args_report_kind_mismatches_by_index() {
        let mut args = ConvertedArgs::new(vec![FieldValue::Text("oops".to_owned())]);

        let result = args.next_int();

        assert!(matches!(
            result.unwrap_err(),
            ActivationError::ArgumentMismatch {
                index: 0,
                expected: "int",
                actual: "text",
            }
        ));
    }

    #[test]
    fn test_args_report_overconsumption() {
        let mut args = ConvertedArgs::new(vec![FieldValue::Int(1)]);
        args.next_int().unwrap();

        let result = args.next_int();

        assert!(matches!(
            result.unwrap_err(),
            ActivationError::MissingArgument {
                index: 1,
                available: 1,
                ..
            }
        ));
    }
}
