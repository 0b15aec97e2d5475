//! Event type registry.
//!
//! The registry is the explicit map from stored type discriminators to
//! event constructors. Every event type registers at startup; `build`
//! validates the whole set, so a defective registration fails before any
//! row is reconstructed. The registry is an ordinary value — construct one
//! at process startup, wrap it in an `Arc`, and hand it to every consumer.
//! Tests build a fresh registry per test.

use std::collections::HashMap;

use crate::activator::ConvertedArgs;
use crate::error::{ActivationError, RegistryError};
use crate::event::BoxedEvent;
use crate::field::FieldKind;

/// Constructor for one event type: ordered, converted arguments in, a fully
/// domain-populated event out (store-managed metadata is assigned later by
/// the `AdditionalMappings` hook).
pub type EventConstructor = fn(ConvertedArgs) -> Result<BoxedEvent, ActivationError>;

/// One declared constructor parameter: name, kind, nullability.
///
/// Parameter names are snake_case; the wire name is derived from them once,
/// at factory-build time.
#[derive(Debug, Clone)]
pub struct ParameterSpec {
    name: String,
    kind: FieldKind,
    nullable: bool,
}

impl ParameterSpec {
    /// The parameter name, as declared (snake_case).
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The field kind this parameter expects.
    #[must_use]
    pub fn kind(&self) -> FieldKind {
        self.kind
    }

    /// Whether a null or absent payload field is acceptable.
    #[must_use]
    pub fn is_nullable(&self) -> bool {
        self.nullable
    }
}

/// A single event type's registration: discriminator, ordered parameters,
/// and constructor.
#[derive(Debug, Clone)]
pub struct EventTypeRegistration {
    type_name: String,
    parameters: Vec<ParameterSpec>,
    constructor: EventConstructor,
}

impl EventTypeRegistration {
    /// Starts a registration for the given discriminator.
    #[must_use]
    pub fn builder(type_name: impl Into<String>) -> EventTypeRegistrationBuilder {
        EventTypeRegistrationBuilder {
            type_name: type_name.into(),
            parameters: Vec::new(),
        }
    }

    /// The stored type discriminator.
    #[must_use]
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// The declared parameters, in constructor declaration order.
    #[must_use]
    pub fn parameters(&self) -> &[ParameterSpec] {
        &self.parameters
    }

    /// The constructor.
    #[must_use]
    pub fn constructor(&self) -> EventConstructor {
        self.constructor
    }
}

/// Builder for [`EventTypeRegistration`].
#[derive(Debug)]
pub struct EventTypeRegistrationBuilder {
    type_name: String,
    parameters: Vec<ParameterSpec>,
}

impl EventTypeRegistrationBuilder {
    /// Declares the next constructor parameter, in declaration order.
    #[must_use]
    pub fn parameter(mut self, name: impl Into<String>, kind: FieldKind) -> Self {
        self.parameters.push(ParameterSpec {
            name: name.into(),
            kind,
            nullable: false,
        });
        self
    }

    /// Declares the next constructor parameter as nullable: a null or
    /// absent payload field converts to `FieldValue::Null` instead of
    /// failing.
    #[must_use]
    pub fn nullable_parameter(mut self, name: impl Into<String>, kind: FieldKind) -> Self {
        self.parameters.push(ParameterSpec {
            name: name.into(),
            kind,
            nullable: true,
        });
        self
    }

    /// Finishes the registration with its constructor.
    #[must_use]
    pub fn constructor(self, constructor: EventConstructor) -> EventTypeRegistration {
        EventTypeRegistration {
            type_name: self.type_name,
            parameters: self.parameters,
            constructor,
        }
    }
}

/// Registry of every event type known to the process.
#[derive(Debug)]
pub struct EventTypeRegistry {
    registrations: HashMap<String, EventTypeRegistration>,
}

impl EventTypeRegistry {
    /// Starts an empty registry builder.
    #[must_use]
    pub fn builder() -> EventTypeRegistryBuilder {
        EventTypeRegistryBuilder {
            registrations: Vec::new(),
        }
    }

    /// Resolves a stored type discriminator to its registration.
    ///
    /// A pure, idempotent lookup. Returns `None` for unknown names — an
    /// unknown discriminator is a data problem (the type was removed or
    /// renamed since the row was written) and is surfaced by the
    /// reconstructor, not here.
    #[must_use]
    pub fn resolve(&self, type_name: &str) -> Option<&EventTypeRegistration> {
        self.registrations.get(type_name)
    }

    /// Number of registered event types.
    #[must_use]
    pub fn len(&self) -> usize {
        self.registrations.len()
    }

    /// Whether the registry has no registrations.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.registrations.is_empty()
    }
}

/// Builder for [`EventTypeRegistry`].
#[derive(Debug)]
pub struct EventTypeRegistryBuilder {
    registrations: Vec<EventTypeRegistration>,
}

impl EventTypeRegistryBuilder {
    /// Adds one event type registration.
    #[must_use]
    pub fn register(mut self, registration: EventTypeRegistration) -> Self {
        self.registrations.push(registration);
        self
    }

    /// Validates the registration set and builds the registry.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError`] for empty or duplicate discriminators and
    /// for duplicate parameter names. These are defects in registration
    /// code, not in stored data, and must fail at startup.
    pub fn build(self) -> Result<EventTypeRegistry, RegistryError> {
        let mut registrations = HashMap::with_capacity(self.registrations.len());
        for registration in self.registrations {
            if registration.type_name.is_empty() {
                return Err(RegistryError::EmptyEventTypeName);
            }
            {
                let mut seen = std::collections::HashSet::new();
                for parameter in &registration.parameters {
                    if !seen.insert(parameter.name.as_str()) {
                        return Err(RegistryError::DuplicateParameter {
                            event_type: registration.type_name.clone(),
                            parameter: parameter.name.clone(),
                        });
                    }
                }
            }
            let type_name = registration.type_name.clone();
            if registrations.insert(type_name.clone(), registration).is_some() {
                return Err(RegistryError::DuplicateEventType(type_name));
            }
        }
        Ok(EventTypeRegistry { registrations })
    }
}

#[cfg(test)]
mod tests {
    use super::EventTypeRegistry;
    use crate::error::RegistryError;
    use crate::field::FieldKind;
    use crate::test_fixtures::stub_registration;

    #[test]
    fn test_resolve_finds_registered_types_and_rejects_unknown_names() {
        let registry = EventTypeRegistry::builder()
            .register(stub_registration())
            .build()
            .unwrap();

        assert!(registry.resolve("test.stub_recorded").is_some());
        assert!(registry.resolve("test.retired_event").is_none());
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_build_rejects_duplicate_discriminators() {
        let result = EventTypeRegistry::builder()
            .register(stub_registration())
            .register(stub_registration())
            .build();

        assert!(matches!(
            result.unwrap_err(),
            RegistryError::DuplicateEventType(name) if name == "test.stub_recorded"
        ));
    }

    #[test]
    fn test_build_rejects_duplicate_parameter_names() {
        let registration = super::EventTypeRegistration::builder("test.broken")
            .parameter("amount", FieldKind::Int)
            .parameter("amount", FieldKind::Int)
            .constructor(|_| unreachable!("never constructed"));

        let result = EventTypeRegistry::builder().register(registration).build();

        assert!(matches!(
            result.unwrap_err(),
            RegistryError::DuplicateParameter { parameter, .. } if parameter == "amount"
        ));
    }

    #[test]
    fn test_build_rejects_empty_discriminators() {
        let registration = super::EventTypeRegistration::builder("")
            .constructor(|_| unreachable!("never constructed"));

        let result = EventTypeRegistry::builder().register(registration).build();

        assert!(matches!(result.unwrap_err(), RegistryError::EmptyEventTypeName));
    }
}
