//! Chronicle Orders — reference bounded context for the Chronicle engine.
//!
//! Demonstrates the consumer boundary: domain events, an aggregate whose
//! state derives from replaying them, and the startup registration of the
//! context's event types.

pub mod domain;
pub mod registry;
