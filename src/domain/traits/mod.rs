//! Domain traits - Abstractions for infrastructure implementations

pub mod gateway;

pub use gateway::{EventSink, Gateway, GatewayEvent, Outbox};
