//! Domain layer - Core bot model
//! 
//! This layer contains:
//! - Entities: Users, messages, commands, session identities
//! - Traits: Abstractions over the chat gateway (Gateway, Outbox, EventSink)

pub mod entities;
pub mod traits;
