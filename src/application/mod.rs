//! Application layer - Sessions, dispatch and launching
//!
//! This layer contains:
//! - Services: Session construction and event handling
//! - Messaging: Command parsing and reply splitting
//! - Launcher: Concurrent multi-session startup
//! - Monitor: Session status for the keep-alive API
//! - Errors: Error types shared by every layer

pub mod errors;
pub mod launcher;
pub mod messaging;
pub mod monitor;
pub mod services;
