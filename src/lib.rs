//! dev-assistant - Discord bot sessions with a command registry and a
//! concurrent multi-session launcher.

pub mod application;
pub mod domain;
pub mod infrastructure;
