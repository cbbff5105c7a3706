//! Platform adapters - Gateway implementations

pub mod console;
pub mod discord;
pub mod scripted;

pub use console::ConsoleGateway;
pub use discord::DiscordGateway;
pub use scripted::{RecordingOutbox, ScriptedGateway};
