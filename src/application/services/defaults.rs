//! Built-in commands and greeting used by every session

use crate::application::errors::CommandError;
use crate::domain::entities::{Command, SessionIdentity};
use super::session::SessionBuilder;

/// Reply to `ping` in single-session mode
pub const PING_REPLY: &str = "Pong!";

/// Reply to `ping` in multi-session mode
pub const MULTI_PING_REPLY: &str = "pong";

/// Name of the built-in help command
pub const HELP_COMMAND: &str = "help_dev";

pub const DEFAULT_GREETING: &str =
    "Hello, {mention}! I'm the dev assistant. Send a command or ask for help to see what I can do.";

/// What a standard session says and answers to
#[derive(Debug, Clone)]
pub struct SessionOptions {
    pub ping_reply: String,
    pub greeting: Option<String>,
    pub help_command: Option<String>,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            ping_reply: PING_REPLY.to_string(),
            greeting: Some(DEFAULT_GREETING.to_string()),
            help_command: Some(HELP_COMMAND.to_string()),
        }
    }
}

/// `ping` command answering with fixed text
pub fn ping_command(reply: &str) -> Command {
    Command::replying("ping", reply)
        .with_description("Check that the bot is alive")
}

/// Session builder with the built-in commands registered
pub fn standard_session(identity: SessionIdentity, options: &SessionOptions) -> Result<SessionBuilder, CommandError> {
    let mut builder = SessionBuilder::new(identity)
        .command(ping_command(&options.ping_reply))?;

    if let Some(greeting) = &options.greeting {
        builder = builder.with_greeting(greeting);
    }
    if let Some(help) = &options.help_command {
        builder = builder.with_help(help);
    }
    Ok(builder)
}
