//! Domain entities - Core bot objects with no platform dependencies

pub mod user;
pub mod message;
pub mod command;
pub mod session;

pub use user::{BotInfo, User};
pub use message::{ChannelKind, Content, Message};
pub use command::{Command, CommandContext, CommandHandler, CommandRegistry};
pub use session::{Intents, SecretToken, SessionIdentity};
