//! Message handling - parsing, reply splitting, log sanitizing

pub mod chunker;
pub mod parser;
pub mod sanitize;

pub use chunker::{split_message, MAX_MESSAGE_LEN};
pub use parser::MessageParser;
pub use sanitize::{preview, sanitize_mentions};
