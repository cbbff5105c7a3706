//! Message parser - Splits raw message text into commands and plain text

use crate::domain::entities::Content;

/// Parses message text against one session's command prefix
#[derive(Debug, Clone)]
pub struct MessageParser {
    command_prefix: String,
}

impl MessageParser {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            command_prefix: prefix.into(),
        }
    }

    pub fn prefix(&self) -> &str {
        &self.command_prefix
    }

    /// Parse message text
    pub fn parse(&self, text: &str) -> Content {
        let text = text.trim();
        if text.is_empty() {
            return Content::Empty;
        }

        if !self.command_prefix.is_empty() {
            if let Some(cmd_text) = text.strip_prefix(&self.command_prefix) {
                // "! ping" is chatter, not a command
                if !cmd_text.starts_with(char::is_whitespace) {
                    return Self::parse_command(cmd_text);
                }
            }
        }

        Content::Text(text.to_string())
    }

    /// Parse the part after the prefix
    fn parse_command(cmd_text: &str) -> Content {
        let mut parts = cmd_text.split_whitespace();
        let Some(name) = parts.next() else {
            return Content::Empty;
        };

        Content::Command {
            name: name.to_string(),
            args: parts.map(|s| s.to_string()).collect(),
        }
    }
}
