use super::User;
use chrono::{DateTime, Utc};

/// Where a message was posted
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelKind {
    /// One-to-one conversation with the bot
    Direct,
    /// A channel inside a guild (server)
    Guild(String),
}

impl ChannelKind {
    pub fn is_direct(&self) -> bool {
        matches!(self, ChannelKind::Direct)
    }
}

/// Parsed message content
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Content {
    Text(String),
    Command { name: String, args: Vec<String> },
    Empty,
}

impl Content {
    pub fn text(&self) -> Option<&str> {
        match self {
            Content::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn is_command(&self) -> bool {
        matches!(self, Content::Command { .. })
    }
}

/// An incoming message, owned by the dispatcher for one callback invocation
#[derive(Debug, Clone)]
pub struct Message {
    pub id: String,
    pub channel_id: String,
    pub channel: ChannelKind,
    pub author: User,
    pub content: String,
    /// User ids mentioned in the message
    pub mentions: Vec<String>,
    pub timestamp: DateTime<Utc>,
}

impl Message {
    pub fn new(channel_id: impl Into<String>, channel: ChannelKind, author: User, content: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            channel_id: channel_id.into(),
            channel,
            author,
            content: content.into(),
            mentions: Vec::new(),
            timestamp: Utc::now(),
        }
    }

    /// Build a direct message
    pub fn direct(channel_id: impl Into<String>, author: User, content: impl Into<String>) -> Self {
        Self::new(channel_id, ChannelKind::Direct, author, content)
    }

    /// Build a guild channel message
    pub fn in_guild(guild_id: impl Into<String>, channel_id: impl Into<String>, author: User, content: impl Into<String>) -> Self {
        Self::new(channel_id, ChannelKind::Guild(guild_id.into()), author, content)
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    pub fn with_mention(mut self, user_id: impl Into<String>) -> Self {
        self.mentions.push(user_id.into());
        self
    }

    pub fn with_mentions(mut self, user_ids: Vec<String>) -> Self {
        self.mentions = user_ids;
        self
    }

    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }

    pub fn mentions_user(&self, user_id: &str) -> bool {
        self.mentions.iter().any(|m| m == user_id)
    }

    pub fn is_direct(&self) -> bool {
        self.channel.is_direct()
    }
}
