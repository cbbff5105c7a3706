use std::fmt;
use std::ops::{BitOr, BitOrAssign};

/// Bot token. Never printed.
#[derive(Clone, PartialEq, Eq, Default)]
pub struct SecretToken(String);

impl SecretToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into().trim().to_string())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for SecretToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            write!(f, "SecretToken(<empty>)")
        } else {
            write!(f, "SecretToken(<redacted>)")
        }
    }
}

/// Gateway capability flags, using Discord's bit values.
///
/// Kept free of platform types; the Discord adapter tests pin each bit to
/// serenity's `GatewayIntents`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Intents(u64);

impl Intents {
    pub const GUILDS: Intents = Intents(1 << 0);
    pub const GUILD_MEMBERS: Intents = Intents(1 << 1);
    pub const GUILD_PRESENCES: Intents = Intents(1 << 8);
    pub const GUILD_MESSAGES: Intents = Intents(1 << 9);
    pub const GUILD_MESSAGE_TYPING: Intents = Intents(1 << 11);
    pub const DIRECT_MESSAGES: Intents = Intents(1 << 12);
    pub const DIRECT_MESSAGE_TYPING: Intents = Intents(1 << 14);
    pub const MESSAGE_CONTENT: Intents = Intents(1 << 15);

    const NAMED: [(&'static str, Intents); 8] = [
        ("guilds", Intents::GUILDS),
        ("guild-members", Intents::GUILD_MEMBERS),
        ("guild-presences", Intents::GUILD_PRESENCES),
        ("guild-messages", Intents::GUILD_MESSAGES),
        ("guild-message-typing", Intents::GUILD_MESSAGE_TYPING),
        ("direct-messages", Intents::DIRECT_MESSAGES),
        ("direct-message-typing", Intents::DIRECT_MESSAGE_TYPING),
        ("message-content", Intents::MESSAGE_CONTENT),
    ];

    pub const fn empty() -> Self {
        Intents(0)
    }

    pub const fn from_bits(bits: u64) -> Self {
        Intents(bits)
    }

    pub const fn bits(&self) -> u64 {
        self.0
    }

    pub const fn contains(&self, other: Intents) -> bool {
        self.0 & other.0 == other.0
    }

    /// Intents needed to read guild and direct messages
    pub fn messaging() -> Self {
        Intents::GUILDS | Intents::GUILD_MESSAGES | Intents::DIRECT_MESSAGES | Intents::MESSAGE_CONTENT
    }

    /// Look up a flag by its kebab-case name
    pub fn from_name(name: &str) -> Option<Self> {
        let name = name.trim().to_lowercase().replace('_', "-");
        Self::NAMED.iter().find(|(n, _)| *n == name).map(|(_, i)| *i)
    }

    /// Kebab-case names of the flags set
    pub fn names(&self) -> Vec<&'static str> {
        Self::NAMED
            .iter()
            .filter(|(_, i)| self.contains(*i))
            .map(|(n, _)| *n)
            .collect()
    }
}

impl BitOr for Intents {
    type Output = Intents;

    fn bitor(self, rhs: Intents) -> Intents {
        Intents(self.0 | rhs.0)
    }
}

impl BitOrAssign for Intents {
    fn bitor_assign(&mut self, rhs: Intents) {
        self.0 |= rhs.0;
    }
}

/// Identity of one bot session: who it logs in as and how it listens
#[derive(Debug, Clone)]
pub struct SessionIdentity {
    /// Local label used in logs and the status API
    pub name: String,
    pub token: SecretToken,
    pub prefix: String,
    pub intents: Intents,
}

impl SessionIdentity {
    pub fn new(name: impl Into<String>, token: SecretToken, prefix: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            token,
            prefix: prefix.into(),
            intents: Intents::messaging(),
        }
    }

    pub fn with_intents(mut self, intents: Intents) -> Self {
        self.intents = intents;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_is_redacted() {
        let token = SecretToken::new("  abc.def.ghi  ");
        assert_eq!(token.expose(), "abc.def.ghi");
        assert_eq!(format!("{:?}", token), "SecretToken(<redacted>)");
        assert!(SecretToken::new("   ").is_empty());
    }

    #[test]
    fn test_intents_by_name() {
        let intents = Intents::from_name("guild_messages").unwrap() | Intents::from_name("Message-Content").unwrap();
        assert_eq!(intents.bits(), (1 << 9) | (1 << 15));
        assert_eq!(intents.names(), vec!["guild-messages", "message-content"]);
        assert!(Intents::from_name("voice").is_none());
    }

    #[test]
    fn test_messaging_intents() {
        let intents = Intents::messaging();
        assert!(intents.contains(Intents::DIRECT_MESSAGES));
        assert!(intents.contains(Intents::MESSAGE_CONTENT));
        assert!(!intents.contains(Intents::GUILD_PRESENCES));
    }
}
