//! Configuration management

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::PathBuf;

use crate::application::errors::ConfigError;
use crate::application::launcher::FailureMode;
use crate::application::services::defaults::{self, SessionOptions};
use crate::domain::entities::{Intents, SecretToken, SessionIdentity};

/// Token variable for the primary session
pub const TOKEN_ENV: &str = "DISCORD_BOT_TOKEN";

/// Token variables for the second and third session in multi-session mode
pub const MULTI_TOKEN_ENVS: [&str; 2] = ["DISCORD_BOT1_TOKEN", "DISCORD_BOT2_TOKEN"];

pub const DEFAULT_PORT: u16 = 7860;

/// Bot configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct Config {
    pub bot: BotConfig,
    #[serde(default)]
    pub keep_alive: KeepAliveConfig,
    #[serde(default)]
    pub launch: LaunchConfig,
    pub sessions: Vec<SessionConfig>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct BotConfig {
    pub name: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct KeepAliveConfig {
    pub enabled: bool,
    pub port: u16,
}

impl Default for KeepAliveConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            port: DEFAULT_PORT,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct LaunchConfig {
    pub failure_mode: FailureMode,
}

/// One bot session
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct SessionConfig {
    pub name: String,
    /// Inline token; takes precedence over `token-env`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_env: Option<String>,
    pub prefix: String,
    #[serde(default = "default_intents")]
    pub intents: Vec<String>,
    #[serde(default = "default_ping_reply")]
    pub ping_reply: String,
    #[serde(default)]
    pub greeting: Option<String>,
    #[serde(default)]
    pub help_command: Option<String>,
}

fn default_intents() -> Vec<String> {
    Intents::messaging().names().into_iter().map(String::from).collect()
}

fn default_ping_reply() -> String {
    defaults::PING_REPLY.to_string()
}

impl SessionConfig {
    fn from_env(name: &str, token_env: &str, prefix: &str) -> Self {
        Self {
            name: name.to_string(),
            token: None,
            token_env: Some(token_env.to_string()),
            prefix: prefix.to_string(),
            intents: default_intents(),
            ping_reply: default_ping_reply(),
            greeting: None,
            help_command: Some(defaults::HELP_COMMAND.to_string()),
        }
    }

    /// Resolve the token and intents.
    ///
    /// A missing token resolves to an empty one; the session then fails
    /// with an authentication error when it tries to connect.
    pub fn identity(&self) -> Result<SessionIdentity, ConfigError> {
        let token = match (&self.token, &self.token_env) {
            (Some(token), _) => token.clone(),
            (None, Some(var)) => std::env::var(var).unwrap_or_else(|_| {
                tracing::warn!("[{}] {} is not set", self.name, var);
                String::new()
            }),
            (None, None) => String::new(),
        };

        let mut intents = Intents::empty();
        for name in &self.intents {
            intents |= Intents::from_name(name)
                .ok_or_else(|| ConfigError::InvalidValue(format!("unknown intent '{}' in session {}", name, self.name)))?;
        }

        Ok(SessionIdentity::new(&self.name, SecretToken::new(token), &self.prefix).with_intents(intents))
    }

    pub fn options(&self) -> SessionOptions {
        SessionOptions {
            ping_reply: self.ping_reply.clone(),
            greeting: self.greeting.clone(),
            help_command: self.help_command.clone(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        let mut primary = SessionConfig::from_env("primary", TOKEN_ENV, "!");
        primary.greeting = Some(defaults::DEFAULT_GREETING.to_string());

        Self {
            bot: BotConfig {
                name: "dev-assistant".to_string(),
            },
            keep_alive: KeepAliveConfig::default(),
            launch: LaunchConfig::default(),
            sessions: vec![primary],
        }
    }
}

impl Config {
    pub fn load(path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let path = path.into();
        let content = std::fs::read_to_string(&path)
            .map_err(|e| ConfigError::Parse(format!("Failed to read config: {}", e)))?;

        Self::from_yaml(&content)
    }

    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        let config: Config = serde_yaml::from_str(content)
            .map_err(|e| ConfigError::Parse(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Single session reading `DISCORD_BOT_TOKEN`, prefix `!`
    pub fn load_env() -> Self {
        Config::default().with_env_port()
    }

    /// Three sessions reading `DISCORD_BOT_TOKEN`, `DISCORD_BOT1_TOKEN` and
    /// `DISCORD_BOT2_TOKEN`, prefix `/`
    pub fn multi_env() -> Self {
        let mut config = Config::default();
        config.sessions = std::iter::once(TOKEN_ENV)
            .chain(MULTI_TOKEN_ENVS)
            .enumerate()
            .map(|(i, var)| {
                let mut session = SessionConfig::from_env(&format!("bot{}", i), var, "/");
                session.ping_reply = defaults::MULTI_PING_REPLY.to_string();
                session
            })
            .collect();
        config.with_env_port()
    }

    fn with_env_port(mut self) -> Self {
        if let Some(port) = std::env::var("PORT").ok().and_then(|p| p.parse().ok()) {
            self.keep_alive.port = port;
            self.keep_alive.enabled = true;
        }
        self
    }

    /// Use `token` for the first session
    pub fn with_token_override(mut self, token: impl Into<String>) -> Self {
        if let Some(first) = self.sessions.first_mut() {
            first.token = Some(token.into());
        }
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.sessions.is_empty() {
            return Err(ConfigError::MissingField("sessions".to_string()));
        }

        let mut names = HashSet::new();
        for session in &self.sessions {
            if session.prefix.trim().is_empty() {
                return Err(ConfigError::InvalidValue(format!("session {} has an empty prefix", session.name)));
            }
            if !names.insert(session.name.as_str()) {
                return Err(ConfigError::InvalidValue(format!("duplicate session name {}", session.name)));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.sessions.len(), 1);
        assert_eq!(config.sessions[0].prefix, "!");
        assert_eq!(config.sessions[0].ping_reply, "Pong!");
        assert_eq!(config.sessions[0].token_env.as_deref(), Some(TOKEN_ENV));
        assert!(config.sessions[0].greeting.is_some());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_multi_env_sessions() {
        let config = Config::multi_env();
        let envs: Vec<_> = config.sessions.iter().filter_map(|s| s.token_env.as_deref()).collect();
        assert_eq!(envs, vec!["DISCORD_BOT_TOKEN", "DISCORD_BOT1_TOKEN", "DISCORD_BOT2_TOKEN"]);
        assert!(config.sessions.iter().all(|s| s.prefix == "/" && s.ping_reply == "pong"));
    }

    #[test]
    fn test_parse_yaml() {
        let yaml = r#"
bot:
  name: dev-assistant
keep-alive:
  enabled: true
  port: 8080
launch:
  failure-mode: all-or-nothing
sessions:
  - name: alpha
    token: abc
    prefix: "!"
    intents: [guilds, guild-messages]
    greeting: "Hi {mention}"
  - name: beta
    token-env: BETA_TOKEN_UNSET_IN_TESTS
    prefix: "/"
"#;
        let config = Config::from_yaml(yaml).unwrap();
        assert_eq!(config.launch.failure_mode, FailureMode::AllOrNothing);
        assert_eq!(config.keep_alive.port, 8080);

        let alpha = config.sessions[0].identity().unwrap();
        assert_eq!(alpha.token.expose(), "abc");
        assert_eq!(alpha.intents, Intents::GUILDS | Intents::GUILD_MESSAGES);

        let beta = config.sessions[1].identity().unwrap();
        assert!(beta.token.is_empty());
        assert_eq!(beta.intents, Intents::messaging());
        assert_eq!(config.sessions[1].ping_reply, "Pong!");
    }

    #[test]
    fn test_rejects_bad_config() {
        let duplicate = r#"
bot: { name: x }
sessions:
  - { name: a, prefix: "!" }
  - { name: a, prefix: "/" }
"#;
        assert!(matches!(Config::from_yaml(duplicate), Err(ConfigError::InvalidValue(_))));

        let empty = "bot: { name: x }\nsessions: []\n";
        assert!(matches!(Config::from_yaml(empty), Err(ConfigError::MissingField(_))));
    }

    #[test]
    fn test_unknown_intent() {
        let mut session = Config::default().sessions.remove(0);
        session.intents = vec!["voice-magic".to_string()];
        assert!(matches!(session.identity(), Err(ConfigError::InvalidValue(_))));
    }

    #[test]
    fn test_token_override() {
        let config = Config::default().with_token_override("xyz");
        assert_eq!(config.sessions[0].identity().unwrap().token.expose(), "xyz");
    }
}
