use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use super::{BotInfo, Message};
use crate::application::errors::CommandError;
use crate::application::messaging::split_message;
use crate::domain::traits::Outbox;

/// Future returned by a command handler
pub type HandlerFuture = Pin<Box<dyn Future<Output = Result<(), CommandError>> + Send>>;

/// Command handler function type
pub type CommandHandler = Arc<dyn Fn(CommandContext) -> HandlerFuture + Send + Sync>;

/// Everything a handler gets for one invocation
#[derive(Clone)]
pub struct CommandContext {
    pub message: Message,
    pub args: Vec<String>,
    pub bot: BotInfo,
    pub prefix: String,
    outbox: Arc<dyn Outbox>,
}

impl CommandContext {
    pub fn new(message: Message, args: Vec<String>, bot: BotInfo, prefix: impl Into<String>, outbox: Arc<dyn Outbox>) -> Self {
        Self {
            message,
            args,
            bot,
            prefix: prefix.into(),
            outbox,
        }
    }

    /// Send text into the channel the command came from
    pub async fn reply(&self, text: &str) -> Result<(), CommandError> {
        for part in split_message(text) {
            self.outbox
                .send_message(&self.message.channel_id, &part)
                .await
                .map_err(|e| CommandError::Send(e.to_string()))?;
        }
        Ok(())
    }

    pub fn outbox(&self) -> &Arc<dyn Outbox> {
        &self.outbox
    }
}

/// Represents a bot command
pub struct Command {
    pub name: String,
    pub description: Option<String>,
    pub aliases: Vec<String>,
    pub usage: Option<String>,
    pub handler: Option<CommandHandler>,
}

impl std::fmt::Debug for Command {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Command")
            .field("name", &self.name)
            .field("description", &self.description)
            .field("aliases", &self.aliases)
            .field("usage", &self.usage)
            .field("handler", &self.handler.as_ref().map(|_| "<handler>"))
            .finish()
    }
}

impl Command {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            aliases: Vec::new(),
            usage: None,
            handler: None,
        }
    }

    pub fn with_description(mut self, desc: impl Into<String>) -> Self {
        self.description = Some(desc.into());
        self
    }

    pub fn with_aliases(mut self, aliases: Vec<String>) -> Self {
        self.aliases = aliases;
        self
    }

    pub fn with_usage(mut self, usage: impl Into<String>) -> Self {
        self.usage = Some(usage.into());
        self
    }

    pub fn with_handler<F, Fut>(mut self, handler: F) -> Self
    where
        F: Fn(CommandContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), CommandError>> + Send + 'static,
    {
        self.handler = Some(Arc::new(move |ctx| -> HandlerFuture { Box::pin(handler(ctx)) }));
        self
    }

    /// Reply with fixed text
    pub fn replying(name: impl Into<String>, text: impl Into<String>) -> Self {
        let text: Arc<str> = Arc::from(text.into());
        Self::new(name).with_handler(move |ctx| {
            let text = Arc::clone(&text);
            async move { ctx.reply(&text).await }
        })
    }

    pub fn matches(&self, input: &str) -> bool {
        let input_lower = input.to_lowercase();
        self.name.to_lowercase() == input_lower ||
            self.aliases.iter().any(|a| a.to_lowercase() == input_lower)
    }

    fn keys(&self) -> impl Iterator<Item = String> + '_ {
        std::iter::once(self.name.to_lowercase()).chain(self.aliases.iter().map(|a| a.to_lowercase()))
    }
}

/// Command registry for one session
#[derive(Default)]
pub struct CommandRegistry {
    commands: HashMap<String, Command>,
}

impl CommandRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a command. Names and aliases must be unique within the registry.
    pub fn register(&mut self, command: Command) -> Result<(), CommandError> {
        if let Some(taken) = command.keys().find(|key| self.find(key).is_some()) {
            return Err(CommandError::Duplicate(taken));
        }
        self.commands.insert(command.name.to_lowercase(), command);
        Ok(())
    }

    /// Add a command, dropping any existing one with the same name.
    ///
    /// Its name and aliases must not clash with any other command.
    pub fn replace(&mut self, command: Command) -> Result<Option<Command>, CommandError> {
        let own = command.name.to_lowercase();
        let clash = command.keys().find(|key| {
            self.commands
                .iter()
                .any(|(name, other)| *name != own && other.keys().any(|k| k == *key))
        });
        if let Some(taken) = clash {
            return Err(CommandError::Duplicate(taken));
        }
        Ok(self.commands.insert(own, command))
    }

    pub fn get(&self, name: &str) -> Option<&Command> {
        self.commands.get(&name.to_lowercase())
    }

    /// Look up by name or alias
    pub fn find(&self, input: &str) -> Option<&Command> {
        self.get(input)
            .or_else(|| self.commands.values().find(|c| c.matches(input)))
    }

    /// Run the handler registered for `name`.
    ///
    /// Returns `Ok(false)` when nothing is registered under that name.
    pub async fn dispatch(&self, name: &str, ctx: CommandContext) -> Result<bool, CommandError> {
        let Some(cmd) = self.find(name) else {
            tracing::debug!("Ignoring unknown command: {}", name);
            return Ok(false);
        };

        match &cmd.handler {
            Some(handler) => handler(ctx).await?,
            None => tracing::warn!("Command {} has no handler", cmd.name),
        }
        Ok(true)
    }

    /// Formatted listing of every command, sorted by name
    pub fn help_text(&self, prefix: &str) -> String {
        let mut commands: Vec<&Command> = self.commands.values().collect();
        commands.sort_by(|a, b| a.name.cmp(&b.name));

        let mut help = "**Available commands**\n".to_string();
        for cmd in commands {
            help.push_str(&format!("`{}{}` - {}", prefix, cmd.name, cmd.description.as_deref().unwrap_or("No description")));
            if let Some(usage) = &cmd.usage {
                help.push_str(&format!(" (usage: `{}`)", usage));
            }
            help.push('\n');
        }
        help
    }

    pub fn names(&self) -> Vec<&str> {
        self.commands.values().map(|c| c.name.as_str()).collect()
    }

    pub fn all(&self) -> impl Iterator<Item = &Command> {
        self.commands.values()
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}
