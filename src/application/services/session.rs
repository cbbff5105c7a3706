//! Bot session - one identity, its command registry and its event handlers

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::typing::TypingTracker;
use crate::application::errors::{BotError, CommandError};
use crate::application::messaging::{preview, split_message, MessageParser};
use crate::application::monitor::SessionMonitor;
use crate::domain::entities::{BotInfo, Command, CommandContext, CommandRegistry, Content, Message, SessionIdentity};
use crate::domain::traits::{EventSink, Gateway, GatewayEvent, Outbox};

/// Future returned by event hooks
pub type HookFuture = Pin<Box<dyn Future<Output = Result<(), BotError>> + Send>>;

/// Runs after the built-in ready handling
pub type ReadyHook = Arc<dyn Fn(BotInfo) -> HookFuture + Send + Sync>;

/// Runs for every message not authored by the bot itself, before command dispatch
pub type MessageHook = Arc<dyn Fn(Message, Arc<dyn Outbox>) -> HookFuture + Send + Sync>;

/// Placeholder replaced with the author's mention in greeting text
pub const MENTION_PLACEHOLDER: &str = "{mention}";

/// Builds a [`Session`] with explicit registrations
pub struct SessionBuilder {
    identity: SessionIdentity,
    commands: CommandRegistry,
    greeting: Option<String>,
    help_command: Option<String>,
    ready_hooks: Vec<ReadyHook>,
    message_hooks: Vec<MessageHook>,
    monitor: Option<SessionMonitor>,
}

impl SessionBuilder {
    pub fn new(identity: SessionIdentity) -> Self {
        Self {
            identity,
            commands: CommandRegistry::new(),
            greeting: None,
            help_command: None,
            ready_hooks: Vec::new(),
            message_hooks: Vec::new(),
            monitor: None,
        }
    }

    /// Register a command; duplicate names are rejected
    pub fn command(mut self, command: Command) -> Result<Self, CommandError> {
        self.commands.register(command)?;
        Ok(self)
    }

    /// Reply to direct messages and mentions with this text.
    /// `{mention}` is replaced with the author's mention.
    pub fn with_greeting(mut self, greeting: impl Into<String>) -> Self {
        self.greeting = Some(greeting.into());
        self
    }

    /// Register a help command listing every command of the session
    pub fn with_help(mut self, name: impl Into<String>) -> Self {
        self.help_command = Some(name.into());
        self
    }

    pub fn with_monitor(mut self, monitor: SessionMonitor) -> Self {
        self.monitor = Some(monitor);
        self
    }

    pub fn on_ready<F, Fut>(mut self, hook: F) -> Self
    where
        F: Fn(BotInfo) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), BotError>> + Send + 'static,
    {
        self.ready_hooks.push(Arc::new(move |info| -> HookFuture { Box::pin(hook(info)) }));
        self
    }

    pub fn on_message<F, Fut>(mut self, hook: F) -> Self
    where
        F: Fn(Message, Arc<dyn Outbox>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), BotError>> + Send + 'static,
    {
        self.message_hooks.push(Arc::new(move |msg, outbox| -> HookFuture { Box::pin(hook(msg, outbox)) }));
        self
    }

    pub fn build(mut self) -> Result<Session, CommandError> {
        if let Some(name) = self.help_command.take() {
            let text: Arc<once_cell::sync::OnceCell<String>> = Arc::new(once_cell::sync::OnceCell::new());
            let handler_text = Arc::clone(&text);
            self.commands.register(
                Command::new(&name)
                    .with_description("Show this help message")
                    .with_handler(move |ctx| {
                        let text = Arc::clone(&handler_text);
                        async move {
                            let help = text.get().map(String::as_str).unwrap_or_default();
                            ctx.reply(help).await
                        }
                    }),
            )?;
            let _ = text.set(self.commands.help_text(&self.identity.prefix));
        }

        tracing::debug!(
            "Session {} built with commands: {:?}",
            self.identity.name,
            self.commands.names()
        );

        let handler = SessionHandler {
            session: self.identity.name.clone(),
            parser: MessageParser::new(&self.identity.prefix),
            commands: self.commands,
            greeting: self.greeting,
            ready_hooks: self.ready_hooks,
            message_hooks: self.message_hooks,
            me: RwLock::new(None),
            typing: TypingTracker::new(),
            monitor: self.monitor,
        };

        Ok(Session {
            identity: self.identity,
            handler: Arc::new(handler),
        })
    }
}

/// One bot session: an identity plus the handlers its events go to
pub struct Session {
    identity: SessionIdentity,
    handler: Arc<SessionHandler>,
}

impl Session {
    pub fn builder(identity: SessionIdentity) -> SessionBuilder {
        SessionBuilder::new(identity)
    }

    pub fn name(&self) -> &str {
        &self.identity.name
    }

    pub fn identity(&self) -> &SessionIdentity {
        &self.identity
    }

    pub fn handler(&self) -> Arc<SessionHandler> {
        Arc::clone(&self.handler)
    }

    pub fn monitor(&self) -> Option<&SessionMonitor> {
        self.handler.monitor.as_ref()
    }

    /// Connect through `gateway` and serve events until the connection ends
    pub async fn run(&self, gateway: &dyn Gateway) -> Result<(), BotError> {
        let monitor = self.handler.monitor.as_ref();
        if let Some(monitor) = monitor {
            monitor.starting(&self.identity.name).await;
        }

        let result = if self.identity.token.is_empty() {
            Err(BotError::Auth(format!("no token configured for session {}", self.identity.name)))
        } else {
            tracing::info!("[{}] Connecting via {} gateway", self.identity.name, gateway.name());
            let sink: Arc<dyn EventSink> = self.handler();
            gateway.serve(&self.identity, sink).await
        };

        if let Some(monitor) = monitor {
            match &result {
                Ok(()) => monitor.stopped(&self.identity.name).await,
                Err(e) => monitor.failed(&self.identity.name, e.to_string()).await,
            }
        }
        result
    }
}

/// Event handling for one session
pub struct SessionHandler {
    session: String,
    parser: MessageParser,
    commands: CommandRegistry,
    greeting: Option<String>,
    ready_hooks: Vec<ReadyHook>,
    message_hooks: Vec<MessageHook>,
    me: RwLock<Option<BotInfo>>,
    typing: TypingTracker,
    monitor: Option<SessionMonitor>,
}

impl SessionHandler {
    pub fn commands(&self) -> &CommandRegistry {
        &self.commands
    }

    pub fn typing(&self) -> &TypingTracker {
        &self.typing
    }

    /// Identity resolved at the last ready event
    pub async fn bot_info(&self) -> Option<BotInfo> {
        self.me.read().await.clone()
    }

    async fn on_ready(&self, info: BotInfo, outbox: Arc<dyn Outbox>) {
        tracing::info!("[{}] Logged in as {}", self.session, info);
        *self.me.write().await = Some(info.clone());

        if let Some(monitor) = &self.monitor {
            monitor.ready(&self.session, info.clone(), outbox).await;
        }

        for hook in &self.ready_hooks {
            if let Err(e) = hook(info.clone()).await {
                tracing::warn!("[{}] Ready hook failed: {}", self.session, e);
            }
        }
    }

    async fn on_message(&self, message: Message, outbox: Arc<dyn Outbox>) {
        let Some(me) = self.bot_info().await else {
            tracing::debug!("[{}] Message before ready, ignoring", self.session);
            return;
        };

        if message.author.id == me.id {
            return;
        }

        tracing::debug!(
            "[{}] <{}> {}",
            self.session,
            message.author,
            preview(&message.content)
        );

        if let Some(greeting) = &self.greeting {
            let addressed = message.is_direct() || message.mentions_user(&me.id);
            if addressed && !message.author.is_bot {
                let text = greeting.replace(MENTION_PLACEHOLDER, &message.author.mention());
                self.send(&outbox, &message.channel_id, &text).await;
            }
        }

        for hook in &self.message_hooks {
            if let Err(e) = hook(message.clone(), Arc::clone(&outbox)).await {
                tracing::warn!("[{}] Message hook failed: {}", self.session, e);
            }
        }

        if let Content::Command { name, args } = self.parser.parse(&message.content) {
            if self.commands.find(&name).is_some() {
                if let Err(e) = outbox.broadcast_typing(&message.channel_id).await {
                    tracing::debug!("[{}] Typing indicator failed: {}", self.session, e);
                }
            }
            let ctx = CommandContext::new(message, args, me, self.parser.prefix(), outbox);
            match self.commands.dispatch(&name, ctx).await {
                Ok(true) => tracing::debug!("[{}] Handled command {}", self.session, name),
                Ok(false) => {}
                Err(e) => tracing::warn!("[{}] Command {} failed: {}", self.session, name, e),
            }
        }
    }

    async fn send(&self, outbox: &Arc<dyn Outbox>, channel_id: &str, text: &str) {
        for part in split_message(text) {
            if let Err(e) = outbox.send_message(channel_id, &part).await {
                tracing::error!("[{}] Failed to send message: {}", self.session, e);
                return;
            }
        }
    }
}

#[async_trait]
impl EventSink for SessionHandler {
    async fn dispatch(&self, event: GatewayEvent, outbox: Arc<dyn Outbox>) {
        match event {
            GatewayEvent::Ready(info) => self.on_ready(info, outbox).await,
            GatewayEvent::Message(message) => self.on_message(message, outbox).await,
            GatewayEvent::TypingStart { channel_id, user_id } => {
                self.typing.record(&channel_id, &user_id);
                tracing::debug!("[{}] {} is typing in {}", self.session, user_id, channel_id);
            }
            GatewayEvent::PresenceUpdate { user_id, status } => {
                tracing::debug!("[{}] User {} is now {}", self.session, user_id, status);
            }
        }
    }
}
