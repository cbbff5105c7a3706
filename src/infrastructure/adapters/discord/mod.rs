//! Discord adapter - bridges serenity's client to session event sinks

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serenity::all::{
    ChannelId, Context, EventHandler, GatewayError, GatewayIntents, Message as DiscordMessage, Presence, Ready,
    TypingStartEvent,
};
use serenity::http::Http;
use serenity::{Client, Error as SerenityError};

use crate::application::errors::BotError;
use crate::domain::entities::{BotInfo, ChannelKind, Intents, Message, SessionIdentity, User};
use crate::domain::traits::{EventSink, Gateway, GatewayEvent, Outbox};

/// Sends through Discord's REST API
pub struct DiscordOutbox {
    http: Arc<Http>,
}

impl DiscordOutbox {
    pub fn new(http: Arc<Http>) -> Self {
        Self { http }
    }
}

fn channel(channel_id: &str) -> Result<ChannelId, BotError> {
    channel_id
        .parse::<u64>()
        .ok()
        .filter(|id| *id != 0)
        .map(ChannelId::new)
        .ok_or_else(|| BotError::Gateway(format!("invalid channel id: {}", channel_id)))
}

#[async_trait]
impl Outbox for DiscordOutbox {
    async fn send_message(&self, channel_id: &str, text: &str) -> Result<String, BotError> {
        let sent = channel(channel_id)?
            .say(&*self.http, text)
            .await
            .map_err(map_error)?;
        Ok(sent.id.to_string())
    }

    async fn broadcast_typing(&self, channel_id: &str) -> Result<(), BotError> {
        channel(channel_id)?
            .broadcast_typing(&self.http)
            .await
            .map_err(map_error)
    }
}

/// Translate serenity failures into the bot's error taxonomy
pub fn map_error(err: SerenityError) -> BotError {
    match err {
        SerenityError::Gateway(GatewayError::InvalidAuthentication) => {
            BotError::Auth("Discord rejected the token".to_string())
        }
        SerenityError::Gateway(e) => BotError::Gateway(e.to_string()),
        SerenityError::Http(e) => BotError::Network(e.to_string()),
        SerenityError::Io(e) => BotError::Io(e),
        other => BotError::Internal(other.to_string()),
    }
}

/// Serenity gateway intents with the same bits
pub fn gateway_intents(intents: Intents) -> GatewayIntents {
    GatewayIntents::from_bits_truncate(intents.bits())
}

fn to_message(msg: &DiscordMessage) -> Message {
    let channel = match msg.guild_id {
        Some(guild_id) => ChannelKind::Guild(guild_id.to_string()),
        None => ChannelKind::Direct,
    };

    let mut author = User::new(msg.author.id.to_string(), msg.author.name.clone());
    if let Some(global_name) = &msg.author.global_name {
        author = author.with_global_name(global_name.clone());
    }
    if msg.author.bot {
        author = author.as_bot();
    }

    let timestamp = DateTime::<Utc>::from_timestamp(msg.timestamp.unix_timestamp(), 0).unwrap_or_else(Utc::now);

    Message::new(msg.channel_id.to_string(), channel, author, msg.content.clone())
        .with_id(msg.id.to_string())
        .with_mentions(msg.mentions.iter().map(|u| u.id.to_string()).collect())
        .with_timestamp(timestamp)
}

/// Forwards serenity callbacks to a session
struct Relay {
    session: String,
    sink: Arc<dyn EventSink>,
}

impl Relay {
    fn outbox(ctx: &Context) -> Arc<dyn Outbox> {
        Arc::new(DiscordOutbox::new(Arc::clone(&ctx.http)))
    }
}

#[async_trait]
impl EventHandler for Relay {
    async fn ready(&self, ctx: Context, ready: Ready) {
        tracing::debug!("[{}] Gateway session {} ready", self.session, ready.session_id);
        let info = BotInfo::new(ready.user.id.to_string(), ready.user.name.clone());
        self.sink.dispatch(GatewayEvent::Ready(info), Self::outbox(&ctx)).await;
    }

    async fn message(&self, ctx: Context, new_message: DiscordMessage) {
        let message = to_message(&new_message);
        self.sink.dispatch(GatewayEvent::Message(message), Self::outbox(&ctx)).await;
    }

    async fn typing_start(&self, ctx: Context, event: TypingStartEvent) {
        let event = GatewayEvent::TypingStart {
            channel_id: event.channel_id.to_string(),
            user_id: event.user_id.to_string(),
        };
        self.sink.dispatch(event, Self::outbox(&ctx)).await;
    }

    async fn presence_update(&self, ctx: Context, new_data: Presence) {
        let event = GatewayEvent::PresenceUpdate {
            user_id: new_data.user.id.to_string(),
            status: new_data.status.name().to_string(),
        };
        self.sink.dispatch(event, Self::outbox(&ctx)).await;
    }
}

/// Gateway backed by serenity. Reconnects, heartbeats and rate limits are
/// handled inside serenity.
#[derive(Default)]
pub struct DiscordGateway;

impl DiscordGateway {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Gateway for DiscordGateway {
    fn name(&self) -> &str {
        "discord"
    }

    async fn serve(&self, identity: &SessionIdentity, sink: Arc<dyn EventSink>) -> Result<(), BotError> {
        if identity.token.is_empty() {
            return Err(BotError::Auth(format!("no token configured for session {}", identity.name)));
        }

        let relay = Relay {
            session: identity.name.clone(),
            sink,
        };
        let mut client = Client::builder(identity.token.expose(), gateway_intents(identity.intents))
            .event_handler(relay)
            .await
            .map_err(map_error)?;

        client.start().await.map_err(map_error)
    }
}
