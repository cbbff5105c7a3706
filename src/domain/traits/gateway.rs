use std::sync::Arc;

use async_trait::async_trait;
use crate::domain::entities::{BotInfo, Message, SessionIdentity};
use crate::application::errors::BotError;

/// Events a gateway delivers to a session
#[derive(Debug, Clone)]
pub enum GatewayEvent {
    /// Connection authenticated; carries the resolved bot identity
    Ready(BotInfo),
    Message(Message),
    TypingStart { channel_id: String, user_id: String },
    PresenceUpdate { user_id: String, status: String },
}

impl GatewayEvent {
    pub fn kind(&self) -> &'static str {
        match self {
            GatewayEvent::Ready(_) => "ready",
            GatewayEvent::Message(_) => "message",
            GatewayEvent::TypingStart { .. } => "typing_start",
            GatewayEvent::PresenceUpdate { .. } => "presence_update",
        }
    }
}

/// Outbound side of a connection - where replies go
#[async_trait]
pub trait Outbox: Send + Sync {
    /// Send a message to a channel, returning the created message id
    async fn send_message(&self, channel_id: &str, text: &str) -> Result<String, BotError>;

    /// Show the typing indicator in a channel
    async fn broadcast_typing(&self, _channel_id: &str) -> Result<(), BotError> {
        Ok(())
    }
}

/// Receives gateway events for one session
#[async_trait]
pub trait EventSink: Send + Sync {
    async fn dispatch(&self, event: GatewayEvent, outbox: Arc<dyn Outbox>);
}

/// Gateway trait - abstraction over the chat service connection.
///
/// `serve` authenticates with the identity's token, pushes every event into
/// `sink` in the order the service emits them, and returns when the
/// connection ends for good.
#[async_trait]
pub trait Gateway: Send + Sync {
    fn name(&self) -> &str;

    async fn serve(&self, identity: &SessionIdentity, sink: Arc<dyn EventSink>) -> Result<(), BotError>;
}
