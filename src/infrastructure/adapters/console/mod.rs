//! Console adapter for development/testing

use std::sync::Arc;

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::application::errors::BotError;
use crate::domain::entities::{BotInfo, Message, SessionIdentity, User};
use crate::domain::traits::{EventSink, Gateway, GatewayEvent, Outbox};

const CONSOLE_CHANNEL: &str = "console";

/// Prints replies to stdout
pub struct ConsoleOutbox;

#[async_trait]
impl Outbox for ConsoleOutbox {
    async fn send_message(&self, _channel_id: &str, text: &str) -> Result<String, BotError> {
        println!("[BOT] {}", text);
        Ok("console_msg".to_string())
    }
}

/// Gateway reading stdin lines as direct messages to the bot
pub struct ConsoleGateway {
    info: BotInfo,
    user: User,
}

impl ConsoleGateway {
    pub fn new() -> Self {
        Self {
            info: BotInfo::new("console-bot", "dev-assistant"),
            user: User::new("console-user", "you"),
        }
    }
}

impl Default for ConsoleGateway {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Gateway for ConsoleGateway {
    fn name(&self) -> &str {
        "console"
    }

    async fn serve(&self, identity: &SessionIdentity, sink: Arc<dyn EventSink>) -> Result<(), BotError> {
        tracing::info!("Starting console session {} (dev mode)", identity.name);
        let outbox: Arc<dyn Outbox> = Arc::new(ConsoleOutbox);
        sink.dispatch(GatewayEvent::Ready(self.info.clone()), Arc::clone(&outbox)).await;

        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        while let Some(line) = lines.next_line().await? {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let message = Message::direct(CONSOLE_CHANNEL, self.user.clone(), line);
            sink.dispatch(GatewayEvent::Message(message), Arc::clone(&outbox)).await;
        }

        tracing::info!("Console closed");
        Ok(())
    }
}
