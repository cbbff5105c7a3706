//! Scripted gateway - replays synthetic events without a network connection

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::application::errors::BotError;
use crate::domain::entities::{BotInfo, SessionIdentity};
use crate::domain::traits::{EventSink, Gateway, GatewayEvent, Outbox};

/// A message captured by [`RecordingOutbox`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentMessage {
    pub channel_id: String,
    pub text: String,
}

/// Outbox that keeps every message instead of sending it
#[derive(Default)]
pub struct RecordingOutbox {
    sent: Mutex<Vec<SentMessage>>,
    typing: Mutex<Vec<String>>,
}

impl RecordingOutbox {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn sent(&self) -> Vec<SentMessage> {
        self.sent.lock().await.clone()
    }

    pub async fn texts(&self) -> Vec<String> {
        self.sent.lock().await.iter().map(|m| m.text.clone()).collect()
    }

    pub async fn typing(&self) -> Vec<String> {
        self.typing.lock().await.clone()
    }
}

#[async_trait]
impl Outbox for RecordingOutbox {
    async fn send_message(&self, channel_id: &str, text: &str) -> Result<String, BotError> {
        let mut sent = self.sent.lock().await;
        sent.push(SentMessage {
            channel_id: channel_id.to_string(),
            text: text.to_string(),
        });
        Ok(format!("sent-{}", sent.len()))
    }

    async fn broadcast_typing(&self, channel_id: &str) -> Result<(), BotError> {
        self.typing.lock().await.push(channel_id.to_string());
        Ok(())
    }
}

/// Gateway that authenticates against a fixed token table and replays a
/// script of events to each session.
///
/// Tokens with no registered identity get `bot-<session name>`.
#[derive(Default)]
pub struct ScriptedGateway {
    identities: HashMap<String, BotInfo>,
    rejected: HashSet<String>,
    scripts: HashMap<String, Vec<GatewayEvent>>,
    connect_delays: HashMap<String, Duration>,
    hold_open: bool,
    outboxes: Mutex<HashMap<String, Arc<RecordingOutbox>>>,
}

impl ScriptedGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve `token` to this bot identity at ready time
    pub fn with_identity(mut self, token: impl Into<String>, info: BotInfo) -> Self {
        self.identities.insert(token.into(), info);
        self
    }

    /// Fail authentication for `token`
    pub fn rejecting(mut self, token: impl Into<String>) -> Self {
        self.rejected.insert(token.into());
        self
    }

    /// Events replayed to `session` after its ready event
    pub fn with_script(mut self, session: impl Into<String>, events: Vec<GatewayEvent>) -> Self {
        self.scripts.insert(session.into(), events);
        self
    }

    /// Delay the handshake for the session that logs in with `token`
    pub fn with_connect_delay(mut self, token: impl Into<String>, delay: Duration) -> Self {
        self.connect_delays.insert(token.into(), delay);
        self
    }

    /// Keep connections open after the script instead of returning
    pub fn hold_open(mut self) -> Self {
        self.hold_open = true;
        self
    }

    /// Everything a session sent through this gateway
    pub async fn outbox(&self, session: &str) -> Arc<RecordingOutbox> {
        let mut outboxes = self.outboxes.lock().await;
        Arc::clone(outboxes.entry(session.to_string()).or_default())
    }
}

#[async_trait]
impl Gateway for ScriptedGateway {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn serve(&self, identity: &SessionIdentity, sink: Arc<dyn EventSink>) -> Result<(), BotError> {
        let token = identity.token.expose();
        if let Some(delay) = self.connect_delays.get(token) {
            tokio::time::sleep(*delay).await;
        }
        if token.is_empty() || self.rejected.contains(token) {
            return Err(BotError::Auth(format!("token rejected for session {}", identity.name)));
        }

        let info = self
            .identities
            .get(token)
            .cloned()
            .unwrap_or_else(|| BotInfo::new(format!("bot-{}", identity.name), identity.name.clone()));

        let outbox: Arc<dyn Outbox> = self.outbox(&identity.name).await;
        sink.dispatch(GatewayEvent::Ready(info), Arc::clone(&outbox)).await;

        for event in self.scripts.get(&identity.name).into_iter().flatten() {
            sink.dispatch(event.clone(), Arc::clone(&outbox)).await;
        }

        if self.hold_open {
            std::future::pending::<()>().await;
        }
        Ok(())
    }
}
