//! Session status tracking for the keep-alive API

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;
use tokio::sync::RwLock;

use crate::domain::entities::BotInfo;
use crate::domain::traits::Outbox;

/// Lifecycle state of one session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum SessionState {
    Starting,
    Ready,
    Stopped,
    Failed,
}

/// Serializable view of a session's status
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionStatus {
    pub session: String,
    pub state: SessionState,
    pub bot_id: Option<String>,
    pub bot_name: Option<String>,
    pub last_error: Option<String>,
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum MonitorError {
    #[error("Unknown session: {0}")]
    UnknownSession(String),

    #[error("Session {0} is not ready")]
    NotReady(String),

    #[error("No session given and {0} are running")]
    Ambiguous(usize),
}

struct Entry {
    state: SessionState,
    bot: Option<BotInfo>,
    last_error: Option<String>,
    outbox: Option<Arc<dyn Outbox>>,
}

/// Shared, read-mostly view of every session in the process.
///
/// Sessions only write their own entry.
#[derive(Clone, Default)]
pub struct SessionMonitor {
    entries: Arc<RwLock<BTreeMap<String, Entry>>>,
}

impl SessionMonitor {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn starting(&self, session: &str) {
        let mut entries = self.entries.write().await;
        entries.insert(session.to_string(), Entry {
            state: SessionState::Starting,
            bot: None,
            last_error: None,
            outbox: None,
        });
    }

    pub async fn ready(&self, session: &str, bot: BotInfo, outbox: Arc<dyn Outbox>) {
        let mut entries = self.entries.write().await;
        let entry = entries.entry(session.to_string()).or_insert_with(|| Entry {
            state: SessionState::Starting,
            bot: None,
            last_error: None,
            outbox: None,
        });
        entry.state = SessionState::Ready;
        entry.bot = Some(bot);
        entry.outbox = Some(outbox);
    }

    pub async fn stopped(&self, session: &str) {
        self.finish(session, SessionState::Stopped, None).await;
    }

    pub async fn failed(&self, session: &str, error: impl Into<String>) {
        self.finish(session, SessionState::Failed, Some(error.into())).await;
    }

    async fn finish(&self, session: &str, state: SessionState, error: Option<String>) {
        let mut entries = self.entries.write().await;
        if let Some(entry) = entries.get_mut(session) {
            entry.state = state;
            entry.outbox = None;
            if error.is_some() {
                entry.last_error = error;
            }
        }
    }

    pub async fn state(&self, session: &str) -> Option<SessionState> {
        self.entries.read().await.get(session).map(|e| e.state)
    }

    pub async fn snapshot(&self) -> Vec<SessionStatus> {
        self.entries
            .read()
            .await
            .iter()
            .map(|(name, entry)| SessionStatus {
                session: name.clone(),
                state: entry.state,
                bot_id: entry.bot.as_ref().map(|b| b.id.clone()),
                bot_name: entry.bot.as_ref().map(|b| b.name.clone()),
                last_error: entry.last_error.clone(),
            })
            .collect()
    }

    /// Outbox of a ready session. With `None`, the only session is used.
    pub async fn outbox(&self, session: Option<&str>) -> Result<Arc<dyn Outbox>, MonitorError> {
        let entries = self.entries.read().await;
        let (name, entry) = match session {
            Some(name) => entries
                .get_key_value(name)
                .ok_or_else(|| MonitorError::UnknownSession(name.to_string()))?,
            None if entries.len() == 1 => entries
                .iter()
                .next()
                .ok_or_else(|| MonitorError::UnknownSession(String::new()))?,
            None => return Err(MonitorError::Ambiguous(entries.len())),
        };

        entry
            .outbox
            .clone()
            .ok_or_else(|| MonitorError::NotReady(name.clone()))
    }
}
