//! Multi-session launcher - runs independent sessions side by side

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::task::JoinSet;

use crate::application::errors::{BotError, ConfigError};
use crate::application::services::Session;
use crate::domain::traits::Gateway;

/// What a session failure does to the rest of the launch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum FailureMode {
    /// The first failing session stops every other session
    AllOrNothing,
    /// A failing session is reported; the others keep running
    #[default]
    Isolated,
}

/// How one session ended
#[derive(Debug, Clone)]
pub struct SessionOutcome {
    pub session: String,
    pub result: Result<(), String>,
}

/// Per-session results of a launch
#[derive(Debug, Clone, Default)]
pub struct LaunchReport {
    pub outcomes: Vec<SessionOutcome>,
}

impl LaunchReport {
    pub fn failed(&self) -> impl Iterator<Item = &SessionOutcome> {
        self.outcomes.iter().filter(|o| o.result.is_err())
    }

    pub fn succeeded(&self) -> impl Iterator<Item = &SessionOutcome> {
        self.outcomes.iter().filter(|o| o.result.is_ok())
    }

    pub fn all_failed(&self) -> bool {
        !self.outcomes.is_empty() && self.outcomes.iter().all(|o| o.result.is_err())
    }
}

/// Start every session concurrently on the current scheduler.
///
/// Returns once all sessions have ended. With [`FailureMode::AllOrNothing`]
/// the first error aborts the remaining sessions and is returned.
pub async fn launch(sessions: Vec<Session>, gateway: Arc<dyn Gateway>, mode: FailureMode) -> Result<LaunchReport, BotError> {
    if sessions.is_empty() {
        return Err(ConfigError::MissingField("sessions".to_string()).into());
    }

    tracing::info!("Launching {} session(s), failure mode {:?}", sessions.len(), mode);

    let mut tasks = JoinSet::new();
    let mut names = HashMap::new();
    let mut monitors = HashMap::new();
    for session in sessions {
        let gateway = Arc::clone(&gateway);
        let name = session.name().to_string();
        if let Some(monitor) = session.monitor() {
            monitors.insert(name.clone(), monitor.clone());
        }
        let handle = tasks.spawn(async move { session.run(gateway.as_ref()).await });
        names.insert(handle.id(), name);
    }

    let mut report = LaunchReport::default();
    while let Some(joined) = tasks.join_next_with_id().await {
        let (name, result) = match joined {
            Ok((id, result)) => (names.remove(&id).unwrap_or_default(), result),
            Err(e) => (
                names.remove(&e.id()).unwrap_or_default(),
                Err(BotError::Internal(format!("session task died: {}", e))),
            ),
        };

        match result {
            Ok(()) => {
                tracing::info!("[{}] Session ended", name);
                report.outcomes.push(SessionOutcome { session: name, result: Ok(()) });
            }
            Err(e) if mode == FailureMode::AllOrNothing => {
                tracing::error!("[{}] Session failed, stopping all sessions: {}", name, e);
                tasks.shutdown().await;
                for aborted in names.values() {
                    if let Some(monitor) = monitors.get(aborted) {
                        monitor.stopped(aborted).await;
                    }
                }
                return Err(e);
            }
            Err(e) => {
                tracing::error!("[{}] Session failed: {}", name, e);
                report.outcomes.push(SessionOutcome { session: name, result: Err(e.to_string()) });
            }
        }
    }

    Ok(report)
}
