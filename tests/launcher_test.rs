//! Multi-session launcher integration tests
//! Run with: cargo test --test launcher_test

use std::sync::{Arc, Once};
use std::time::Duration;

use tokio::sync::Mutex;

use dev_assistant::application::errors::BotError;
use dev_assistant::application::launcher::{launch, FailureMode};
use dev_assistant::application::monitor::{SessionMonitor, SessionState};
use dev_assistant::application::services::{standard_session, Session, SessionOptions};
use dev_assistant::domain::entities::{BotInfo, Message, SecretToken, SessionIdentity, User};
use dev_assistant::domain::traits::{Gateway, GatewayEvent};
use dev_assistant::infrastructure::adapters::ScriptedGateway;

static INIT: Once = Once::new();

fn ensure_init() {
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt().with_test_writer().try_init();
    });
}

fn identity(name: &str, token: &str) -> SessionIdentity {
    SessionIdentity::new(name, SecretToken::new(token), "/")
}

fn multi_options() -> SessionOptions {
    SessionOptions {
        ping_reply: "pong".to_string(),
        ..SessionOptions::default()
    }
}

/// Session that records the identity it logs in as
fn recording_session(name: &str, token: &str, seen: Arc<Mutex<Vec<(String, BotInfo)>>>) -> Session {
    let session = name.to_string();
    standard_session(identity(name, token), &multi_options())
        .unwrap()
        .on_ready(move |info| {
            let seen = Arc::clone(&seen);
            let session = session.clone();
            async move {
                seen.lock().await.push((session, info));
                Ok(())
            }
        })
        .build()
        .unwrap()
}

fn three_bots() -> ScriptedGateway {
    ScriptedGateway::new()
        .with_identity("t0", BotInfo::new("100", "alpha"))
        .with_identity("t1", BotInfo::new("101", "beta"))
        .with_identity("t2", BotInfo::new("102", "gamma"))
}

#[tokio::test]
async fn test_three_sessions_get_distinct_identities() {
    ensure_init();

    let seen = Arc::new(Mutex::new(Vec::new()));
    let sessions = (0..3)
        .map(|i| recording_session(&format!("bot{}", i), &format!("t{}", i), Arc::clone(&seen)))
        .collect();

    let report = launch(sessions, Arc::new(three_bots()), FailureMode::Isolated).await.unwrap();
    assert_eq!(report.succeeded().count(), 3);

    let mut seen = seen.lock().await.clone();
    seen.sort_by(|a, b| a.0.cmp(&b.0));
    let ids: Vec<_> = seen.iter().map(|(session, info)| (session.as_str(), info.id.as_str())).collect();
    assert_eq!(ids, vec![("bot0", "100"), ("bot1", "101"), ("bot2", "102")]);
}

#[tokio::test]
async fn test_isolated_failure_leaves_others_running() {
    ensure_init();

    let seen = Arc::new(Mutex::new(Vec::new()));
    let sessions = vec![
        recording_session("bot0", "t0", Arc::clone(&seen)),
        recording_session("bot1", "bad", Arc::clone(&seen)),
        recording_session("bot2", "t2", Arc::clone(&seen)),
    ];
    let gateway = three_bots().rejecting("bad");

    let report = launch(sessions, Arc::new(gateway), FailureMode::Isolated).await.unwrap();

    let failed: Vec<_> = report.failed().map(|o| o.session.as_str()).collect();
    assert_eq!(failed, vec!["bot1"]);
    assert!(!report.all_failed());

    let mut ready: Vec<_> = seen.lock().await.iter().map(|(s, _)| s.clone()).collect();
    ready.sort();
    assert_eq!(ready, vec!["bot0", "bot2"]);
}

#[tokio::test]
async fn test_slow_session_does_not_block_ready_of_others() {
    ensure_init();

    let seen = Arc::new(Mutex::new(Vec::new()));
    let sessions = vec![
        recording_session("bot0", "t0", Arc::clone(&seen)),
        recording_session("bot1", "t1", Arc::clone(&seen)),
    ];
    let gateway = three_bots().with_connect_delay("t0", Duration::from_millis(50));

    launch(sessions, Arc::new(gateway), FailureMode::Isolated).await.unwrap();

    let order: Vec<_> = seen.lock().await.iter().map(|(s, _)| s.clone()).collect();
    assert_eq!(order, vec!["bot1", "bot0"]);
}

#[tokio::test]
async fn test_all_or_nothing_aborts_on_first_failure() {
    ensure_init();

    let seen = Arc::new(Mutex::new(Vec::new()));
    let sessions = vec![
        recording_session("bot0", "t0", Arc::clone(&seen)),
        recording_session("bot1", "bad", Arc::clone(&seen)),
    ];
    let gateway = three_bots().rejecting("bad").hold_open();

    let result = tokio::time::timeout(
        Duration::from_secs(5),
        launch(sessions, Arc::new(gateway), FailureMode::AllOrNothing),
    )
    .await
    .expect("launch should stop once a session fails");

    assert!(matches!(result, Err(BotError::Auth(_))));
}

#[tokio::test]
async fn test_launch_without_sessions_is_an_error() {
    let result = launch(Vec::new(), Arc::new(ScriptedGateway::new()), FailureMode::Isolated).await;
    assert!(matches!(result, Err(BotError::Config(_))));
}

#[tokio::test]
async fn test_each_session_answers_its_own_ping() {
    ensure_init();

    let ping = |channel: &str| {
        GatewayEvent::Message(Message::in_guild("g1", channel, User::new("7", "dev"), "/ping"))
    };
    let gateway = Arc::new(
        three_bots()
            .with_script("bot0", vec![ping("c0")])
            .with_script("bot1", vec![ping("c1")]),
    );

    let seen = Arc::new(Mutex::new(Vec::new()));
    let sessions = vec![
        recording_session("bot0", "t0", Arc::clone(&seen)),
        recording_session("bot1", "t1", Arc::clone(&seen)),
    ];
    let shared: Arc<dyn Gateway> = gateway.clone();
    launch(sessions, shared, FailureMode::Isolated).await.unwrap();

    let bot0 = gateway.outbox("bot0").await.sent().await;
    let bot1 = gateway.outbox("bot1").await.sent().await;
    assert_eq!(bot0.len(), 1);
    assert_eq!(bot0[0].channel_id, "c0");
    assert_eq!(bot0[0].text, "pong");
    assert_eq!(bot1.len(), 1);
    assert_eq!(bot1[0].channel_id, "c1");
}

#[tokio::test]
async fn test_monitor_tracks_session_lifecycle() {
    ensure_init();

    let monitor = SessionMonitor::new();
    let build = |name: &str, token: &str| {
        standard_session(identity(name, token), &multi_options())
            .unwrap()
            .with_monitor(monitor.clone())
            .build()
            .unwrap()
    };
    let sessions = vec![build("bot0", "t0"), build("bot1", "bad")];

    launch(sessions, Arc::new(three_bots().rejecting("bad")), FailureMode::Isolated)
        .await
        .unwrap();

    assert_eq!(monitor.state("bot0").await, Some(SessionState::Stopped));
    assert_eq!(monitor.state("bot1").await, Some(SessionState::Failed));

    let status = monitor.snapshot().await;
    assert_eq!(status[0].bot_name.as_deref(), Some("alpha"));
    assert!(status[1].last_error.is_some());
}

#[tokio::test]
async fn test_all_or_nothing_marks_aborted_sessions_stopped() {
    ensure_init();

    let monitor = SessionMonitor::new();
    let build = |name: &str, token: &str| {
        standard_session(identity(name, token), &multi_options())
            .unwrap()
            .with_monitor(monitor.clone())
            .build()
            .unwrap()
    };
    let sessions = vec![build("bot0", "t0"), build("bot1", "bad")];
    let gateway = three_bots()
        .rejecting("bad")
        .with_connect_delay("bad", Duration::from_millis(20))
        .hold_open();

    let result = tokio::time::timeout(
        Duration::from_secs(5),
        launch(sessions, Arc::new(gateway), FailureMode::AllOrNothing),
    )
    .await
    .expect("launch should stop once a session fails");
    assert!(result.is_err());

    assert_eq!(monitor.state("bot0").await, Some(SessionState::Stopped));
    assert_eq!(monitor.state("bot1").await, Some(SessionState::Failed));
    assert!(monitor.outbox(Some("bot0")).await.is_err());
}
