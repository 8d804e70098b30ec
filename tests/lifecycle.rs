//! 面向整个面板模型的端到端场景测试。
//! End-to-end scenario tests over the whole panel model.

use heron_panel::connection::ConnectionStatus;
use heron_panel::observable::{State, TimedStatefulValue};
use heron_panel::session::PanelSession;
use std::sync::{Arc, Mutex, Once};
use tokio::time::{Duration, sleep};

/// Helper to initialize tracing for tests.
fn init_tracing() {
    static TRACING_INIT: Once = Once::new();
    TRACING_INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_env_filter("debug")
            .with_test_writer()
            .init();
    });
}

#[tokio::test(start_paused = true)]
async fn full_connection_lifecycle() {
    init_tracing();
    let session = PanelSession::new().unwrap();
    let connection = session.connection.clone();

    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();
    connection.subscribe_status(Box::new(move |new, _| {
        sink.lock().unwrap().push(new);
    }));

    // The raw entry is reduced to the canonical scheme://host form.
    connection.set_url("localhost:5000").unwrap();
    assert_eq!(connection.url().as_deref(), Some("https://localhost:5000"));

    let task = {
        let connection = connection.clone();
        tokio::spawn(async move { connection.connect().await })
    };
    sleep(Duration::from_millis(10)).await;
    assert_eq!(connection.status(), ConnectionStatus::Connecting);

    sleep(Duration::from_secs(6)).await;
    assert!(task.await.unwrap().unwrap());
    assert_eq!(connection.status(), ConnectionStatus::Connected);

    let task = {
        let connection = connection.clone();
        tokio::spawn(async move { connection.disconnect().await })
    };
    sleep(Duration::from_millis(10)).await;
    assert_eq!(connection.status(), ConnectionStatus::Disconnecting);

    sleep(Duration::from_secs(2)).await;
    task.await.unwrap().unwrap();
    assert_eq!(connection.status(), ConnectionStatus::Disconnected);

    assert_eq!(
        *seen.lock().unwrap(),
        vec![
            ConnectionStatus::Connecting,
            ConnectionStatus::Connected,
            ConnectionStatus::Disconnecting,
            ConnectionStatus::Disconnected,
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn immediate_second_connect_does_not_disturb_the_first() {
    init_tracing();
    let session = PanelSession::new().unwrap();
    let connection = &session.connection;
    connection.set_url("localhost:5000").unwrap();

    // Two calls in immediate succession, neither awaited before the other
    // is issued: the second is rejected, the first resolves untouched.
    let (first, second) = tokio::join!(connection.connect(), connection.connect());
    assert!(first.unwrap());
    assert!(second.is_err());
    assert_eq!(connection.status(), ConnectionStatus::Connected);
}

#[tokio::test(start_paused = true)]
async fn cancelled_connect_leaves_a_reusable_session() {
    init_tracing();
    let session = PanelSession::new().unwrap();
    let connection = session.connection.clone();
    connection.set_url("localhost:5000").unwrap();

    let task = {
        let connection = connection.clone();
        tokio::spawn(async move { connection.connect().await })
    };
    sleep(Duration::from_millis(10)).await;
    connection.cancel();
    assert_eq!(connection.status(), ConnectionStatus::Disconnected);
    assert!(!task.await.unwrap().unwrap());

    // The session is immediately usable for another attempt.
    assert!(connection.connect().await.unwrap());
    assert_eq!(connection.status(), ConnectionStatus::Connected);
}

#[tokio::test(start_paused = true)]
async fn session_url_variable_validates_entries() {
    init_tracing();
    let mut session = PanelSession::new().unwrap();
    assert_eq!(session.server_url.get().map(String::as_str), Some("localhost:5000"));

    assert!(session.server_url.set("https://".to_string()).is_err());
    assert_eq!(session.server_url.get().map(String::as_str), Some("localhost:5000"));

    session.server_url.set("instrument.lab:8080".to_string()).unwrap();
    session
        .connection
        .set_url(session.server_url.get().map(String::as_str).unwrap_or_default())
        .unwrap();
    assert_eq!(
        session.connection.url().as_deref(),
        Some("https://instrument.lab:8080")
    );
}

#[tokio::test(start_paused = true)]
async fn freshness_indicator_scenario() {
    init_tracing();
    // A heartbeat reading trusted for 30 s, stale for another 10 s, then
    // expired until the next reading arrives.
    let heartbeat = TimedStatefulValue::new(
        0u64,
        Some(Duration::from_secs(30)),
        Some(Duration::from_secs(10)),
    );

    heartbeat.set(1u64).unwrap();
    assert_eq!(heartbeat.state(), State::Green);

    sleep(Duration::from_secs(25)).await;
    heartbeat.set(2u64).unwrap();

    sleep(Duration::from_secs(31)).await;
    assert_eq!(heartbeat.state(), State::Yellow);

    sleep(Duration::from_secs(10)).await;
    assert_eq!(heartbeat.state(), State::Red);

    heartbeat.set(3u64).unwrap();
    assert_eq!(heartbeat.state(), State::Green);
}
