//! 连接生命周期与URL规范化的单元测试。
//! Unit tests for the connection lifecycle and URL canonicalization.

use super::lifecycle::{ConnectionLifecycle, ConnectionStatus};
use super::url::{canonicalize, try_canonicalize};
use crate::error::Error;
use std::sync::{Arc, Mutex};
use tokio::time::{Duration, sleep};

fn recording_observer(
    connection: &ConnectionLifecycle,
) -> Arc<Mutex<Vec<(ConnectionStatus, ConnectionStatus)>>> {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();
    connection.subscribe_status(Box::new(move |new, old| {
        sink.lock().unwrap().push((new, old));
    }));
    seen
}

fn statuses(seen: &Arc<Mutex<Vec<(ConnectionStatus, ConnectionStatus)>>>) -> Vec<ConnectionStatus> {
    seen.lock().unwrap().iter().map(|(new, _)| *new).collect()
}

#[test]
fn canonicalization_prepends_the_default_scheme() {
    assert_eq!(
        canonicalize("example.com", "https").unwrap(),
        "https://example.com"
    );
    assert_eq!(
        canonicalize("localhost:5000", "https").unwrap(),
        "https://localhost:5000"
    );
    assert_eq!(canonicalize("example.com", "ws").unwrap(), "ws://example.com");
}

#[test]
fn canonicalization_strips_query_and_fragment() {
    assert_eq!(
        canonicalize("http://host:8080/path?x=1", "https").unwrap(),
        "http://host:8080/path"
    );
    assert_eq!(
        canonicalize("http://host/path#frag", "https").unwrap(),
        "http://host/path"
    );
    // A query may appear before any path component.
    assert_eq!(canonicalize("host?x=1", "https").unwrap(), "https://host");
}

#[test]
fn canonicalization_rejects_input_without_a_host_or_scheme() {
    assert!(matches!(canonicalize("", "https"), Err(Error::InvalidUrl(_))));
    assert!(matches!(canonicalize("/path-only", "https"), Err(Error::InvalidUrl(_))));
    assert!(matches!(canonicalize("https://", "https"), Err(Error::InvalidUrl(_))));
    assert!(matches!(canonicalize("://host", "https"), Err(Error::InvalidUrl(_))));

    // The lenient revision reports the same failures as an absent result.
    assert_eq!(try_canonicalize("", "https"), None);
    assert_eq!(try_canonicalize("https://", "https"), None);
    assert_eq!(
        try_canonicalize("example.com", "https").as_deref(),
        Some("https://example.com")
    );
}

#[tokio::test(start_paused = true)]
async fn set_url_stores_the_canonical_form_and_keeps_the_status() {
    let connection = ConnectionLifecycle::new();
    connection.set_url("localhost:5000").unwrap();
    assert_eq!(connection.url().as_deref(), Some("https://localhost:5000"));
    assert_eq!(connection.status(), ConnectionStatus::Disconnected);

    let err = connection.set_url("https://").unwrap_err();
    assert!(matches!(err, Error::InvalidUrl(_)));
    // The previously stored URL survives a rejected update.
    assert_eq!(connection.url().as_deref(), Some("https://localhost:5000"));
}

#[tokio::test(start_paused = true)]
async fn connect_without_a_url_fails_and_reverts() {
    let connection = ConnectionLifecycle::new();
    let seen = recording_observer(&connection);

    let err = connection.connect().await.unwrap_err();
    assert!(matches!(err, Error::UrlNotSet));
    assert_eq!(connection.status(), ConnectionStatus::Disconnected);
    assert_eq!(
        statuses(&seen),
        vec![ConnectionStatus::Connecting, ConnectionStatus::Disconnected]
    );
}

#[tokio::test(start_paused = true)]
async fn connect_completes_the_simulated_handshake() {
    let connection = ConnectionLifecycle::new();
    connection.set_url("localhost:5000").unwrap();

    assert!(connection.connect().await.unwrap());
    assert_eq!(connection.status(), ConnectionStatus::Connected);
    assert!(connection.connected());
}

#[tokio::test(start_paused = true)]
async fn second_connect_is_rejected_while_the_first_is_in_flight() {
    let connection = ConnectionLifecycle::new();
    connection.set_url("localhost:5000").unwrap();

    let (first, second) = tokio::join!(connection.connect(), connection.connect());
    assert!(first.unwrap());
    assert!(matches!(second, Err(Error::ConnectInFlight)));
    assert_eq!(connection.status(), ConnectionStatus::Connected);
}

#[tokio::test(start_paused = true)]
async fn cancel_during_connecting_resolves_to_disconnected() {
    let connection = ConnectionLifecycle::new();
    connection.set_url("localhost:5000").unwrap();

    let task = {
        let connection = connection.clone();
        tokio::spawn(async move { connection.connect().await })
    };
    sleep(Duration::from_millis(10)).await;
    assert_eq!(connection.status(), ConnectionStatus::Connecting);

    connection.cancel();
    assert_eq!(connection.status(), ConnectionStatus::Disconnected);
    assert!(!task.await.unwrap().unwrap());
    assert_eq!(connection.status(), ConnectionStatus::Disconnected);

    // The cleared handle admits a fresh attempt.
    assert!(connection.connect().await.unwrap());
    assert_eq!(connection.status(), ConnectionStatus::Connected);
}

#[tokio::test(start_paused = true)]
async fn disconnect_is_a_noop_when_no_link_is_up() {
    let connection = ConnectionLifecycle::new();
    let seen = recording_observer(&connection);

    connection.disconnect().await.unwrap();
    assert_eq!(connection.status(), ConnectionStatus::Disconnected);
    assert!(statuses(&seen).is_empty());
}

#[tokio::test(start_paused = true)]
async fn disconnect_tears_the_link_down() {
    let connection = ConnectionLifecycle::new();
    connection.set_url("localhost:5000").unwrap();
    assert!(connection.connect().await.unwrap());

    let seen = recording_observer(&connection);
    connection.disconnect().await.unwrap();
    assert_eq!(connection.status(), ConnectionStatus::Disconnected);
    assert_eq!(
        statuses(&seen),
        vec![
            ConnectionStatus::Disconnecting,
            ConnectionStatus::Disconnected
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn second_disconnect_is_rejected_while_the_first_is_in_flight() {
    let connection = ConnectionLifecycle::new();
    connection.set_url("localhost:5000").unwrap();
    assert!(connection.connect().await.unwrap());

    let task = {
        let connection = connection.clone();
        tokio::spawn(async move { connection.disconnect().await })
    };
    sleep(Duration::from_millis(10)).await;
    assert_eq!(connection.status(), ConnectionStatus::Disconnecting);

    let err = connection.disconnect().await.unwrap_err();
    assert!(matches!(err, Error::DisconnectInFlight));

    sleep(Duration::from_secs(2)).await;
    task.await.unwrap().unwrap();
    assert_eq!(connection.status(), ConnectionStatus::Disconnected);
}

#[tokio::test(start_paused = true)]
async fn cancel_during_disconnecting_restores_connected() {
    let connection = ConnectionLifecycle::new();
    connection.set_url("localhost:5000").unwrap();
    assert!(connection.connect().await.unwrap());

    let task = {
        let connection = connection.clone();
        tokio::spawn(async move { connection.disconnect().await })
    };
    sleep(Duration::from_millis(10)).await;
    assert_eq!(connection.status(), ConnectionStatus::Disconnecting);

    // Cancelling a disconnect restores the connected link: the simulated
    // teardown never actually happened.
    connection.cancel();
    assert_eq!(connection.status(), ConnectionStatus::Connected);
    task.await.unwrap().unwrap();
    assert_eq!(connection.status(), ConnectionStatus::Connected);
}

#[tokio::test(start_paused = true)]
async fn cancel_with_nothing_in_flight_restores_the_prior_status() {
    let connection = ConnectionLifecycle::new();
    let seen = recording_observer(&connection);

    connection.cancel();
    assert_eq!(connection.status(), ConnectionStatus::Disconnected);
    assert_eq!(
        statuses(&seen),
        vec![
            ConnectionStatus::Cancelling,
            ConnectionStatus::Disconnected
        ]
    );

    // Same fallback from a connected link.
    connection.set_url("localhost:5000").unwrap();
    assert!(connection.connect().await.unwrap());
    connection.cancel();
    assert_eq!(connection.status(), ConnectionStatus::Connected);
}

#[tokio::test(start_paused = true)]
async fn unsubscribed_status_observer_is_not_invoked() {
    let connection = ConnectionLifecycle::new();
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();
    let id = connection.subscribe_status(Box::new(move |new, old| {
        sink.lock().unwrap().push((new, old));
    }));

    assert!(connection.unsubscribe_status(id));
    assert!(!connection.unsubscribe_status(id));

    connection.cancel();
    assert!(seen.lock().unwrap().is_empty());
}
