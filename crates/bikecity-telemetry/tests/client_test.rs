use std::time::Duration;

use bikecity_config::TelemetryConfig;
use bikecity_telemetry::{
    ConnectionState, SpeedFeed, SpeedServer, SpeedServerHandle, TelemetryClient,
    TelemetrySession, probe,
};
use tokio::net::TcpListener;
use tokio::sync::watch;

const WAIT: Duration = Duration::from_secs(5);

async fn start_server(feed: SpeedFeed) -> SpeedServerHandle {
    SpeedServer::bind("127.0.0.1:0", feed, Duration::from_millis(20))
        .await
        .unwrap()
        .start()
        .unwrap()
}

/// URL of a local port with nothing listening.
async fn refused_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("ws://{}", addr)
}

fn config(url: &str, reconnect_ms: u64) -> TelemetryConfig {
    TelemetryConfig {
        reconnect_interval: reconnect_ms,
        connect_timeout: 1000,
        ..TelemetryConfig::with_url(url)
    }
}

async fn wait_until(
    rx: &mut watch::Receiver<TelemetrySession>,
    pred: impl FnMut(&TelemetrySession) -> bool,
) -> TelemetrySession {
    tokio::time::timeout(WAIT, rx.wait_for(pred))
        .await
        .expect("timed out waiting for session state")
        .expect("telemetry task stopped")
        .clone()
}

#[tokio::test]
async fn receives_speed_and_scales_it() {
    let server = start_server(SpeedFeed::Constant(15.0)).await;
    let client = TelemetryClient::new(config(server.url(), 50));
    let mut rx = client.subscribe();

    assert_eq!(client.connection_state(), ConnectionState::Disconnected);
    client.connect().unwrap();

    let session = wait_until(&mut rx, |s| s.is_connected() && s.messages_received() > 0).await;
    assert_eq!(session.current_speed_kmh(), 15.0);
    assert_eq!(session.speed_input(), Some(50.0));
    assert_eq!(client.speed_display(), "15.0");
    assert!(session.last_timestamp().is_some());

    client.shutdown().await;
    server.stop().await;
}

#[tokio::test]
async fn fast_bike_is_clamped() {
    let server = start_server(SpeedFeed::Constant(45.0)).await;
    let client = TelemetryClient::new(config(server.url(), 50));
    let mut rx = client.subscribe();
    client.connect().unwrap();

    let session = wait_until(&mut rx, |s| s.messages_received() > 0).await;
    assert_eq!(session.speed_input(), Some(100.0));

    client.shutdown().await;
    server.stop().await;
}

#[tokio::test]
async fn gives_up_after_max_attempts() {
    let url = refused_url().await;
    let client = TelemetryClient::new(config(&url, 10));
    let mut rx = client.subscribe();
    client.connect().unwrap();

    let session = wait_until(&mut rx, |s| s.is_exhausted()).await;
    assert_eq!(session.reconnect_attempts(), 5);
    assert_eq!(session.state(), ConnectionState::Disconnected);
    assert_eq!(session.speed_input(), None);

    // No further attempts are scheduled.
    tokio::time::sleep(Duration::from_millis(100)).await;
    let later = client.session();
    assert_eq!(later.reconnect_attempts(), 5);
    assert_eq!(later.state(), ConnectionState::Disconnected);

    client.shutdown().await;
}

#[tokio::test]
async fn restart_after_giving_up_tries_again() {
    let url = refused_url().await;
    let client = TelemetryClient::new(TelemetryConfig {
        max_reconnect_attempts: 1,
        ..config(&url, 10)
    });
    let mut rx = client.subscribe();
    client.connect().unwrap();
    wait_until(&mut rx, |s| s.is_exhausted()).await;
    rx.borrow_and_update();

    client.restart().unwrap();
    tokio::time::timeout(WAIT, rx.changed()).await.unwrap().unwrap();
    let session = wait_until(&mut rx, |s| s.is_exhausted()).await;
    assert_eq!(session.reconnect_attempts(), 1);

    client.shutdown().await;
}

#[tokio::test]
async fn disconnect_cancels_pending_reconnect() {
    let url = refused_url().await;
    let client = TelemetryClient::new(config(&url, 200));
    let mut rx = client.subscribe();
    client.connect().unwrap();

    wait_until(&mut rx, |s| s.reconnect_attempts() == 1).await;
    client.disconnect().unwrap();

    tokio::time::sleep(Duration::from_millis(600)).await;
    let session = client.session();
    assert_eq!(session.reconnect_attempts(), 1);
    assert_eq!(session.state(), ConnectionState::Disconnected);
    assert!(!session.is_exhausted());

    client.shutdown().await;
}

#[tokio::test]
async fn manual_disconnect_while_connected() {
    let server = start_server(SpeedFeed::Constant(10.0)).await;
    let client = TelemetryClient::new(config(server.url(), 20));
    let mut rx = client.subscribe();
    client.connect().unwrap();
    wait_until(&mut rx, |s| s.messages_received() > 0).await;

    client.disconnect().unwrap();
    let session = wait_until(&mut rx, |s| !s.is_connected()).await;
    assert_eq!(session.reconnect_attempts(), 0);
    assert_eq!(client.speed_display(), "Disconnected");

    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(client.session().connections(), 1);

    client.shutdown().await;
    server.stop().await;
}

#[tokio::test]
async fn reconnects_when_server_closes() {
    let server = SpeedServer::bind(
        "127.0.0.1:0",
        SpeedFeed::Ramp { step: 2.5 },
        Duration::from_millis(10),
    )
    .await
    .unwrap()
    .close_after(3)
    .start()
    .unwrap();
    let client = TelemetryClient::new(config(server.url(), 20));
    let mut rx = client.subscribe();
    client.connect().unwrap();

    let session = wait_until(&mut rx, |s| s.connections() >= 2 && s.is_connected()).await;
    assert_eq!(session.reconnect_attempts(), 0);

    client.shutdown().await;
    server.stop().await;
}

#[tokio::test]
async fn probe_reads_ramp() {
    let server = start_server(SpeedFeed::Ramp { step: 2.5 }).await;

    let report = probe(server.url(), 4, Duration::from_secs(2)).await.unwrap();
    assert_eq!(report.speeds, vec![0.0, 2.5, 5.0, 7.5]);
    assert!(!report.timed_out);
    assert!(!report.closed);

    server.stop().await;
}

#[tokio::test]
async fn probe_reports_connect_failure() {
    let url = refused_url().await;
    assert!(probe(&url, 1, Duration::from_secs(2)).await.is_err());
}
