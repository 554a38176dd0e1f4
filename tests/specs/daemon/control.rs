//! Control socket behavior against a real daemon state.

use gk_daemon::config::Config;
use gk_daemon::lifecycle::{self, DaemonState};
use gk_daemon::protocol::{encode, read_message, write_message, Request, Response};
use gk_daemon::server;
use tokio::net::UnixStream;

async fn start_daemon(dir: &tempfile::TempDir) -> DaemonState {
    let config = Config::for_root(dir.path()).unwrap();
    lifecycle::startup(&config).await.unwrap()
}

/// Connects over the real socket, sends one request, serves it, returns the reply
async fn request(daemon: &mut DaemonState, request: Request) -> Response {
    let socket = daemon.config.socket_path.clone();
    let client = tokio::spawn(async move {
        let stream = UnixStream::connect(&socket).await.unwrap();
        let (mut reader, mut writer) = stream.into_split();
        let bytes = encode(&request).unwrap();
        write_message(&mut writer, &bytes).await.unwrap();
        let reply = read_message(&mut reader).await.unwrap();
        serde_json::from_slice::<Response>(&reply).unwrap()
    });

    let (stream, _) = daemon.listener.accept().await.unwrap();
    server::handle_connection(daemon, stream).await.unwrap();
    client.await.unwrap()
}

#[tokio::test]
async fn ping_over_the_socket() {
    let dir = tempfile::tempdir().unwrap();
    let mut daemon = start_daemon(&dir).await;
    assert_eq!(request(&mut daemon, Request::Ping).await, Response::Pong);
}

#[tokio::test]
async fn enter_then_status_shows_an_open_window() {
    let dir = tempfile::tempdir().unwrap();
    let mut daemon = start_daemon(&dir).await;

    assert_eq!(
        request(&mut daemon, Request::Enter).await,
        Response::Entering
    );
    match request(&mut daemon, Request::Status).await {
        Response::Status {
            garage_mode_active, ..
        } => assert!(garage_mode_active),
        other => panic!("unexpected response: {other:?}"),
    }
}

#[tokio::test]
async fn cancel_then_status_shows_a_closed_window() {
    let dir = tempfile::tempdir().unwrap();
    let mut daemon = start_daemon(&dir).await;

    request(&mut daemon, Request::Enter).await;
    assert_eq!(
        request(&mut daemon, Request::Cancel).await,
        Response::Canceled
    );
    match request(&mut daemon, Request::Status).await {
        Response::Status {
            garage_mode_active, ..
        } => assert!(!garage_mode_active),
        other => panic!("unexpected response: {other:?}"),
    }
}

#[tokio::test]
async fn shutdown_request_flags_the_daemon() {
    let dir = tempfile::tempdir().unwrap();
    let mut daemon = start_daemon(&dir).await;

    assert_eq!(
        request(&mut daemon, Request::Shutdown).await,
        Response::ShuttingDown
    );
    assert!(daemon.shutdown_requested);

    daemon.shutdown().await;
    assert!(!daemon.config.socket_path.exists());
}

#[tokio::test]
async fn settings_file_overrides_the_wakeup_policy() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("garagekeeper.toml"),
        "wakeup_policy = [\"30m,2\"]\n",
    )
    .unwrap();

    let config = Config::for_root(dir.path()).unwrap();
    assert_eq!(config.settings.wakeup_policy, vec!["30m,2".to_string()]);

    // And the daemon starts with it
    let daemon = lifecycle::startup(&config).await.unwrap();
    drop(daemon);
}
