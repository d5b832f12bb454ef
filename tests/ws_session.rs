//! End-to-end tests over a real WebSocket connection.
//!
//! Each test spins up the supervisor router on an ephemeral port with its
//! own registry and command table, then drives it with a tokio-tungstenite
//! client the way a real terminal client would.

#![allow(clippy::panic, clippy::indexing_slicing)]

use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};

use wsscreen::app_state::AppState;
use wsscreen::config::{CommandSpec, SpawnOptions};
use wsscreen::domain::RunnerRegistry;
use wsscreen::ws;

type Client = WebSocketStream<MaybeTlsStream<TcpStream>>;

fn sh(script: &str) -> CommandSpec {
    CommandSpec {
        command: "sh".to_string(),
        args: vec!["-c".to_string(), script.to_string()],
        options: SpawnOptions::default(),
    }
}

/// Starts a supervisor instance on an ephemeral port and returns its address.
async fn serve() -> SocketAddr {
    let mut scripts = BTreeMap::new();
    scripts.insert("echo".to_string(), sh("echo hello"));
    scripts.insert("sleeper".to_string(), sh("sleep 5"));
    scripts.insert(
        "ticker".to_string(),
        sh("while true; do echo tick; sleep 0.1; done"),
    );

    let state = AppState {
        registry: Arc::new(RunnerRegistry::new(1024)),
        commands: Arc::new(scripts),
    };
    let app = ws::build_router().with_state(state);

    let Ok(listener) = tokio::net::TcpListener::bind("127.0.0.1:0").await else {
        panic!("failed to bind test listener");
    };
    let Ok(addr) = listener.local_addr() else {
        panic!("failed to read listener address");
    };
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    addr
}

async fn connect(addr: SocketAddr) -> Client {
    let Ok((client, _)) = connect_async(format!("ws://{addr}/ws")).await else {
        panic!("failed to connect to test server");
    };
    client
}

async fn send(client: &mut Client, command: &str) {
    let Ok(()) = client.send(Message::text(command)).await else {
        panic!("failed to send command: {command}");
    };
}

/// Reads frames until the next text frame and parses it as JSON.
async fn recv_frame(client: &mut Client) -> serde_json::Value {
    loop {
        let Ok(Some(Ok(msg))) = timeout(Duration::from_secs(5), client.next()).await else {
            panic!("timed out waiting for a frame");
        };
        if let Message::Text(text) = msg {
            let Ok(value) = serde_json::from_str(&text) else {
                panic!("frame is not valid JSON: {text}");
            };
            return value;
        }
    }
}

/// Collects stdout chunks until the exit frame, returning the
/// concatenated output and the exit payload.
async fn drain_until_exit(client: &mut Client) -> (String, serde_json::Value) {
    let mut stdout = String::new();
    loop {
        let frame = recv_frame(client).await;
        match frame["type"].as_str() {
            Some("stdout") => {
                if let Some(chunk) = frame["message"].as_str() {
                    stdout.push_str(chunk);
                }
            }
            Some("stderr") => {}
            Some("exit") => return (stdout, frame["message"].clone()),
            other => panic!("unexpected frame type {other:?}"),
        }
    }
}

#[tokio::test]
async fn start_echo_streams_output_and_exit() {
    let addr = serve().await;
    let mut client = connect(addr).await;

    send(&mut client, "start echo").await;
    let (stdout, exit) = drain_until_exit(&mut client).await;

    assert_eq!(stdout, "hello\n");
    assert_eq!(exit["name"], "echo");
    assert_eq!(exit["killed"], false);
    assert_eq!(exit["exitCode"], 0);
}

#[tokio::test]
async fn kill_idle_name_is_silent_and_connection_survives() {
    let addr = serve().await;
    let mut client = connect(addr).await;

    // sleeper is configured but was never started: no frame at all.
    send(&mut client, "kill sleeper").await;

    // The very next frame must be the ps response, not an error.
    send(&mut client, "ps").await;
    let frame = recv_frame(&mut client).await;
    assert_eq!(frame["type"], "ps");
    assert_eq!(frame["message"], serde_json::json!([]));
}

#[tokio::test]
async fn rejected_actions_report_wire_errors() {
    let addr = serve().await;
    let mut client = connect(addr).await;

    send(&mut client, "start nope").await;
    let frame = recv_frame(&mut client).await;
    assert_eq!(frame["type"], "error");
    assert_eq!(frame["message"], "Unknown command: nope.");

    send(&mut client, "start").await;
    let frame = recv_frame(&mut client).await;
    assert_eq!(frame["type"], "error");
    assert_eq!(frame["message"], "Please specify a script to start.");

    send(&mut client, "attach sleeper").await;
    let frame = recv_frame(&mut client).await;
    assert_eq!(frame["type"], "error");
    assert_eq!(frame["message"], "Command: sleeper is not running.");
}

#[tokio::test]
async fn two_clients_observe_the_same_runner() {
    let addr = serve().await;
    let mut first = connect(addr).await;
    let mut second = connect(addr).await;

    send(&mut first, "start ticker").await;
    // Wait for output to prove the runner is up before the second attach.
    let frame = recv_frame(&mut first).await;
    assert_eq!(frame["type"], "stdout");

    send(&mut second, "attach ticker").await;
    let frame = recv_frame(&mut second).await;
    assert_eq!(frame["type"], "stdout");
    assert!(
        frame["message"]
            .as_str()
            .is_some_and(|chunk| chunk.contains("tick"))
    );

    send(&mut first, "kill ticker").await;
    let (_, exit_first) = drain_until_exit(&mut first).await;
    let (_, exit_second) = drain_until_exit(&mut second).await;

    for exit in [exit_first, exit_second] {
        assert_eq!(exit["name"], "ticker");
        assert_eq!(exit["killed"], true);
        assert_eq!(exit["exitCode"], serde_json::Value::Null);
    }
}

#[tokio::test]
async fn ps_reports_exit_and_kill_history() {
    let addr = serve().await;
    let mut client = connect(addr).await;

    send(&mut client, "start echo").await;
    let (_, exit) = drain_until_exit(&mut client).await;
    assert_eq!(exit["exitCode"], 0);

    send(&mut client, "start sleeper").await;
    send(&mut client, "kill sleeper").await;
    let (_, exit) = drain_until_exit(&mut client).await;
    assert_eq!(exit["killed"], true);

    send(&mut client, "ps").await;
    let frame = recv_frame(&mut client).await;
    assert_eq!(frame["type"], "ps");
    assert_eq!(
        frame["message"],
        serde_json::json!([
            { "name": "echo", "exitCode": 0, "killed": false },
            { "name": "sleeper", "exitCode": null, "killed": true },
        ])
    );
}
