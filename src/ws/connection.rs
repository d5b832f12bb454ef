//! WebSocket connection loop and command dispatch.
//!
//! Runs the read/write loop for a single client connection: inbound
//! frames carry plain-text commands (`<action> [args...]`), outbound
//! frames carry the attached runner's events and action results. Every
//! per-action failure turns into a single `error`/`command_error` frame
//! for this connection; the loop itself only ends when the transport
//! closes.

use axum::extract::ws::{Message, WebSocket};
use futures_util::{SinkExt, StreamExt};

use super::messages::Outbound;
use super::subscription::SessionAttachment;
use crate::app_state::AppState;
use crate::error::ScreenError;

/// One turn of the connection loop.
enum Step {
    /// A text command arrived from the client.
    Inbound(String),
    /// An event from the attached runner is ready to forward.
    Deliver(Outbound),
    /// Nothing to do (ping frames, stale stream closed).
    Idle,
    /// The transport is gone.
    Closed,
}

/// Runs the read/write loop for a single WebSocket connection.
///
/// The session starts detached; `start` and `attach` commands subscribe
/// it to one runner at a time. The subscription is dropped when the
/// connection closes, so disconnected clients never leak listeners
/// against runners that outlive them.
pub async fn run_connection(socket: WebSocket, state: AppState) {
    let (mut ws_tx, mut ws_rx) = socket.split();
    let mut session = SessionAttachment::new();

    loop {
        let step = tokio::select! {
            msg = ws_rx.next() => match msg {
                Some(Ok(Message::Text(text))) => Step::Inbound(text.to_string()),
                Some(Ok(Message::Close(_))) | Some(Err(_)) | None => Step::Closed,
                _ => Step::Idle,
            },
            event = session.next_event() => match event {
                Some(event) => Step::Deliver(Outbound::from_event(event)),
                None => Step::Idle,
            },
        };

        match step {
            Step::Inbound(text) => {
                if let Some(reply) = dispatch(&text, &state, &mut session).await
                    && ws_tx.send(Message::text(reply.to_json())).await.is_err()
                {
                    break;
                }
            }
            Step::Deliver(frame) => {
                if ws_tx.send(Message::text(frame.to_json())).await.is_err() {
                    break;
                }
            }
            Step::Idle => {}
            Step::Closed => break,
        }
    }

    session.detach();
    tracing::debug!("ws connection closed");
}

/// Parses and executes one inbound command, returning the frame to send
/// back, if any. Successful `start`/`attach`/`kill`/`d` actions are
/// silent; output flows through the runner's event stream instead.
/// Unrecognized actions are ignored.
async fn dispatch(
    text: &str,
    state: &AppState,
    session: &mut SessionAttachment,
) -> Option<Outbound> {
    let mut tokens = text.split_whitespace();
    let action = tokens.next()?;
    let args: Vec<&str> = tokens.collect();

    let result = match action {
        "start" => start_runner(state, &args, session).await,
        "attach" => match named(state, &args) {
            Ok(name) => session.try_attach(&state.registry, name).await,
            Err(error) => Err(error),
        },
        "kill" => match named(state, &args) {
            Ok(name) => {
                state.registry.kill(name).await;
                Ok(())
            }
            Err(error) => Err(error),
        },
        "d" => {
            session.detach();
            Ok(())
        }
        "ps" => return Some(Outbound::Ps(state.registry.list().await)),
        _ => return None,
    };

    match result {
        Ok(()) => None,
        Err(error) => Some(Outbound::from_error(&error)),
    }
}

/// Validates the first argument against the configured command table.
fn named<'a>(state: &AppState, args: &[&'a str]) -> Result<&'a str, ScreenError> {
    let Some(name) = args.first().copied() else {
        return Err(ScreenError::MissingName);
    };
    if state.commands.contains_key(name) {
        Ok(name)
    } else {
        Err(ScreenError::UnknownCommand(name.to_string()))
    }
}

/// Starts the named command with any client-supplied extra arguments and
/// attaches the session to its stream from the first chunk on.
async fn start_runner(
    state: &AppState,
    args: &[&str],
    session: &mut SessionAttachment,
) -> Result<(), ScreenError> {
    let Some(name) = args.first().copied() else {
        return Err(ScreenError::MissingName);
    };
    let Some(spec) = state.commands.get(name) else {
        return Err(ScreenError::UnknownCommand(name.to_string()));
    };
    let extra: Vec<String> = args
        .get(1..)
        .unwrap_or_default()
        .iter()
        .map(|arg| (*arg).to_string())
        .collect();

    let rx = state.registry.start(name, spec, &extra).await?;
    session.attach(name, rx);
    Ok(())
}
