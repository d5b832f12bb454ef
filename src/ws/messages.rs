//! Outbound wire format.
//!
//! Every server → client frame is one JSON object of the shape
//! `{"type": <kind>, "message": <payload>}`. The adjacently tagged enum
//! produces that envelope by construction.

use serde::Serialize;

use crate::domain::{RunnerEvent, RunnerSummary};
use crate::error::ScreenError;

/// One outbound frame.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", content = "message", rename_all = "snake_case")]
pub enum Outbound {
    /// Raw stdout text chunk from the attached runner.
    Stdout(String),

    /// Raw stderr text chunk from the attached runner.
    Stderr(String),

    /// The attached runner terminated.
    Exit(ExitNotice),

    /// The OS failed to spawn the requested process.
    CommandError(String),

    /// Human-readable failure message from a rejected action.
    Error(String),

    /// Snapshot of all known runners, in name order.
    Ps(Vec<RunnerSummary>),
}

/// Payload of an `exit` frame.
#[derive(Debug, Clone, Serialize)]
pub struct ExitNotice {
    /// Name of the runner that terminated.
    pub name: String,
    /// Whether termination followed a confirmed kill request.
    pub killed: bool,
    /// Exit code, `null` when the process died to a signal.
    #[serde(rename = "exitCode")]
    pub exit_code: Option<i32>,
}

impl Outbound {
    /// Maps a runner event onto its outbound frame.
    #[must_use]
    pub fn from_event(event: RunnerEvent) -> Self {
        match event {
            RunnerEvent::Stdout(chunk) => Self::Stdout(chunk),
            RunnerEvent::Stderr(chunk) => Self::Stderr(chunk),
            RunnerEvent::Exit {
                name,
                killed,
                exit_code,
            } => Self::Exit(ExitNotice {
                name,
                killed,
                exit_code,
            }),
        }
    }

    /// Maps a rejected action onto its outbound frame. Spawn failures go
    /// out as `command_error`, everything else as a generic `error`.
    #[must_use]
    pub fn from_error(error: &ScreenError) -> Self {
        if error.is_spawn_failure() {
            Self::CommandError(error.to_string())
        } else {
            Self::Error(error.to_string())
        }
    }

    /// Serializes this frame to its JSON wire form.
    #[must_use]
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }
}
