//! Runner entity: one supervised process and its lifecycle state.

use serde::Serialize;
use tokio::sync::broadcast;

use super::RunnerEvent;
use crate::config::CommandSpec;

/// Lifecycle state of a runner.
///
/// Transitions: `Running → Exited` when the process terminates on its
/// own, `Running → Killed` once a kill signal is confirmed delivered.
/// A runner that exited naturally before its kill confirmation arrived
/// stays `Exited`: the confirmation is ignored (the race is inherent;
/// see [`super::RunnerRegistry::kill`]).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunnerState {
    /// The OS process is alive (or not yet reaped).
    Running,
    /// The process terminated on its own with the given exit code.
    Exited(Option<i32>),
    /// A kill signal was confirmed delivered. The exit code is filled in
    /// once the process is reaped (`None` until then, and usually `None`
    /// after: SIGKILL leaves no code).
    Killed(Option<i32>),
}

impl RunnerState {
    /// Returns `true` while the process is considered alive.
    #[must_use]
    pub const fn is_running(&self) -> bool {
        matches!(self, Self::Running)
    }
}

/// One entry in the registry: a named process under supervision.
///
/// The `Child` handle itself is owned exclusively by the reaper task
/// spawned at start time; the entry keeps only the pid (needed for the
/// process-group kill) and the externally visible state. Late callbacks
/// from a replaced incarnation hold their own `Arc` of the old entry and
/// can never touch the new one.
#[derive(Debug)]
pub struct RunnerEntry {
    /// Stable runner name (registry key, chosen by the caller).
    pub name: String,

    /// Launch descriptor captured at start time (immutable).
    pub spec: CommandSpec,

    /// Pid of the spawned process, which is also its process group id.
    pub pid: Option<u32>,

    /// Current lifecycle state.
    pub state: RunnerState,

    /// Broadcast source for this runner's output and terminal events.
    pub events: broadcast::Sender<RunnerEvent>,
}

impl RunnerEntry {
    /// Creates a new entry in the `Running` state.
    #[must_use]
    pub fn new(
        name: String,
        spec: CommandSpec,
        pid: Option<u32>,
        events: broadcast::Sender<RunnerEvent>,
    ) -> Self {
        Self {
            name,
            spec,
            pid,
            state: RunnerState::Running,
            events,
        }
    }

    /// Returns a [`RunnerSummary`] snapshot of this entry.
    #[must_use]
    pub fn summary(&self) -> RunnerSummary {
        let (exit_code, killed) = match self.state {
            RunnerState::Running => (None, false),
            RunnerState::Exited(code) => (code, false),
            RunnerState::Killed(code) => (code, true),
        };
        RunnerSummary {
            name: self.name.clone(),
            exit_code,
            killed,
        }
    }
}

/// Lightweight snapshot of one runner for `ps` listings.
#[derive(Debug, Clone, Serialize)]
pub struct RunnerSummary {
    /// Runner name.
    pub name: String,
    /// Last known exit code, `null` while running or after a signal death.
    #[serde(rename = "exitCode")]
    pub exit_code: Option<i32>,
    /// Whether the runner was killed on request.
    pub killed: bool,
}
