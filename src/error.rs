//! Supervisor error types.
//!
//! [`ScreenError`] is the central error type for the supervisor. Every
//! per-action failure is caught at the WebSocket adapter boundary and
//! converted into an outbound `error` (or `command_error`) frame scoped
//! to the requesting connection; no variant is fatal to the service.
//! Display strings double as the wire-level failure messages.

/// Server-side error enum for all recoverable per-action failures.
#[derive(Debug, thiserror::Error)]
pub enum ScreenError {
    /// A start was requested for a name whose runner is currently running.
    #[error("Already running.")]
    AlreadyRunning,

    /// An attach was requested for a name that is absent, exited, or killed.
    #[error("Command: {0} is not running.")]
    NotRunning(String),

    /// An action referenced a name not present in the configured command table.
    #[error("Unknown command: {0}.")]
    UnknownCommand(String),

    /// A `start`/`attach`/`kill` action arrived without a command name.
    #[error("Please specify a script to start.")]
    MissingName,

    /// The OS failed to create the process (bad executable, permissions).
    ///
    /// Reported to the client as a `command_error` frame; the runner never
    /// reaches the running state and no registry entry is created.
    #[error("Failed to start {name}: {source}")]
    Spawn {
        /// Name of the command that failed to spawn.
        name: String,
        /// Underlying OS error.
        #[source]
        source: std::io::Error,
    },
}

impl ScreenError {
    /// Returns `true` for spawn failures, which are reported on the wire
    /// as `command_error` rather than a generic `error`.
    #[must_use]
    pub const fn is_spawn_failure(&self) -> bool {
        matches!(self, Self::Spawn { .. })
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn display_matches_wire_messages() {
        assert_eq!(ScreenError::AlreadyRunning.to_string(), "Already running.");
        assert_eq!(
            ScreenError::NotRunning("build".to_string()).to_string(),
            "Command: build is not running."
        );
        assert_eq!(
            ScreenError::UnknownCommand("deploy".to_string()).to_string(),
            "Unknown command: deploy."
        );
        assert_eq!(
            ScreenError::MissingName.to_string(),
            "Please specify a script to start."
        );
    }

    #[test]
    fn spawn_failure_is_flagged() {
        let err = ScreenError::Spawn {
            name: "build".to_string(),
            source: std::io::Error::from(std::io::ErrorKind::NotFound),
        };
        assert!(err.is_spawn_failure());
        assert!(!ScreenError::AlreadyRunning.is_spawn_failure());
    }
}
