//! Events emitted by a running command.
//!
//! Each runner owns a [`tokio::sync::broadcast`] channel carrying
//! [`RunnerEvent`]s. Output chunks flow as they arrive from the OS pipes,
//! in pipe order, and exactly one [`RunnerEvent::Exit`] closes the stream
//! for that runner's lifetime; it is always the last event delivered.

/// One event in the lifetime of a supervised process.
#[derive(Debug, Clone)]
pub enum RunnerEvent {
    /// A chunk of standard output, decoded lossily as UTF-8.
    Stdout(String),

    /// A chunk of standard error, decoded lossily as UTF-8.
    Stderr(String),

    /// Terminal event: the process was reaped.
    Exit {
        /// Name of the runner that terminated.
        name: String,
        /// Whether termination followed a confirmed kill request.
        killed: bool,
        /// Exit code, or `None` when the process died to a signal.
        exit_code: Option<i32>,
    },
}

impl RunnerEvent {
    /// Returns `true` for the terminal [`RunnerEvent::Exit`] variant.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Exit { .. })
    }
}
