//! Per-session attachment to one runner's event stream.
//!
//! Each WebSocket session holds at most one subscription at a time.
//! Attaching to a new runner replaces the previous subscription; dropping
//! the broadcast receiver is the unsubscribe, so no event can be
//! delivered after [`SessionAttachment::detach`] returns.

use tokio::sync::broadcast;

use crate::domain::{RunnerEvent, RunnerRegistry};
use crate::error::ScreenError;

/// The single optional subscription of one WebSocket session.
#[derive(Debug, Default)]
pub struct SessionAttachment {
    inner: Option<Attached>,
}

#[derive(Debug)]
struct Attached {
    name: String,
    rx: broadcast::Receiver<RunnerEvent>,
}

impl SessionAttachment {
    /// Creates a detached session attachment.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Name of the currently attached runner, if any.
    #[must_use]
    pub fn attached_name(&self) -> Option<&str> {
        self.inner.as_ref().map(|attached| attached.name.as_str())
    }

    /// Attaches the session to `name` using an already-subscribed
    /// receiver, replacing any previous subscription.
    ///
    /// Used by the `start` path, where the registry hands out a receiver
    /// subscribed before the first output chunk was pumped.
    pub fn attach(&mut self, name: &str, rx: broadcast::Receiver<RunnerEvent>) {
        self.inner = Some(Attached {
            name: name.to_string(),
            rx,
        });
    }

    /// Attaches the session to the named runner's live stream.
    ///
    /// On failure the existing attachment is left untouched.
    ///
    /// # Errors
    ///
    /// Returns [`ScreenError::NotRunning`] when the runner is absent,
    /// exited, or killed.
    pub async fn try_attach(
        &mut self,
        registry: &RunnerRegistry,
        name: &str,
    ) -> Result<(), ScreenError> {
        let rx = registry.subscribe(name).await?;
        self.attach(name, rx);
        Ok(())
    }

    /// Drops the current subscription, if any. Idempotent.
    pub fn detach(&mut self) {
        self.inner = None;
    }

    /// Resolves with the next event from the attached runner.
    ///
    /// Pends forever while detached. A lagged receiver logs and skips to
    /// the newest retained event. When the stream closes (the runner
    /// entry was replaced by a restart) the session silently detaches and
    /// `None` is returned.
    pub async fn next_event(&mut self) -> Option<RunnerEvent> {
        let Some(attached) = self.inner.as_mut() else {
            return std::future::pending().await;
        };

        loop {
            match attached.rx.recv().await {
                Ok(event) => return Some(event),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!(
                        name = %attached.name,
                        skipped,
                        "session lagged behind runner output"
                    );
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }

        self.inner = None;
        None
    }
}
