//! Shared application state injected into the WebSocket handler.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::config::CommandSpec;
use crate::domain::RunnerRegistry;

/// Shared application state available to all handlers via Axum's
/// `State` extractor.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Process registry: the single source of truth for running commands.
    pub registry: Arc<RunnerRegistry>,
    /// Static command table loaded from the configuration file.
    pub commands: Arc<BTreeMap<String, CommandSpec>>,
}
