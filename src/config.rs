//! Supervisor configuration loaded from a YAML file.
//!
//! The configuration file is passed as the first CLI argument and holds
//! the listen port plus the static command table: a mapping from command
//! name to the executable, base arguments, and spawn options used when a
//! client asks to start that name. The table is immutable after startup;
//! the WebSocket layer only reads it.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

use serde::Deserialize;

/// Default listen port when the file does not set one.
const DEFAULT_PORT: u16 = 3000;

/// Default capacity of each runner's broadcast event channel.
const DEFAULT_EVENT_CAPACITY: usize = 1024;

/// Top-level supervisor configuration.
///
/// Loaded once at startup via [`ScreenConfig::from_file`].
#[derive(Debug, Clone, Deserialize)]
pub struct ScreenConfig {
    /// TCP port the WebSocket server listens on.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Command table: name → launch descriptor.
    pub scripts: BTreeMap<String, CommandSpec>,

    /// Capacity of each runner's broadcast event channel. Sessions that
    /// lag further than this behind a chatty process drop old chunks.
    #[serde(default = "default_event_capacity")]
    pub event_capacity: usize,
}

/// Launch descriptor for one named command.
#[derive(Debug, Clone, Deserialize)]
pub struct CommandSpec {
    /// Executable to spawn.
    pub command: String,

    /// Base arguments, always passed before any client-supplied extras.
    #[serde(default)]
    pub args: Vec<String>,

    /// Spawn options applied when the process is created.
    #[serde(default)]
    pub options: SpawnOptions,
}

/// Subset of spawn options the supervisor supports.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SpawnOptions {
    /// Working directory for the spawned process.
    pub cwd: Option<PathBuf>,

    /// Extra environment variables, merged over the inherited environment.
    #[serde(default)]
    pub env: HashMap<String, String>,
}

impl ScreenConfig {
    /// Loads and parses the configuration file at `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not valid YAML
    /// for this schema. Both are fatal at startup: the supervisor refuses
    /// to run without a validated command table.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, Box<dyn std::error::Error>> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        let config: Self = serde_yaml::from_str(&raw)?;
        Ok(config)
    }
}

const fn default_port() -> u16 {
    DEFAULT_PORT
}

const fn default_event_capacity() -> usize {
    DEFAULT_EVENT_CAPACITY
}
