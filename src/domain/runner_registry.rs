//! Process registry: the single source of truth for running commands.
//!
//! [`RunnerRegistry`] stores every known runner in a `HashMap` where each
//! entry is individually protected by a [`tokio::sync::RwLock`]. Entries
//! survive process exit (for `ps` history) until a new start under the
//! same name replaces them. Replacement installs a fresh `Arc`, so late
//! callbacks from a previous incarnation (exit reaper, kill confirmation)
//! only ever touch the entry they were spawned for.

use std::collections::HashMap;
use std::process::Stdio;
use std::sync::Arc;

use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;
use tokio::sync::{RwLock, broadcast};
use tokio::task::JoinHandle;

use super::runner_entry::{RunnerEntry, RunnerState, RunnerSummary};
use super::runner_event::RunnerEvent;
use crate::config::CommandSpec;
use crate::error::ScreenError;

/// Size of the read buffer for each output pipe.
const PIPE_BUF_SIZE: usize = 4096;

/// Central store for all supervised processes.
///
/// # Concurrency
///
/// - The outer map lock is held only to look up or replace entries.
/// - Each runner's state is guarded by its own lock, so output pumping
///   and kill confirmation for different runners never contend.
/// - Writes to the same runner (kill confirmation vs. exit reaping) are
///   serialized by the per-entry lock.
#[derive(Debug)]
pub struct RunnerRegistry {
    runners: RwLock<HashMap<String, Arc<RwLock<RunnerEntry>>>>,
    event_capacity: usize,
}

impl RunnerRegistry {
    /// Creates an empty registry. `event_capacity` bounds each runner's
    /// broadcast channel; sessions lagging further than that drop old
    /// output chunks.
    #[must_use]
    pub fn new(event_capacity: usize) -> Self {
        Self {
            runners: RwLock::new(HashMap::new()),
            event_capacity,
        }
    }

    /// Spawns the named command and registers it as a running entry.
    ///
    /// The returned receiver is subscribed before any output is pumped,
    /// so a caller that attaches it to a session sees the runner's whole
    /// event stream from the first chunk to the terminal exit.
    ///
    /// The spawned process is placed in its own process group so that
    /// [`RunnerRegistry::kill`] can reach its entire process tree.
    ///
    /// # Errors
    ///
    /// - [`ScreenError::AlreadyRunning`] if an entry with this name exists
    ///   and its process has not terminated. The existing process is left
    ///   untouched.
    /// - [`ScreenError::Spawn`] if the OS fails to create the process; no
    ///   entry is created and no events are emitted.
    pub async fn start(
        &self,
        name: &str,
        spec: &CommandSpec,
        extra_args: &[String],
    ) -> Result<broadcast::Receiver<RunnerEvent>, ScreenError> {
        let mut map = self.runners.write().await;
        if let Some(existing) = map.get(name)
            && existing.read().await.state.is_running()
        {
            return Err(ScreenError::AlreadyRunning);
        }

        let mut command = Command::new(&spec.command);
        command
            .args(&spec.args)
            .args(extra_args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .process_group(0);
        if let Some(cwd) = &spec.options.cwd {
            command.current_dir(cwd);
        }
        command.envs(&spec.options.env);

        let mut child = command.spawn().map_err(|source| ScreenError::Spawn {
            name: name.to_string(),
            source,
        })?;
        let pid = child.id();

        let (events, _) = broadcast::channel(self.event_capacity);
        // Subscribe before the pumps start so no chunk can be lost.
        let receiver = events.subscribe();

        let stdout_pump = child
            .stdout
            .take()
            .map(|pipe| spawn_pipe_pump(pipe, events.clone(), RunnerEvent::Stdout));
        let stderr_pump = child
            .stderr
            .take()
            .map(|pipe| spawn_pipe_pump(pipe, events.clone(), RunnerEvent::Stderr));

        let entry = Arc::new(RwLock::new(RunnerEntry::new(
            name.to_string(),
            spec.clone(),
            pid,
            events,
        )));
        map.insert(name.to_string(), Arc::clone(&entry));
        drop(map);

        tracing::info!(name, ?pid, command = %spec.command, "process started");

        // Reaper: waits for termination, lets the pipes drain, then
        // records the final state and publishes the terminal event.
        let reaper_entry = Arc::clone(&entry);
        let reaper_name = name.to_string();
        tokio::spawn(async move {
            let status = child.wait().await;
            if let Some(pump) = stdout_pump {
                let _ = pump.await;
            }
            if let Some(pump) = stderr_pump {
                let _ = pump.await;
            }

            let code = match status {
                Ok(status) => status.code(),
                Err(error) => {
                    tracing::warn!(name = %reaper_name, %error, "failed to reap process");
                    None
                }
            };

            let mut guard = reaper_entry.write().await;
            let killed = matches!(guard.state, RunnerState::Killed(_));
            guard.state = if killed {
                RunnerState::Killed(code)
            } else {
                RunnerState::Exited(code)
            };
            tracing::info!(name = %guard.name, ?code, killed, "process terminated");
            let _ = guard.events.send(RunnerEvent::Exit {
                name: guard.name.clone(),
                killed,
                exit_code: code,
            });
        });

        Ok(receiver)
    }

    /// Requests termination of the named runner's process tree.
    ///
    /// Silent no-op when no such runner exists or it is not running.
    /// SIGKILL is delivered to the runner's process group from a spawned
    /// task; the transition to `Killed` happens only once the signal
    /// delivery is confirmed, never inside this call. A runner that exits
    /// naturally before the confirmation lands stays `Exited`; the late
    /// confirmation is ignored. Signal delivery failure is logged and not
    /// surfaced to clients.
    pub async fn kill(&self, name: &str) {
        let entry = {
            let map = self.runners.read().await;
            match map.get(name) {
                Some(entry) => Arc::clone(entry),
                None => return,
            }
        };

        let pid = {
            let guard = entry.read().await;
            if !guard.state.is_running() {
                return;
            }
            match guard.pid {
                Some(pid) => pid,
                None => return,
            }
        };

        let confirm_entry = Arc::clone(&entry);
        let confirm_name = name.to_string();
        tokio::spawn(async move {
            match signal_process_group(pid) {
                Ok(()) => {
                    let mut guard = confirm_entry.write().await;
                    if guard.state.is_running() {
                        guard.state = RunnerState::Killed(None);
                        tracing::info!(name = %guard.name, pid, "kill signal delivered");
                    }
                }
                Err(errno) => {
                    tracing::error!(name = %confirm_name, pid, %errno, "failed to deliver kill signal");
                }
            }
        });
    }

    /// Returns a name-ordered snapshot of every known runner, including
    /// exited and killed ones.
    pub async fn list(&self) -> Vec<RunnerSummary> {
        let map = self.runners.read().await;
        let mut summaries = Vec::with_capacity(map.len());
        for entry in map.values() {
            summaries.push(entry.read().await.summary());
        }
        drop(map);
        summaries.sort_by(|a, b| a.name.cmp(&b.name));
        summaries
    }

    /// Returns the current state of the named runner, if known.
    pub async fn state(&self, name: &str) -> Option<RunnerState> {
        let map = self.runners.read().await;
        let entry = map.get(name)?;
        Some(entry.read().await.state.clone())
    }

    /// Subscribes to the named runner's event stream.
    ///
    /// The receiver only sees events produced after this call.
    ///
    /// # Errors
    ///
    /// Returns [`ScreenError::NotRunning`] when the runner is absent,
    /// exited, or killed.
    pub async fn subscribe(
        &self,
        name: &str,
    ) -> Result<broadcast::Receiver<RunnerEvent>, ScreenError> {
        let map = self.runners.read().await;
        let Some(entry) = map.get(name) else {
            return Err(ScreenError::NotRunning(name.to_string()));
        };
        let guard = entry.read().await;
        if !guard.state.is_running() {
            return Err(ScreenError::NotRunning(name.to_string()));
        }
        Ok(guard.events.subscribe())
    }
}

/// Pumps one output pipe into the runner's broadcast channel, chunk by
/// chunk, until EOF. Chunks keep OS pipe order; UTF-8 is decoded lossily.
fn spawn_pipe_pump<R>(
    mut pipe: R,
    events: broadcast::Sender<RunnerEvent>,
    wrap: fn(String) -> RunnerEvent,
) -> JoinHandle<()>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut buf = vec![0u8; PIPE_BUF_SIZE];
        loop {
            match pipe.read(&mut buf).await {
                Ok(0) => break,
                Ok(n) => {
                    let Some(chunk) = buf.get(..n) else { break };
                    let _ = events.send(wrap(String::from_utf8_lossy(chunk).into_owned()));
                }
                Err(error) => {
                    tracing::debug!(%error, "output pipe read failed");
                    break;
                }
            }
        }
    })
}

/// Sends SIGKILL to the process group rooted at `pid`.
///
/// The group id equals the pid because every runner is spawned with
/// `process_group(0)`, so the signal reaches descendant processes too.
fn signal_process_group(pid: u32) -> Result<(), rustix::io::Errno> {
    let raw = i32::try_from(pid).map_err(|_| rustix::io::Errno::INVAL)?;
    let pgid = rustix::process::Pid::from_raw(raw).ok_or(rustix::io::Errno::SRCH)?;
    rustix::process::kill_process_group(pgid, rustix::process::Signal::KILL)
}
