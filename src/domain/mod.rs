//! Domain layer: runner entities, lifecycle events, and the registry.
//!
//! This module contains the supervisor's core model: the runner entity
//! with its lifecycle state machine, the per-runner broadcast event
//! stream, and the registry that owns the name → runner mapping.

pub mod runner_entry;
pub mod runner_event;
pub mod runner_registry;

pub use runner_entry::{RunnerEntry, RunnerState, RunnerSummary};
pub use runner_event::RunnerEvent;
pub use runner_registry::RunnerRegistry;
