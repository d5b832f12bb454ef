//! # wsscreen
//!
//! WebSocket process supervisor: start named external commands, stream
//! their output to connected clients in real time, kill whole process
//! trees, and re-attach to commands that are already running.
//!
//! Command names and their launch descriptors come from a static YAML
//! configuration file; clients drive the supervisor over a single
//! long-lived WebSocket connection with plain-text commands and receive
//! JSON event frames back.
//!
//! ## Architecture
//!
//! ```text
//! Clients (WebSocket)
//!     │
//!     ├── Connection loop + dispatch (ws/connection)
//!     ├── SessionAttachment (ws/subscription)
//!     │
//!     ├── RunnerRegistry (domain/)
//!     │     └── per-runner broadcast event stream
//!     │
//!     └── OS processes (own process group each)
//! ```

pub mod app_state;
pub mod config;
pub mod domain;
pub mod error;
pub mod ws;
