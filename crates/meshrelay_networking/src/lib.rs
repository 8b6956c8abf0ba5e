//! # MESHRELAY Networking
//!
//! Pushes position snapshots to the remote GUI endpoint over one WebSocket.
//!
//! ## Architecture
//!
//! ```text
//!   relay thread                          transport worker
//! ┌──────────────────┐  bounded channel ┌─────────────────────────┐
//! │ RemoteNotifier   │ ───────────────▶ │ WebSocket (tungstenite) │ ──▶ remote
//! │ .notify(snap)    │   Vec<u8> JSON   │ read w/ timeout → log   │ ◀── remote
//! └──────────────────┘                  └─────────────────────────┘
//!          ▲                                        │
//!          └──────── state / stats (shared) ────────┘
//! ```
//!
//! `notify` serializes and enqueues; it never touches the socket. A full
//! queue or a dead connection drops the snapshot and counts it.

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod error;
pub mod notifier;
mod transport;

pub use error::{NotifierError, NotifierResult};
pub use notifier::{FrameKind, Notifier, NotifierState, NotifierStats, RemoteConfig, RemoteNotifier};
