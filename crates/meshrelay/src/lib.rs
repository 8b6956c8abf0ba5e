//! # MESHRELAY
//!
//! Host-side mesh sync: pull the producer's mesh out of shared memory,
//! rewrite the renderer's buffers in place, push positions to the remote
//! GUI endpoint.
//!
//! ## Architecture
//!
//! ```text
//! ┌────────────┐   ┌──────────────┐   ┌───────────────────────┐   ┌────────────────┐
//! │ PollLoop   │──▶│ SharedRegion │──▶│ GeometryBufferRebuilder│──▶│ RemoteNotifier │
//! │ (15 Hz)    │   │ (lock+copy)  │   │ (normals, snapshot)   │   │ (WebSocket)    │
//! └────────────┘   └──────────────┘   └───────────┬───────────┘   └────────────────┘
//!   or sync_once()                                │
//!                                                 ▼
//!                                       renderer GeometryTarget
//! ```
//!
//! ## Example
//!
//! ```rust,ignore
//! use meshrelay::{MeshRelay, RelayConfig};
//! use meshrelay_core::MeshBuffers;
//! use meshrelay_ipc::SharedRegion;
//! use meshrelay_networking::RemoteNotifier;
//!
//! let config = RelayConfig::default();
//! let region = SharedRegion::open(config.region.clone());
//! let notifier = RemoteNotifier::connect(config.remote.clone())?;
//! let mut relay = MeshRelay::new(region, notifier, MeshBuffers::growable());
//!
//! relay.toggle_streaming();
//! loop {
//!     relay.pump();
//! }
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod config;
pub mod poll;
pub mod relay;
pub mod telemetry;

pub use config::{ConfigError, ConfigResult, PollConfig, RelayConfig};
pub use poll::{PollLoop, PollStats};
pub use relay::{CycleOutcome, MeshRelay, RelayStats};
