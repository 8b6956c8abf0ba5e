//! # MESHRELAY IPC
//!
//! Read-only consumer of the producer's named shared segment.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────┐  writes under lock  ┌──────────────────────────────┐
//! │  Producer       │ ──────────────────▶ │ /dev/shm/MateFacePointsMemory │
//! │  (external)     │                     └──────────────┬───────────────┘
//! └─────────────────┘                                    │ lock, copy, unlock
//!                                                        ▼
//!                                               ┌─────────────────┐
//!                                               │  SharedRegion   │
//!                                               │  → RegionFrame  │
//!                                               └─────────────────┘
//! ```
//!
//! ## Segment Layout
//!
//! ```text
//! [i32 cellLen][cellLen bytes][i32 pointLen][pointLen bytes]
//! ```
//!
//! Little-endian, no padding. The segment lock is an exclusive advisory
//! lock on the segment file; the producer takes the same lock while
//! writing.

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod error;
pub mod region;

pub use error::{Block, RegionError, RegionResult};
pub use region::{encode_frame, parse_frame, FrameSource, RegionConfig, RegionFrame, RegionStats, SharedRegion};
