//! # MESHRELAY Shared
//!
//! Common types used by the segment reader, the geometry core and the
//! remote notifier.
//!
//! ## CRITICAL RULE
//!
//! This crate must NEVER open a file, a mapping or a socket.
//! If you need IO, put it in `meshrelay_ipc` or `meshrelay_networking`.

#![deny(missing_docs)]
#![deny(unsafe_code)]

pub mod constants;
pub mod math;
pub mod protocol;

pub use constants::{
    DEFAULT_SEGMENT_NAME, DEFAULT_SHM_DIR, POLL_INTERVAL_MS, POLL_RATE_HZ, REMOTE_URL,
    SNAPSHOT_SCALE, SNAPSHOT_VALUES_PER_TRIANGLE,
};
pub use math::Vec3;
pub use protocol::{PositionMessage, PositionSnapshot};
