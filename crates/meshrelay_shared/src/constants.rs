//! # Relay Constants
//!
//! Well-known names and rates shared with the producer process and the
//! remote endpoint.
//!
//! **CRITICAL:** The segment name and byte layout are a contract with the
//! producer. Changing them requires rebuilding both sides.

// =============================================================================
// SHARED SEGMENT
// =============================================================================

/// Name of the producer-owned shared segment.
pub const DEFAULT_SEGMENT_NAME: &str = "MateFacePointsMemory";

/// Directory holding named shared segments on Linux.
pub const DEFAULT_SHM_DIR: &str = "/dev/shm";

/// Size of each block's length prefix (`i32`, little-endian).
pub const LENGTH_PREFIX_BYTES: usize = 4;

// =============================================================================
// REMOTE ENDPOINT
// =============================================================================

/// Endpoint receiving position snapshots.
pub const REMOTE_URL: &str = "ws://localhost:8081/model/gui";

// =============================================================================
// STREAMING
// =============================================================================

/// Streaming rate (cycles per second).
pub const POLL_RATE_HZ: u32 = 15;

/// Streaming interval in milliseconds (`1000 / 15`, truncated).
pub const POLL_INTERVAL_MS: u64 = 1000 / POLL_RATE_HZ as u64;

/// Positions are multiplied by this before truncation to integers.
pub const SNAPSHOT_SCALE: f32 = 1000.0;

/// Snapshot integers per triangle (three corners, `x, y, z` each).
pub const SNAPSHOT_VALUES_PER_TRIANGLE: usize = 9;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_poll_interval_matches_rate() {
        assert_eq!(POLL_INTERVAL_MS, 66);
    }
}
