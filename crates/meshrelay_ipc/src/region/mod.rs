//! # Shared Region
//!
//! Attach/read/detach over the producer's segment.
//!
//! ## Cycle Contract
//!
//! ```text
//! read():
//!   attach if needed ──▶ lock ──▶ copy both blocks ──▶ unlock ──▶ RegionFrame
//!        │                                   │
//!        └── missing ──▶ empty frame         └── corrupt ──▶ empty frame (logged)
//! ```
//!
//! The lock is held only for the copy. Geometry work runs on the copy.

mod layout;
mod mapping;

use std::path::PathBuf;

use meshrelay_shared::{DEFAULT_SEGMENT_NAME, DEFAULT_SHM_DIR};
use serde::Deserialize;

use crate::error::RegionResult;
use mapping::SegmentMapping;

pub use layout::{encode_frame, parse_frame, RegionFrame};

// =============================================================================
// CONFIGURATION
// =============================================================================

/// Where to find the segment.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RegionConfig {
    /// Segment name shared with the producer.
    pub segment_name: String,
    /// Directory holding named segments.
    pub shm_dir: PathBuf,
}

impl Default for RegionConfig {
    fn default() -> Self {
        Self {
            segment_name: DEFAULT_SEGMENT_NAME.to_string(),
            shm_dir: PathBuf::from(DEFAULT_SHM_DIR),
        }
    }
}

impl RegionConfig {
    /// Sets the segment name.
    #[must_use]
    pub fn with_segment_name(mut self, name: impl Into<String>) -> Self {
        self.segment_name = name.into();
        self
    }

    /// Sets the segment directory.
    #[must_use]
    pub fn with_shm_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.shm_dir = dir.into();
        self
    }

    /// Full path of the segment file.
    #[must_use]
    pub fn path(&self) -> PathBuf {
        self.shm_dir.join(&self.segment_name)
    }
}

// =============================================================================
// STATISTICS
// =============================================================================

/// Reader counters.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RegionStats {
    /// Successful attaches.
    pub attaches: u64,
    /// Reads attempted.
    pub reads: u64,
    /// Reads that produced a non-empty frame.
    pub frames: u64,
    /// Reads while the segment did not exist.
    pub missing: u64,
    /// Reads rejected for malformed layout.
    pub corrupt: u64,
    /// Reads failed on IO (map or lock).
    pub io_errors: u64,
}

// =============================================================================
// FRAME SOURCE
// =============================================================================

/// Anything that can hand the relay one frame per cycle.
pub trait FrameSource {
    /// Returns the current frame; empty means "no update".
    fn read_frame(&mut self) -> RegionFrame;
}

// =============================================================================
// SHARED REGION
// =============================================================================

/// Read-only consumer of the producer's segment.
pub struct SharedRegion {
    config: RegionConfig,
    mapping: Option<SegmentMapping>,
    stats: RegionStats,
}

impl SharedRegion {
    /// Creates an unattached region handle.
    #[must_use]
    pub fn new(config: RegionConfig) -> Self {
        Self {
            config,
            mapping: None,
            stats: RegionStats::default(),
        }
    }

    /// Creates a handle and tries to attach once. A missing segment is
    /// fine; `read` retries.
    #[must_use]
    pub fn open(config: RegionConfig) -> Self {
        let mut region = Self::new(config);
        match region.attach() {
            Ok(()) => {}
            Err(e) if e.is_not_found() => {
                tracing::info!("segment {} not present yet, will retry", region.config.path().display());
            }
            Err(e) => tracing::warn!("initial attach failed: {e}"),
        }
        region
    }

    /// Maps the segment. No-op when already attached.
    ///
    /// # Errors
    ///
    /// `NotFound` if the producer has not created it, `Io` otherwise.
    pub fn attach(&mut self) -> RegionResult<()> {
        if self.mapping.is_some() {
            return Ok(());
        }
        let mapping = SegmentMapping::open(&self.config.path())?;
        tracing::info!(
            "attached to segment {} ({} bytes)",
            mapping.path().display(),
            mapping.len()
        );
        self.mapping = Some(mapping);
        self.stats.attaches += 1;
        Ok(())
    }

    /// Unmaps the segment. Safe to call repeatedly.
    pub fn detach(&mut self) {
        if let Some(mapping) = self.mapping.take() {
            tracing::info!("detached from segment {}", mapping.path().display());
        }
    }

    /// Whether a mapping is held.
    #[must_use]
    #[inline]
    pub fn is_attached(&self) -> bool {
        self.mapping.is_some()
    }

    /// Reader configuration.
    #[must_use]
    pub fn config(&self) -> &RegionConfig {
        &self.config
    }

    /// Counter snapshot.
    #[must_use]
    pub fn stats(&self) -> RegionStats {
        self.stats
    }

    /// Copies the current frame out, attaching first if needed and
    /// remapping when the segment's size has changed since attach.
    ///
    /// # Errors
    ///
    /// Any attach, lock or layout error.
    pub fn try_read(&mut self) -> RegionResult<RegionFrame> {
        // Mapped before the producer finished sizing it.
        if self.mapping.as_ref().is_some_and(SegmentMapping::is_stale) {
            tracing::debug!("segment size changed, remapping");
            self.detach();
        }
        self.attach()?;
        let Some(mapping) = self.mapping.as_ref() else {
            return Ok(RegionFrame::empty());
        };
        mapping.with_locked(parse_frame)?
    }

    /// Copies the current frame out. Every failure is an empty frame.
    pub fn read(&mut self) -> RegionFrame {
        self.stats.reads += 1;
        match self.try_read() {
            Ok(frame) => {
                if !frame.is_empty() {
                    self.stats.frames += 1;
                }
                frame
            }
            Err(e) if e.is_not_found() => {
                self.stats.missing += 1;
                tracing::trace!("{e}");
                RegionFrame::empty()
            }
            Err(e) if e.is_corrupt() => {
                self.stats.corrupt += 1;
                tracing::warn!("discarding malformed segment: {e}");
                RegionFrame::empty()
            }
            Err(e) => {
                self.stats.io_errors += 1;
                tracing::warn!("segment read failed: {e}");
                RegionFrame::empty()
            }
        }
    }
}

impl FrameSource for SharedRegion {
    fn read_frame(&mut self) -> RegionFrame {
        self.read()
    }
}

impl Drop for SharedRegion {
    fn drop(&mut self) {
        self.detach();
    }
}
