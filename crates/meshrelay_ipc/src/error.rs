//! # Region Error Types
//!
//! All errors that can occur while attaching to or reading the segment.
//! None of them are fatal to a cycle; `SharedRegion::read` turns every one
//! into an empty frame.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// Which of the two blocks an error refers to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Block {
    /// Triangle index block.
    Cells,
    /// Vertex position block.
    Points,
}

impl fmt::Display for Block {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cells => f.write_str("cell"),
            Self::Points => f.write_str("point"),
        }
    }
}

/// Errors that can occur in the segment reader.
#[derive(Error, Debug)]
pub enum RegionError {
    /// The producer has not created the segment yet.
    #[error("segment {0} does not exist yet")]
    NotFound(PathBuf),

    /// A block's length prefix is negative.
    #[error("{block} block length {length} is negative")]
    NegativeLength {
        /// Offending block.
        block: Block,
        /// Length read from the prefix.
        length: i32,
    },

    /// A block (or its prefix) runs past the end of the segment.
    #[error("{block} block of {length} bytes at offset {offset} runs past the {size}-byte segment")]
    OutOfBounds {
        /// Offending block.
        block: Block,
        /// Byte offset of the block (or prefix).
        offset: usize,
        /// Bytes the block claims.
        length: usize,
        /// Mapped segment size.
        size: usize,
    },

    /// Underlying IO failure (open, map, lock).
    #[error("segment io: {0}")]
    Io(#[from] std::io::Error),
}

impl RegionError {
    /// Whether this error just means "producer not up yet".
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    /// Whether the segment content itself is malformed.
    #[must_use]
    pub const fn is_corrupt(&self) -> bool {
        matches!(self, Self::NegativeLength { .. } | Self::OutOfBounds { .. })
    }
}

/// Result type for region operations.
pub type RegionResult<T> = Result<T, RegionError>;
