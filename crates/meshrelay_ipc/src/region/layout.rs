//! Segment layout parsing.
//!
//! Pure and bounds-checked; runs on the bytes copied out under the lock.

use meshrelay_shared::constants::LENGTH_PREFIX_BYTES;

use crate::error::{Block, RegionError, RegionResult};

/// The two blocks copied out of one segment read.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RegionFrame {
    /// Triangle block: 3 × f32 vertex indices per triangle.
    pub cells: Vec<u8>,
    /// Point block: 3 × f32 coordinates per vertex.
    pub points: Vec<u8>,
}

impl RegionFrame {
    /// A frame with both blocks empty ("no update").
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            cells: Vec::new(),
            points: Vec::new(),
        }
    }

    /// Both blocks empty.
    #[must_use]
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty() && self.points.is_empty()
    }

    /// Total payload bytes (without prefixes).
    #[must_use]
    #[inline]
    pub fn byte_len(&self) -> usize {
        self.cells.len() + self.points.len()
    }
}

/// Parses `[i32 cellLen][cells][i32 pointLen][points]` out of `segment`.
///
/// Trailing bytes after the point block are ignored (the segment is usually
/// larger than its content).
///
/// # Errors
///
/// [`RegionError::NegativeLength`] for a negative prefix and
/// [`RegionError::OutOfBounds`] when a prefix or block runs past the end.
pub fn parse_frame(segment: &[u8]) -> RegionResult<RegionFrame> {
    let (cells, next) = read_block(segment, 0, Block::Cells)?;
    let (points, _) = read_block(segment, next, Block::Points)?;
    Ok(RegionFrame {
        cells: cells.to_vec(),
        points: points.to_vec(),
    })
}

/// Reads one length-prefixed block at `offset`, returning it and the offset
/// just past it.
fn read_block(segment: &[u8], offset: usize, block: Block) -> RegionResult<(&[u8], usize)> {
    let size = segment.len();
    let prefix = segment
        .get(offset..offset + LENGTH_PREFIX_BYTES)
        .ok_or(RegionError::OutOfBounds {
            block,
            offset,
            length: LENGTH_PREFIX_BYTES,
            size,
        })?;

    let mut raw = [0u8; LENGTH_PREFIX_BYTES];
    raw.copy_from_slice(prefix);
    let length = i32::from_le_bytes(raw);
    let length = usize::try_from(length).map_err(|_| RegionError::NegativeLength { block, length })?;

    let start = offset + LENGTH_PREFIX_BYTES;
    let data = start
        .checked_add(length)
        .and_then(|end| segment.get(start..end))
        .ok_or(RegionError::OutOfBounds {
            block,
            offset: start,
            length,
            size,
        })?;
    Ok((data, start + length))
}

/// Serializes blocks in segment layout (the producer's side of the
/// contract). Used to build fixtures.
#[must_use]
pub fn encode_frame(cells: &[u8], points: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(2 * LENGTH_PREFIX_BYTES + cells.len() + points.len());
    for block in [cells, points] {
        let len = i32::try_from(block.len()).unwrap_or(i32::MAX);
        out.extend_from_slice(&len.to_le_bytes());
        out.extend_from_slice(block);
    }
    out
}
