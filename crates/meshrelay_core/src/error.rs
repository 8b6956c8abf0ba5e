//! # Geometry Error Types
//!
//! Errors raised when a host hands the core a buffer that cannot describe
//! the geometry it claims to.

use thiserror::Error;

/// Errors that can occur when wrapping renderer buffers.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GeometryError {
    /// Backing bytes are shorter than `count` records.
    #[error("attribute `{name}` holds {actual} bytes, {count} records need {required}")]
    BufferTooSmall {
        /// Attribute name.
        name: String,
        /// Declared element count.
        count: usize,
        /// Bytes needed for `count` records.
        required: usize,
        /// Bytes actually supplied.
        actual: usize,
    },

    /// Record count does not fit in memory.
    #[error("attribute `{name}` with {count} records overflows the address space")]
    CapacityOverflow {
        /// Attribute name.
        name: String,
        /// Requested element count.
        count: usize,
    },
}

/// Result type for geometry operations.
pub type GeometryResult<T> = Result<T, GeometryError>;
