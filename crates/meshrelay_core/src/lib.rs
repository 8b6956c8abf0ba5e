//! # MESHRELAY Core
//!
//! Turns the producer's raw triangle/vertex blocks into the renderer's
//! buffers, in place, every cycle.
//!
//! ## Pipeline
//!
//! ```text
//! cell bytes ──► decode_triangles ──┐
//!                                   ├──► face normals ──► NormalTable (first claim wins)
//! point bytes ──► decode_points ────┘            │
//!                                                ▼
//!                  ┌───────────────────────────────────────────────┐
//!                  │ GeometryTarget (owned by the renderer)        │
//!                  │  VertexPosition: [pos.xyz, normal.xyz] × N    │
//!                  │  Index:          [u32; 3] × F                 │
//!                  └───────────────────────────────────────────────┘
//!                                                │
//!                                                ▼
//!                                        PositionSnapshot
//! ```
//!
//! ## Rules
//!
//! 1. **Bounds first** - every record is checked against its buffer before
//!    it is touched; short buffers truncate the write, never overflow it.
//! 2. **One cycle, one table** - normals are never carried across cycles.
//! 3. **Borrow, don't own** - the renderer keeps its buffers; the rebuilder
//!    only holds them for the duration of one call.

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod codec;
pub mod error;
pub mod geometry;

pub use codec::{decode_points, decode_triangles, index_to_u32, truncate_index, VertexRecord};
pub use error::{GeometryError, GeometryResult};
pub use geometry::{
    face_normal, AttributeRole, BufferAttribute, GeometryAttribute, GeometryBufferRebuilder,
    GeometryTarget, MeshBuffers, NormalTable, RebuildReport,
};
pub use meshrelay_shared::{PositionSnapshot, Vec3};
