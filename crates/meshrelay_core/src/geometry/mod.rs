//! # Geometry Sync
//!
//! The renderer-facing half of the relay.
//!
//! The interop layer provides:
//! 1. `GeometryTarget` / `GeometryAttribute` - the renderer's buffers, by role
//! 2. `NormalTable` - per-cycle, first-claim vertex normals
//! 3. `GeometryBufferRebuilder` - rewrites the buffers in place and emits
//!    the position snapshot

mod normals;
mod rebuild;
mod target;

pub use normals::NormalTable;
pub use rebuild::{face_normal, GeometryBufferRebuilder, RebuildReport};
pub use target::{
    AttributeRole, BufferAttribute, GeometryAttribute, GeometryTarget, MeshBuffers, INDEX_NAME,
    VERTEX_POSITION_NAME,
};
