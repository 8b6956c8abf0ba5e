//! Renderer-side geometry contract.
//!
//! The renderer owns its buffers. It exposes them to the core as a set of
//! attributes, each tagged with a role, and the core rewrites the bytes in
//! place during one `rebuild` call.
//!
//! ```text
//! Core defines:              Renderer implements:
//! ┌───────────────────┐      ┌───────────────────┐
//! │ trait GeometryTarget │ ←─ │ impl GeometryTarget │
//! └───────────────────┘      └───────────────────┘
//! ```
//!
//! `MeshBuffers` is the owned implementation used by the headless driver
//! and by tests.

use crate::codec::{read_index_triple, VertexRecord, INDEX_RECORD_BYTES};
use crate::error::{GeometryError, GeometryResult};

/// Name the renderer gives its interleaved position+normal attribute.
pub const VERTEX_POSITION_NAME: &str = "vertexPosition";

/// Name of the index attribute in `MeshBuffers`.
pub const INDEX_NAME: &str = "index";

/// What an attribute's bytes mean to the rebuilder.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AttributeRole {
    /// Interleaved `[position.xyz, normal.xyz]` records, 24 bytes each.
    VertexPosition,
    /// Packed `u32` indices, three per triangle.
    Index,
    /// Anything else (colors, draw-indirect, ...). Never touched.
    Other,
}

impl AttributeRole {
    /// Bytes per element for this role (`None` for `Other`).
    #[must_use]
    pub const fn element_bytes(self) -> Option<usize> {
        match self {
            Self::VertexPosition => Some(VertexRecord::SIZE),
            Self::Index => Some(4),
            Self::Other => None,
        }
    }
}

/// One renderer buffer, as seen by the rebuilder.
pub trait GeometryAttribute {
    /// Role tag.
    fn role(&self) -> AttributeRole;

    /// Attribute name (for logs).
    fn name(&self) -> &str;

    /// Element count declared by the renderer.
    ///
    /// Vertices for `VertexPosition`, single indices for `Index`.
    fn count(&self) -> usize;

    /// Backing bytes.
    fn data(&self) -> &[u8];

    /// Backing bytes, writable.
    fn data_mut(&mut self) -> &mut [u8];

    /// Called after the rebuilder rewrote this attribute.
    ///
    /// Renderers re-upload the buffer here.
    fn commit(&mut self) {}
}

/// The renderer's geometry: an iterable set of attributes.
pub trait GeometryTarget {
    /// Visits every attribute once, in the renderer's order.
    fn for_each_attribute(&mut self, visit: &mut dyn FnMut(&mut dyn GeometryAttribute));

    /// Called before each rebuild with the incoming vertex and triangle
    /// counts. Renderer-owned buffers are fixed and ignore it.
    fn prepare(&mut self, _vertices: usize, _triangles: usize) {}
}

/// Owned attribute backed by a `Vec<u8>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BufferAttribute {
    /// Attribute name.
    name: String,
    /// Role tag.
    role: AttributeRole,
    /// Declared element count.
    count: usize,
    /// Backing bytes.
    data: Vec<u8>,
    /// Bumped on every commit.
    generation: u64,
}

impl BufferAttribute {
    /// Wraps existing bytes.
    ///
    /// # Errors
    ///
    /// `BufferTooSmall` if `data` cannot hold `count` elements of `role`,
    /// `CapacityOverflow` if `count` elements do not fit in `usize` bytes.
    pub fn new(
        name: impl Into<String>,
        role: AttributeRole,
        count: usize,
        data: Vec<u8>,
    ) -> GeometryResult<Self> {
        let name = name.into();
        if let Some(stride) = role.element_bytes() {
            let required = count
                .checked_mul(stride)
                .ok_or_else(|| GeometryError::CapacityOverflow { name: name.clone(), count })?;
            if data.len() < required {
                return Err(GeometryError::BufferTooSmall {
                    name,
                    count,
                    required,
                    actual: data.len(),
                });
            }
        }
        Ok(Self {
            name,
            role,
            count,
            data,
            generation: 0,
        })
    }

    /// Zeroed interleaved vertex attribute for `vertices` vertices.
    ///
    /// # Errors
    ///
    /// `CapacityOverflow` if the byte size overflows.
    pub fn vertex_positions(vertices: usize) -> GeometryResult<Self> {
        let bytes = Self::zeroed_bytes(VERTEX_POSITION_NAME, vertices, VertexRecord::SIZE)?;
        Self::new(VERTEX_POSITION_NAME, AttributeRole::VertexPosition, vertices, bytes)
    }

    /// Zeroed index attribute for `triangles` triangles.
    ///
    /// # Errors
    ///
    /// `CapacityOverflow` if the byte size overflows.
    pub fn indices(triangles: usize) -> GeometryResult<Self> {
        let bytes = Self::zeroed_bytes(INDEX_NAME, triangles, INDEX_RECORD_BYTES)?;
        let count = triangles * 3;
        Self::new(INDEX_NAME, AttributeRole::Index, count, bytes)
    }

    fn zeroed_bytes(name: &str, records: usize, stride: usize) -> GeometryResult<Vec<u8>> {
        let len = records.checked_mul(stride).ok_or_else(|| GeometryError::CapacityOverflow {
            name: name.to_string(),
            count: records,
        })?;
        Ok(vec![0u8; len])
    }

    /// Number of commits so far.
    #[inline]
    #[must_use]
    pub const fn generation(&self) -> u64 {
        self.generation
    }

    /// Consumes the attribute, returning its bytes.
    #[must_use]
    pub fn into_bytes(self) -> Vec<u8> {
        self.data
    }
}

impl GeometryAttribute for BufferAttribute {
    fn role(&self) -> AttributeRole {
        self.role
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn count(&self) -> usize {
        self.count
    }

    fn data(&self) -> &[u8] {
        &self.data
    }

    fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    fn commit(&mut self) {
        self.generation += 1;
    }
}

/// Owned mesh: a list of `BufferAttribute`s.
#[derive(Debug, Clone, Default)]
pub struct MeshBuffers {
    attributes: Vec<BufferAttribute>,
    /// Grow the standard attributes to fit each incoming frame.
    grow_to_fit: bool,
}

impl MeshBuffers {
    /// Creates a mesh with no attributes.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a zeroed mesh with one vertex and one index attribute.
    ///
    /// # Errors
    ///
    /// `CapacityOverflow` if either buffer size overflows.
    pub fn with_capacity(vertices: usize, triangles: usize) -> GeometryResult<Self> {
        Ok(Self {
            attributes: vec![
                BufferAttribute::vertex_positions(vertices)?,
                BufferAttribute::indices(triangles)?,
            ],
            grow_to_fit: false,
        })
    }

    /// Empty standard attributes that grow to the largest frame seen.
    #[must_use]
    pub fn growable() -> Self {
        let empty = |name: &str, role| BufferAttribute {
            name: name.to_string(),
            role,
            count: 0,
            data: Vec::new(),
            generation: 0,
        };
        Self {
            attributes: vec![
                empty(VERTEX_POSITION_NAME, AttributeRole::VertexPosition),
                empty(INDEX_NAME, AttributeRole::Index),
            ],
            grow_to_fit: true,
        }
    }

    /// Whether `prepare` grows the buffers.
    #[must_use]
    pub const fn grows_to_fit(&self) -> bool {
        self.grow_to_fit
    }

    /// Appends an attribute.
    pub fn push(&mut self, attribute: BufferAttribute) {
        self.attributes.push(attribute);
    }

    /// All attributes, in order.
    #[must_use]
    pub fn attributes(&self) -> &[BufferAttribute] {
        &self.attributes
    }

    /// First attribute with `role`.
    #[must_use]
    pub fn attribute(&self, role: AttributeRole) -> Option<&BufferAttribute> {
        self.attributes.iter().find(|a| a.role == role)
    }

    /// Vertex count of the first position attribute (0 if none).
    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.attribute(AttributeRole::VertexPosition).map_or(0, |a| a.count)
    }

    /// Triangle capacity of the first index attribute (0 if none).
    #[must_use]
    pub fn triangle_count(&self) -> usize {
        self.attribute(AttributeRole::Index)
            .map_or(0, |a| a.data.len() / INDEX_RECORD_BYTES)
    }

    /// Reallocates the standard attributes when the counts changed.
    ///
    /// Returns `true` if anything was reallocated. Reallocated buffers
    /// start zeroed; extra attributes pushed by the host are kept.
    ///
    /// # Errors
    ///
    /// `CapacityOverflow` if a buffer size overflows.
    pub fn resize_for(&mut self, vertices: usize, triangles: usize) -> GeometryResult<bool> {
        let mut changed = false;
        if self.vertex_count() != vertices || self.attribute(AttributeRole::VertexPosition).is_none() {
            self.replace(BufferAttribute::vertex_positions(vertices)?);
            changed = true;
        }
        if self.triangle_count() != triangles || self.attribute(AttributeRole::Index).is_none() {
            self.replace(BufferAttribute::indices(triangles)?);
            changed = true;
        }
        Ok(changed)
    }

    fn replace(&mut self, attribute: BufferAttribute) {
        match self.attributes.iter_mut().find(|a| a.role == attribute.role) {
            Some(slot) => *slot = attribute,
            None => self.attributes.push(attribute),
        }
    }

    /// Decodes the first position attribute's records.
    #[must_use]
    pub fn vertex_records(&self) -> Vec<VertexRecord> {
        self.attribute(AttributeRole::VertexPosition)
            .map(|a| {
                a.data
                    .chunks_exact(VertexRecord::SIZE)
                    .take(a.count)
                    .filter_map(VertexRecord::read)
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Decodes the first index attribute's triangles.
    #[must_use]
    pub fn triangles(&self) -> Vec<[u32; 3]> {
        self.attribute(AttributeRole::Index)
            .map(|a| a.data.chunks_exact(INDEX_RECORD_BYTES).map(read_index_triple).collect())
            .unwrap_or_default()
    }
}

impl GeometryTarget for MeshBuffers {
    fn for_each_attribute(&mut self, visit: &mut dyn FnMut(&mut dyn GeometryAttribute)) {
        for attribute in &mut self.attributes {
            visit(attribute);
        }
    }

    fn prepare(&mut self, vertices: usize, triangles: usize) {
        if !self.grow_to_fit {
            return;
        }
        let vertices = vertices.max(self.vertex_count());
        let triangles = triangles.max(self.triangle_count());
        match self.resize_for(vertices, triangles) {
            Ok(true) => tracing::debug!(vertices, triangles, "mesh buffers grown"),
            Ok(false) => {}
            Err(e) => tracing::warn!("cannot grow mesh buffers: {e}"),
        }
    }
}
