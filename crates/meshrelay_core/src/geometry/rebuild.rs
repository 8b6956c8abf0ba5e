//! In-place geometry buffer rebuild.
//!
//! Runs once per cycle on the host thread:
//!
//! ```text
//! decode cells/points
//!   └── per triangle: face normal → claim corners → append snapshot
//! visit attributes
//!   ├── VertexPosition: rewrite positions (+ claimed normals)
//!   └── Index:          rewrite u32 triples (skipped if no cells)
//! ```

use meshrelay_shared::{PositionSnapshot, Vec3, SNAPSHOT_SCALE, SNAPSHOT_VALUES_PER_TRIANGLE};

use super::normals::NormalTable;
use super::target::{AttributeRole, GeometryAttribute, GeometryTarget};
use crate::codec::{
    decode_points, decode_triangles, index_to_u32, truncate_index, write_index_triple,
    VertexRecord, INDEX_RECORD_BYTES,
};

/// Face normal of the triangle `(v1, v2, v3)`.
///
/// `n = (v3 - v2) × (v1 - v2)`, unnormalized. The edge order fixes the
/// sign the renderer's shading expects.
#[inline]
#[must_use]
pub fn face_normal(v1: Vec3, v2: Vec3, v3: Vec3) -> Vec3 {
    (v3 - v2).cross(v1 - v2)
}

/// What one rebuild did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RebuildReport {
    /// Triangles decoded from the cell block.
    pub faces_decoded: usize,
    /// Triangles skipped for a corner outside the point block.
    pub faces_skipped: usize,
    /// Vertices claimed by some triangle.
    pub normals_claimed: usize,
    /// Vertex records rewritten (summed over position attributes).
    pub vertices_written: usize,
    /// Index triangles rewritten (summed over index attributes).
    pub index_triangles_written: usize,
    /// Position attributes processed.
    pub vertex_attributes: usize,
    /// Index attributes processed.
    pub index_attributes: usize,
}

/// Rewrites a `GeometryTarget` from the producer's raw blocks.
///
/// Holds the normal table and the resolved face list between calls so
/// their allocations are reused; their contents never are.
#[derive(Debug, Clone)]
pub struct GeometryBufferRebuilder {
    /// First-claim normals for the current cycle.
    normals: NormalTable,
    /// Triangles whose corners all resolved this cycle.
    faces: Vec<[usize; 3]>,
    /// Snapshot scale factor.
    scale: f32,
    /// Report of the last rebuild.
    last_report: RebuildReport,
}

impl GeometryBufferRebuilder {
    /// Creates a rebuilder with the standard ×1000 snapshot scale.
    #[must_use]
    pub fn new() -> Self {
        Self::with_scale(SNAPSHOT_SCALE)
    }

    /// Creates a rebuilder with a custom snapshot scale.
    #[must_use]
    pub fn with_scale(scale: f32) -> Self {
        Self {
            normals: NormalTable::default(),
            faces: Vec::new(),
            scale,
            last_report: RebuildReport::default(),
        }
    }

    /// Rewrites `target` in place from `cells` and `points`.
    ///
    /// Returns the position snapshot if the target exposed at least one
    /// vertex-position attribute, `None` otherwise. The snapshot may be
    /// empty (no triangles this cycle).
    pub fn rebuild(
        &mut self,
        target: &mut dyn GeometryTarget,
        cells: &[u8],
        points: &[u8],
    ) -> Option<PositionSnapshot> {
        let positions = decode_points(points);
        let triangles = decode_triangles(cells);
        target.prepare(positions.len(), triangles.len());

        let mut report = RebuildReport {
            faces_decoded: triangles.len(),
            ..RebuildReport::default()
        };

        let snapshot = self.resolve_faces(&triangles, &positions, &mut report);

        let normals = &self.normals;
        let mut vertex_pass_ran = false;
        target.for_each_attribute(&mut |attribute| match attribute.role() {
            AttributeRole::VertexPosition => {
                report.vertices_written += write_vertices(attribute, &positions, normals);
                report.vertex_attributes += 1;
                vertex_pass_ran = true;
                attribute.commit();
            }
            AttributeRole::Index => {
                if triangles.is_empty() {
                    return;
                }
                report.index_triangles_written += write_indices(attribute, &triangles);
                report.index_attributes += 1;
                attribute.commit();
            }
            AttributeRole::Other => {}
        });

        tracing::debug!(
            faces = report.faces_decoded,
            skipped = report.faces_skipped,
            vertices = report.vertices_written,
            indices = report.index_triangles_written,
            "geometry rebuilt"
        );
        self.last_report = report;

        vertex_pass_ran.then_some(snapshot)
    }

    /// Computes normals and the snapshot for every resolvable triangle.
    fn resolve_faces(
        &mut self,
        triangles: &[[f32; 3]],
        positions: &[Vec3],
        report: &mut RebuildReport,
    ) -> PositionSnapshot {
        self.normals.reset(positions.len());
        self.faces.clear();

        for raw in triangles {
            match resolve_corners(*raw, positions.len()) {
                Some(corners) => self.faces.push(corners),
                None => report.faces_skipped += 1,
            }
        }
        if report.faces_skipped > 0 {
            tracing::trace!(skipped = report.faces_skipped, "triangles reference missing vertices");
        }

        let mut snapshot = Vec::with_capacity(self.faces.len() * SNAPSHOT_VALUES_PER_TRIANGLE);
        for corners in &self.faces {
            let [v1, v2, v3] = corners.map(|i| positions[i]);
            let normal = face_normal(v1, v2, v3);

            for (&vertex, position) in corners.iter().zip([v1, v2, v3]) {
                self.normals.claim(vertex, normal);
                snapshot.extend_from_slice(&position.scaled_trunc(self.scale));
            }
        }
        report.normals_claimed = self.normals.claimed_count();
        snapshot
    }

    /// Normals claimed by the last rebuild.
    #[must_use]
    pub const fn normals(&self) -> &NormalTable {
        &self.normals
    }

    /// Report of the last rebuild.
    #[must_use]
    pub const fn last_report(&self) -> RebuildReport {
        self.last_report
    }

    /// Snapshot scale factor.
    #[must_use]
    pub const fn scale(&self) -> f32 {
        self.scale
    }
}

impl Default for GeometryBufferRebuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Truncates a raw triple to vertex indices, all below `vertex_count`.
fn resolve_corners(raw: [f32; 3], vertex_count: usize) -> Option<[usize; 3]> {
    let mut corners = [0usize; 3];
    for (dst, value) in corners.iter_mut().zip(raw) {
        let index = truncate_index(value)?;
        if index >= vertex_count {
            return None;
        }
        *dst = index;
    }
    Some(corners)
}

/// Rewrites interleaved records; unclaimed normals keep their old bytes.
fn write_vertices<A: GeometryAttribute + ?Sized>(
    attribute: &mut A,
    positions: &[Vec3],
    normals: &NormalTable,
) -> usize {
    let count = attribute.count();
    let mut written = 0;
    for (vertex, slot) in attribute
        .data_mut()
        .chunks_exact_mut(VertexRecord::SIZE)
        .take(count)
        .enumerate()
    {
        let Some(&position) = positions.get(vertex) else {
            break;
        };
        VertexRecord::write_position(slot, position);
        if let Some(normal) = normals.get(vertex) {
            VertexRecord::write_normal(slot, normal);
        }
        written += 1;
    }
    written
}

/// Overwrites leading index triples; stops at the shorter side.
fn write_indices<A: GeometryAttribute + ?Sized>(attribute: &mut A, triangles: &[[f32; 3]]) -> usize {
    let mut written = 0;
    for (slot, raw) in attribute
        .data_mut()
        .chunks_exact_mut(INDEX_RECORD_BYTES)
        .zip(triangles)
    {
        write_index_triple(slot, raw.map(index_to_u32));
        written += 1;
    }
    written
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::target::{BufferAttribute, MeshBuffers};

    fn floats(values: &[f32]) -> Vec<u8> {
        values.iter().flat_map(|v| v.to_le_bytes()).collect()
    }

    #[test]
    fn test_single_triangle_end_to_end() {
        let cells = floats(&[0.0, 1.0, 2.0]);
        let points = floats(&[0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0]);
        let mut mesh = MeshBuffers::with_capacity(3, 1).unwrap();

        let mut rebuilder = GeometryBufferRebuilder::new();
        let snapshot = rebuilder.rebuild(&mut mesh, &cells, &points).unwrap();

        assert_eq!(snapshot, vec![0, 0, 0, 1000, 0, 0, 0, 1000, 0]);

        let expected = face_normal(
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(0.0, 1.0, 0.0),
        );
        assert_eq!(expected, Vec3::Z);

        let records = mesh.vertex_records();
        for record in &records {
            assert_eq!(record.normal, [0.0, 0.0, 1.0]);
        }
        assert_eq!(records[1].position, [1.0, 0.0, 0.0]);
        assert_eq!(mesh.triangles(), vec![[0, 1, 2]]);
    }

    #[test]
    fn test_shared_vertex_keeps_first_normal() {
        // Two triangles sharing vertices 1 and 2 with different normals
        let cells = floats(&[0.0, 1.0, 2.0, 1.0, 3.0, 2.0]);
        let points = floats(&[
            0.0, 0.0, 0.0, //
            1.0, 0.0, 0.0, //
            0.0, 1.0, 0.0, //
            1.0, 1.0, 1.0, //
        ]);
        let mut mesh = MeshBuffers::with_capacity(4, 2).unwrap();

        let mut rebuilder = GeometryBufferRebuilder::new();
        rebuilder.rebuild(&mut mesh, &cells, &points).unwrap();

        let first = face_normal(
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(0.0, 1.0, 0.0),
        );
        let second = face_normal(
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(1.0, 1.0, 1.0),
            Vec3::new(0.0, 1.0, 0.0),
        );
        assert_ne!(first, second);

        let records = mesh.vertex_records();
        assert_eq!(records[1].normal, first.to_array());
        assert_eq!(records[2].normal, first.to_array());
        // Vertex 3 is only touched by the second triangle
        assert_eq!(records[3].normal, second.to_array());
        assert_eq!(rebuilder.last_report().normals_claimed, 4);
    }

    #[test]
    fn test_empty_cells_keep_index_buffer_and_normals() {
        let mut mesh = MeshBuffers::with_capacity(2, 1).unwrap();
        mesh.for_each_attribute(&mut |a| a.data_mut().fill(0x5A));
        let before = mesh.clone();

        let points = floats(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
        let mut rebuilder = GeometryBufferRebuilder::new();
        let snapshot = rebuilder.rebuild(&mut mesh, &[], &points).unwrap();

        assert!(snapshot.is_empty());
        assert_eq!(
            mesh.attribute(AttributeRole::Index).unwrap().data(),
            before.attribute(AttributeRole::Index).unwrap().data()
        );

        let records = mesh.vertex_records();
        let old = before.vertex_records();
        assert_eq!(records[0].position, [1.0, 2.0, 3.0]);
        assert_eq!(records[1].position, [4.0, 5.0, 6.0]);
        assert_eq!(records[0].normal.map(f32::to_bits), old[0].normal.map(f32::to_bits));
        assert_eq!(rebuilder.normals().claimed_count(), 0);
    }

    #[test]
    fn test_short_index_buffer_is_never_overrun() {
        let cells = floats(&[0.0, 1.0, 2.0, 2.0, 1.0, 0.0, 1.0, 1.0, 1.0]);
        let points = floats(&[0.0; 9]);

        let mut mesh = MeshBuffers::new();
        mesh.push(BufferAttribute::vertex_positions(3).unwrap());
        // Room for one triangle plus 5 stray bytes
        mesh.push(BufferAttribute::new("index", AttributeRole::Index, 3, vec![0xEE; 17]).unwrap());

        let mut rebuilder = GeometryBufferRebuilder::new();
        rebuilder.rebuild(&mut mesh, &cells, &points);

        let data = mesh.attribute(AttributeRole::Index).unwrap().data();
        assert_eq!(data.len(), 17);
        assert_eq!(&data[..12], &[0, 0, 0, 0, 1, 0, 0, 0, 2, 0, 0, 0]);
        assert!(data[12..].iter().all(|b| *b == 0xEE));
        assert_eq!(rebuilder.last_report().index_triangles_written, 1);
    }

    #[test]
    fn test_index_floats_truncate() {
        let cells = floats(&[0.9, 1.5, 2.9999]);
        let points = floats(&[0.0; 9]);
        let mut mesh = MeshBuffers::with_capacity(3, 1).unwrap();

        GeometryBufferRebuilder::new().rebuild(&mut mesh, &cells, &points);

        assert_eq!(mesh.triangles(), vec![[0, 1, 2]]);
    }

    #[test]
    fn test_out_of_range_triangle_is_skipped() {
        let cells = floats(&[0.0, 1.0, 7.0, 0.0, 1.0, 2.0]);
        let points = floats(&[0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0]);
        let mut mesh = MeshBuffers::with_capacity(3, 2).unwrap();

        let mut rebuilder = GeometryBufferRebuilder::new();
        let snapshot = rebuilder.rebuild(&mut mesh, &cells, &points).unwrap();

        assert_eq!(snapshot.len(), 9);
        assert_eq!(rebuilder.last_report().faces_skipped, 1);
        // Index buffer still mirrors the producer verbatim
        assert_eq!(mesh.triangles(), vec![[0, 1, 7], [0, 1, 2]]);
    }

    #[test]
    fn test_vertex_buffer_shorter_than_points() {
        let points = floats(&[1.0, 1.0, 1.0, 2.0, 2.0, 2.0, 3.0, 3.0, 3.0]);
        let mut mesh = MeshBuffers::with_capacity(2, 0).unwrap();

        let mut rebuilder = GeometryBufferRebuilder::new();
        rebuilder.rebuild(&mut mesh, &[], &points);

        assert_eq!(rebuilder.last_report().vertices_written, 2);
        assert_eq!(mesh.vertex_records().len(), 2);
    }

    #[test]
    fn test_no_position_attribute_means_no_snapshot() {
        let cells = floats(&[0.0, 1.0, 2.0]);
        let points = floats(&[0.0; 9]);
        let mut mesh = MeshBuffers::new();
        mesh.push(BufferAttribute::indices(1).unwrap());

        let mut rebuilder = GeometryBufferRebuilder::new();
        assert!(rebuilder.rebuild(&mut mesh, &cells, &points).is_none());
        // Index pass still ran
        assert_eq!(mesh.triangles(), vec![[0, 1, 2]]);
    }

    #[test]
    fn test_growable_target_takes_whole_frame() {
        let cells = floats(&[0.0, 1.0, 2.0]);
        let points = floats(&[0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0]);
        let mut mesh = MeshBuffers::growable();

        let snapshot = GeometryBufferRebuilder::new().rebuild(&mut mesh, &cells, &points).unwrap();

        assert_eq!(snapshot.len(), 9);
        assert_eq!(mesh.vertex_records().len(), 3);
        assert_eq!(mesh.triangles(), vec![[0, 1, 2]]);
    }

    #[test]
    fn test_commit_is_called_per_touched_attribute() {
        let cells = floats(&[0.0, 1.0, 2.0]);
        let points = floats(&[0.0; 9]);
        let mut mesh = MeshBuffers::with_capacity(3, 1).unwrap();

        let mut rebuilder = GeometryBufferRebuilder::new();
        rebuilder.rebuild(&mut mesh, &cells, &points);
        rebuilder.rebuild(&mut mesh, &[], &points);

        assert_eq!(mesh.attribute(AttributeRole::VertexPosition).unwrap().generation(), 2);
        assert_eq!(mesh.attribute(AttributeRole::Index).unwrap().generation(), 1);
    }
}
