//! Fixed-width record codecs.
//!
//! Every block handled by the core is a sequence of 12-byte records
//! (three little-endian `f32` or `u32` values), or the renderer's 24-byte
//! interleaved vertex record, copied as a Pod value. Decoders walk `chunks_exact`, so a trailing
//! partial record is never read.

use bytemuck::{bytes_of, Pod, Zeroable};
use meshrelay_shared::Vec3;

/// Bytes per position record in the point block (`[f32; 3]`).
pub const POINT_RECORD_BYTES: usize = 12;

/// Bytes per triangle record in the cell block (`[f32; 3]` indices).
pub const TRIANGLE_RECORD_BYTES: usize = 12;

/// Bytes per triangle record in the renderer's index buffer (`[u32; 3]`).
pub const INDEX_RECORD_BYTES: usize = 12;

/// Interleaved vertex record of the renderer's position attribute, in the
/// host's byte order (the renderer hands it straight to the GPU).
///
/// ```text
/// offset  0: position.x  position.y  position.z
/// offset 12: normal.x    normal.y    normal.z
/// ```
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct VertexRecord {
    /// Position [x, y, z]
    pub position: [f32; 3],
    /// Normal [nx, ny, nz]
    pub normal: [f32; 3],
}

impl VertexRecord {
    /// Record stride in bytes.
    pub const SIZE: usize = std::mem::size_of::<Self>();

    /// Byte offset of the normal inside a record.
    pub const NORMAL_OFFSET: usize = 12;

    /// Decodes one record from a 24-byte slot.
    ///
    /// Returns `None` when the slot is shorter than a record.
    #[must_use]
    pub fn read(slot: &[u8]) -> Option<Self> {
        bytemuck::try_pod_read_unaligned(slot.get(..Self::SIZE)?).ok()
    }

    /// Overwrites the position half of a slot.
    pub fn write_position(slot: &mut [u8], position: Vec3) {
        if let Some(dst) = slot.get_mut(..Self::NORMAL_OFFSET) {
            dst.copy_from_slice(bytes_of(&position));
        }
    }

    /// Overwrites the normal half of a slot.
    pub fn write_normal(slot: &mut [u8], normal: Vec3) {
        if let Some(dst) = slot.get_mut(Self::NORMAL_OFFSET..Self::SIZE) {
            dst.copy_from_slice(bytes_of(&normal));
        }
    }
}

/// Decodes the point block into positions.
#[must_use]
pub fn decode_points(bytes: &[u8]) -> Vec<Vec3> {
    bytes
        .chunks_exact(POINT_RECORD_BYTES)
        .map(|chunk| Vec3::from_array(read_f32x3(chunk)))
        .collect()
}

/// Decodes the cell block into raw index triples.
///
/// Values stay floats here; the vertex pass and the index pass convert
/// them differently (checked vs. saturating).
#[must_use]
pub fn decode_triangles(bytes: &[u8]) -> Vec<[f32; 3]> {
    bytes.chunks_exact(TRIANGLE_RECORD_BYTES).map(read_f32x3).collect()
}

/// Truncates an index float toward zero.
///
/// `None` for NaN, infinities, negatives and values past `u32::MAX`.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
pub fn truncate_index(value: f32) -> Option<usize> {
    if !value.is_finite() {
        return None;
    }
    let whole = value.trunc();
    if whole < 0.0 || whole >= u32::MAX as f32 {
        return None;
    }
    Some(whole as usize)
}

/// Casts an index float to `u32` the way the index buffer expects it.
///
/// Truncates toward zero; negatives and NaN saturate to 0, huge values to
/// `u32::MAX`.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn index_to_u32(value: f32) -> u32 {
    value as u32
}

/// Writes one `[u32; 3]` triangle into a 12-byte slot.
pub fn write_index_triple(slot: &mut [u8], indices: [u32; 3]) {
    for (dst, index) in slot.chunks_exact_mut(4).zip(indices) {
        dst.copy_from_slice(&index.to_le_bytes());
    }
}

/// Reads one `[u32; 3]` triangle from a 12-byte slot.
#[must_use]
pub fn read_index_triple(slot: &[u8]) -> [u32; 3] {
    let mut out = [0u32; 3];
    for (dst, raw) in out.iter_mut().zip(slot.chunks_exact(4)) {
        *dst = u32::from_le_bytes([raw[0], raw[1], raw[2], raw[3]]);
    }
    out
}

fn read_f32x3(chunk: &[u8]) -> [f32; 3] {
    let mut out = [0.0f32; 3];
    for (dst, raw) in out.iter_mut().zip(chunk.chunks_exact(4)) {
        *dst = f32::from_le_bytes([raw[0], raw[1], raw[2], raw[3]]);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn floats(values: &[f32]) -> Vec<u8> {
        values.iter().flat_map(|v| v.to_le_bytes()).collect()
    }

    #[test]
    fn test_vertex_record_size() {
        // Renderer contract: 6 floats per vertex
        assert_eq!(VertexRecord::SIZE, 24);
        assert_eq!(bytemuck::bytes_of(&VertexRecord::zeroed()).len(), 24);
    }

    #[test]
    fn test_decode_points_ignores_partial_tail() {
        let mut bytes = floats(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
        bytes.extend_from_slice(&[0xAA; 7]);

        let points = decode_points(&bytes);
        assert_eq!(points, vec![Vec3::new(1.0, 2.0, 3.0), Vec3::new(4.0, 5.0, 6.0)]);
    }

    #[test]
    fn test_truncate_index_never_rounds() {
        assert_eq!(truncate_index(2.9), Some(2));
        assert_eq!(truncate_index(0.999), Some(0));
        assert_eq!(truncate_index(-0.5), Some(0));
        assert_eq!(truncate_index(-1.0), None);
        assert_eq!(truncate_index(f32::NAN), None);
        assert_eq!(truncate_index(f32::INFINITY), None);
    }

    #[test]
    fn test_index_to_u32_truncates_and_saturates() {
        assert_eq!(index_to_u32(2.9), 2);
        assert_eq!(index_to_u32(7.0), 7);
        assert_eq!(index_to_u32(-3.0), 0);
        assert_eq!(index_to_u32(f32::NAN), 0);
    }

    #[test]
    fn test_vertex_record_halves_are_independent() {
        let mut slot = [0u8; VertexRecord::SIZE];
        VertexRecord::write_normal(&mut slot, Vec3::new(7.0, 8.0, 9.0));
        VertexRecord::write_position(&mut slot, Vec3::new(1.0, 2.0, 3.0));

        let record = VertexRecord::read(&slot).unwrap();
        assert_eq!(record.position, [1.0, 2.0, 3.0]);
        assert_eq!(record.normal, [7.0, 8.0, 9.0]);
    }

    #[test]
    fn test_halves_match_pod_record_bytes() {
        let record = VertexRecord {
            position: [1.0, -2.0, 3.5],
            normal: [0.0, 0.0, 1.0],
        };
        let mut slot = [0u8; VertexRecord::SIZE + 4];
        VertexRecord::write_position(&mut slot, Vec3::from_array(record.position));
        VertexRecord::write_normal(&mut slot, Vec3::from_array(record.normal));

        assert_eq!(&slot[..VertexRecord::SIZE], bytemuck::bytes_of(&record));
        assert_eq!(&slot[VertexRecord::SIZE..], &[0; 4]);
        assert_eq!(VertexRecord::read(&slot[..]), Some(record));

        // Unaligned source slot.
        let mut shifted = vec![0u8; 1];
        shifted.extend_from_slice(&slot[..VertexRecord::SIZE]);
        assert_eq!(VertexRecord::read(&shifted[1..]), Some(record));
    }

    #[test]
    fn test_short_slot_is_left_alone() {
        let mut slot = [0xFFu8; 20];
        VertexRecord::write_normal(&mut slot, Vec3::Z);
        assert!(slot.iter().all(|b| *b == 0xFF));
        assert!(VertexRecord::read(&slot).is_none());
    }

    #[test]
    fn test_index_triple_layout() {
        let mut slot = [0u8; INDEX_RECORD_BYTES];
        write_index_triple(&mut slot, [1, 256, 3]);
        assert_eq!(&slot[..8], &[1, 0, 0, 0, 0, 1, 0, 0]);
        assert_eq!(read_index_triple(&slot), [1, 256, 3]);
    }
}
