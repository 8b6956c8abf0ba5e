//! Per-cycle vertex normal table.
//!
//! One slot per vertex, claimed by the first triangle that touches it.
//! Later triangles sharing the vertex are ignored; there is no averaging.

use meshrelay_shared::Vec3;

/// Array-backed map from vertex index to its claimed normal.
///
/// The table is reset at the start of every rebuild, so a normal never
/// survives into the next cycle. The allocation does.
#[derive(Debug, Clone, Default)]
pub struct NormalTable {
    /// `slots[vertex]` is `Some` once claimed.
    slots: Vec<Option<Vec3>>,
    /// Number of claimed slots.
    claimed: usize,
}

impl NormalTable {
    /// Creates an all-unclaimed table for `vertex_count` vertices.
    #[must_use]
    pub fn new(vertex_count: usize) -> Self {
        Self {
            slots: vec![None; vertex_count],
            claimed: 0,
        }
    }

    /// Clears every claim and resizes to `vertex_count`.
    pub fn reset(&mut self, vertex_count: usize) {
        self.slots.clear();
        self.slots.resize(vertex_count, None);
        self.claimed = 0;
    }

    /// Assigns `normal` to `vertex` if nobody claimed it yet this cycle.
    ///
    /// Returns `true` when the claim succeeded. Out-of-range vertices are
    /// never claimable.
    pub fn claim(&mut self, vertex: usize, normal: Vec3) -> bool {
        let Some(slot) = self.slots.get_mut(vertex) else {
            return false;
        };
        if slot.is_some() {
            return false;
        }
        *slot = Some(normal);
        self.claimed += 1;
        true
    }

    /// Claimed normal for `vertex`, if any.
    #[inline]
    #[must_use]
    pub fn get(&self, vertex: usize) -> Option<Vec3> {
        self.slots.get(vertex).copied().flatten()
    }

    /// Number of vertices the table covers.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Whether the table covers no vertices.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Number of claimed vertices.
    #[inline]
    #[must_use]
    pub const fn claimed_count(&self) -> usize {
        self.claimed
    }
}
