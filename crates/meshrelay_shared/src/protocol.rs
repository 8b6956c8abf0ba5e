//! Wire types sent to the remote endpoint.
//!
//! The remote side expects exactly one compact JSON object per cycle:
//! `{"position":[x0,y0,z0,x1,y1,z1,...]}`.

use serde::{Deserialize, Serialize};

/// Scaled, truncated corner positions in triangle order.
///
/// Nine integers per triangle: three corners, `x, y, z` each.
pub type PositionSnapshot = Vec<i32>;

/// Outbound message carrying one position snapshot.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PositionMessage {
    /// Flattened corner positions
    pub position: PositionSnapshot,
}

impl PositionMessage {
    /// Wraps a snapshot
    #[must_use]
    pub fn new(position: PositionSnapshot) -> Self {
        Self { position }
    }

    /// Serializes to compact JSON (no whitespace).
    ///
    /// # Errors
    ///
    /// Returns the serializer error; a `Vec<i32>` payload never produces one
    /// in practice.
    pub fn to_compact_json(&self) -> serde_json::Result<Vec<u8>> {
        serde_json::to_vec(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compact_encoding() {
        let msg = PositionMessage::new(vec![0, 0, 0, 1000, 0, 0, 0, 1000, 0]);
        let bytes = msg.to_compact_json().unwrap();
        assert_eq!(
            std::str::from_utf8(&bytes).unwrap(),
            r#"{"position":[0,0,0,1000,0,0,0,1000,0]}"#
        );
    }

    #[test]
    fn test_negative_values_stay_signed() {
        let msg = PositionMessage::new(vec![-5, 12, -1999]);
        let bytes = msg.to_compact_json().unwrap();
        let back: PositionMessage = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(back.position, vec![-5, 12, -1999]);
    }
}
