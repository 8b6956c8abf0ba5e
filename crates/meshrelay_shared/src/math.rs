//! Vector math shared by the geometry core and the wire types.

use bytemuck::{Pod, Zeroable};

/// 3D Vector - vertex position or face normal
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct Vec3 {
    /// X component
    pub x: f32,
    /// Y component
    pub y: f32,
    /// Z component
    pub z: f32,
}

impl Vec3 {
    /// Creates a new Vec3
    #[must_use]
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    /// Unit Z vector
    pub const Z: Self = Self::new(0.0, 0.0, 1.0);

    /// Converts to array
    #[must_use]
    pub const fn to_array(self) -> [f32; 3] {
        [self.x, self.y, self.z]
    }

    /// Creates from array
    #[must_use]
    pub const fn from_array(arr: [f32; 3]) -> Self {
        Self::new(arr[0], arr[1], arr[2])
    }

    /// Cross product `self x other`
    #[must_use]
    pub fn cross(self, other: Self) -> Self {
        Self::new(
            self.y * other.z - self.z * other.y,
            self.z * other.x - self.x * other.z,
            self.x * other.y - self.y * other.x,
        )
    }

    /// Scales each component and truncates toward zero.
    ///
    /// Out-of-range values saturate at the `i32` bounds and NaN maps to 0.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn scaled_trunc(self, scale: f32) -> [i32; 3] {
        [
            (self.x * scale) as i32,
            (self.y * scale) as i32,
            (self.z * scale) as i32,
        ]
    }
}

impl std::ops::Sub for Vec3 {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sub_then_cross() {
        // Face normal of a counter-clockwise triangle in the XY plane.
        let (v1, v2, v3) = (Vec3::new(0.0, 0.0, 0.0), Vec3::new(1.0, 0.0, 0.0), Vec3::new(0.0, 1.0, 0.0));
        assert_eq!((v3 - v2).cross(v1 - v2), Vec3::Z);
    }

    #[test]
    fn test_cross_is_right_handed() {
        assert_eq!(Vec3::new(1.0, 0.0, 0.0).cross(Vec3::new(0.0, 1.0, 0.0)), Vec3::Z);
        assert_eq!(Vec3::new(0.0, 1.0, 0.0).cross(Vec3::new(1.0, 0.0, 0.0)), Vec3::new(0.0, 0.0, -1.0));
    }

    #[test]
    fn test_scaled_trunc_rounds_toward_zero() {
        let v = Vec3::new(1.2345, -0.0004, 10.0);
        assert_eq!(v.scaled_trunc(1000.0), [1234, 0, 10000]);

        let v = Vec3::new(-1.9999, 0.0019, -0.5);
        assert_eq!(v.scaled_trunc(1000.0), [-1999, 1, -500]);
    }

    #[test]
    fn test_vec3_bytemuck() {
        let v = Vec3::new(1.0, 2.0, 3.0);
        let bytes: &[u8] = bytemuck::bytes_of(&v);
        assert_eq!(bytes.len(), 12); // 3 * 4 bytes
    }
}
