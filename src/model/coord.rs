//! Positions, offsets and the on-disk axis order.
//!
//! In memory every position is `(x, y, z)`. Containers store rows as
//! `(z, y, x)`, and the per-group offset attribute uses the same reversed
//! order. [`load_position`] and [`store_position`] are the only places where
//! the two orders meet.

use serde::{Deserialize, Serialize};

/// A point in world coordinates, `(x, y, z)` order.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Position {
    /// Creates a new position from its x, y and z components.
    #[inline]
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    /// Returns the components as `[x, y, z]`.
    #[inline]
    pub fn to_xyz(&self) -> [f32; 3] {
        [self.x, self.y, self.z]
    }

    /// Builds a position from `[x, y, z]`.
    #[inline]
    pub fn from_xyz(xyz: [f32; 3]) -> Self {
        Self::new(xyz[0], xyz[1], xyz[2])
    }

    /// Returns true if all components are finite (not NaN or infinite).
    #[inline]
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }
}

/// Per-axis translation between stored rows and world coordinates.
///
/// Held in `(x, y, z)` order; [`Offset::from_zyx`] and [`Offset::to_zyx`]
/// convert from and to the attribute layout.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Offset {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Offset {
    /// The zero offset.
    pub const ZERO: Offset = Offset {
        x: 0.0,
        y: 0.0,
        z: 0.0,
    };

    /// Creates an offset from its x, y and z components.
    #[inline]
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    /// Builds an offset from an attribute value in `(z, y, x)` order.
    #[inline]
    pub fn from_zyx(zyx: [f32; 3]) -> Self {
        Self::new(zyx[2], zyx[1], zyx[0])
    }

    /// Returns the offset in `(z, y, x)` attribute order.
    #[inline]
    pub fn to_zyx(&self) -> [f32; 3] {
        [self.z, self.y, self.x]
    }

    #[inline]
    fn to_xyz(self) -> [f32; 3] {
        [self.x, self.y, self.z]
    }
}

/// Converts a stored `(z, y, x)` row into a world position, adding `offset`.
pub fn load_position(raw_zyx: [f32; 3], offset: &Offset) -> Position {
    Position::new(
        raw_zyx[2] + offset.x,
        raw_zyx[1] + offset.y,
        raw_zyx[0] + offset.z,
    )
}

/// Converts a world position into a stored `(z, y, x)` row, subtracting `offset`.
pub fn store_position(position: &Position, offset: &Offset) -> [f32; 3] {
    let xyz = position.to_xyz();
    let off = offset.to_xyz();
    let mut raw = [0.0f32; 3];
    for (i, slot) in raw.iter_mut().enumerate() {
        *slot = xyz[2 - i] - off[2 - i];
    }
    raw
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_reverses_axes() {
        let pos = load_position([1.0, 2.0, 3.0], &Offset::ZERO);
        assert_eq!(pos, Position::new(3.0, 2.0, 1.0));
    }

    #[test]
    fn test_load_applies_offset_per_axis() {
        // attribute [100, 200, 300] is (z, y, x)
        let offset = Offset::from_zyx([100.0, 200.0, 300.0]);
        let pos = load_position([1.0, 2.0, 3.0], &offset);
        assert_eq!(pos, Position::new(303.0, 202.0, 101.0));
    }

    #[test]
    fn test_store_inverts_load() {
        let offset = Offset::from_zyx([100.0, 200.0, 300.0]);
        let raw = [1.0, 2.0, 3.0];
        let pos = load_position(raw, &offset);
        assert_eq!(store_position(&pos, &offset), raw);
    }

    #[test]
    fn test_store_without_offset() {
        let raw = store_position(&Position::new(10.0, 20.0, 30.0), &Offset::ZERO);
        assert_eq!(raw, [30.0, 20.0, 10.0]);
    }

    #[test]
    fn test_offset_attribute_order() {
        let offset = Offset::from_zyx([1.0, 2.0, 3.0]);
        assert_eq!(offset, Offset::new(3.0, 2.0, 1.0));
        assert_eq!(offset.to_zyx(), [1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_position_is_finite() {
        assert!(Position::new(1.0, 2.0, 3.0).is_finite());
        assert!(!Position::new(f32::NAN, 2.0, 3.0).is_finite());
        assert!(!Position::new(1.0, f32::INFINITY, 3.0).is_finite());
    }
}
