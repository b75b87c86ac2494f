// Copyright 2026 the DPP Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Plane rotation and reflection.
//!
//! The compositor describes orientation with one of four angles plus two
//! reflection flags (the DRM rotation property, 16 combinations covering the
//! 8 symmetries of the square). The channel only exposes rotate-90, flip-x,
//! and flip-y, applied as rotate first then reflect. [`Rotation::simplify`]
//! maps any request onto that basis using `rot180 = flip_x · flip_y`.
//!
//! [`Mat2`] is a column-major 2×2 integer matrix used to check that a
//! simplified rotation describes the same transform as the request.

use core::ops::Mul;

/// DRM rotation bit for 0°.
pub const ROTATE_0: u32 = 1 << 0;
/// DRM rotation bit for 90°.
pub const ROTATE_90: u32 = 1 << 1;
/// DRM rotation bit for 180°.
pub const ROTATE_180: u32 = 1 << 2;
/// DRM rotation bit for 270°.
pub const ROTATE_270: u32 = 1 << 3;
/// DRM reflection across the vertical axis.
pub const REFLECT_X: u32 = 1 << 4;
/// DRM reflection across the horizontal axis.
pub const REFLECT_Y: u32 = 1 << 5;

const ROTATE_MASK: u32 = ROTATE_0 | ROTATE_90 | ROTATE_180 | ROTATE_270;

/// Counter-clockwise rotation angle.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Angle {
    /// No rotation.
    #[default]
    Deg0,
    /// Quarter turn.
    Deg90,
    /// Half turn.
    Deg180,
    /// Three-quarter turn.
    Deg270,
}

impl Angle {
    /// All four angles in increasing order.
    pub const ALL: [Self; 4] = [Self::Deg0, Self::Deg90, Self::Deg180, Self::Deg270];

    /// Whether the angle exchanges the horizontal and vertical axes.
    #[must_use]
    pub const fn swaps_axes(self) -> bool {
        matches!(self, Self::Deg90 | Self::Deg270)
    }

    /// Number of quarter turns.
    #[must_use]
    pub const fn quarter_turns(self) -> u32 {
        match self {
            Self::Deg0 => 0,
            Self::Deg90 => 1,
            Self::Deg180 => 2,
            Self::Deg270 => 3,
        }
    }
}

/// A requested plane orientation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Rotation {
    /// Rotation applied first.
    pub angle: Angle,
    /// Mirror horizontally after rotating.
    pub reflect_x: bool,
    /// Mirror vertically after rotating.
    pub reflect_y: bool,
}

impl Rotation {
    /// No rotation, no reflection.
    pub const IDENTITY: Self = Self {
        angle: Angle::Deg0,
        reflect_x: false,
        reflect_y: false,
    };

    /// Rotation by `angle` without reflection.
    #[must_use]
    pub const fn rotate(angle: Angle) -> Self {
        Self {
            angle,
            reflect_x: false,
            reflect_y: false,
        }
    }

    /// Decodes DRM rotation bits.
    ///
    /// Exactly one angle bit must be set; unknown bits are refused.
    #[must_use]
    pub const fn from_bits(bits: u32) -> Option<Self> {
        if bits & !(ROTATE_MASK | REFLECT_X | REFLECT_Y) != 0 {
            return None;
        }
        let angle = match bits & ROTATE_MASK {
            ROTATE_0 => Angle::Deg0,
            ROTATE_90 => Angle::Deg90,
            ROTATE_180 => Angle::Deg180,
            ROTATE_270 => Angle::Deg270,
            _ => return None,
        };
        Some(Self {
            angle,
            reflect_x: bits & REFLECT_X != 0,
            reflect_y: bits & REFLECT_Y != 0,
        })
    }

    /// Encodes as DRM rotation bits.
    #[must_use]
    pub const fn bits(self) -> u32 {
        let angle = match self.angle {
            Angle::Deg0 => ROTATE_0,
            Angle::Deg90 => ROTATE_90,
            Angle::Deg180 => ROTATE_180,
            Angle::Deg270 => ROTATE_270,
        };
        let mut bits = angle;
        if self.reflect_x {
            bits |= REFLECT_X;
        }
        if self.reflect_y {
            bits |= REFLECT_Y;
        }
        bits
    }

    /// Reduces the request to the three bits the hardware exposes.
    ///
    /// A half turn is folded into the reflections: 180° becomes both flips
    /// and 270° becomes 90° with both flips toggled.
    #[must_use]
    pub const fn simplify(self) -> HwRotation {
        let half = matches!(self.angle, Angle::Deg180 | Angle::Deg270);
        HwRotation {
            rot90: self.angle.swaps_axes(),
            x_flip: self.reflect_x ^ half,
            y_flip: self.reflect_y ^ half,
        }
    }

    /// The linear map this orientation applies to pixel coordinates.
    #[must_use]
    pub fn matrix(self) -> Mat2 {
        let mut m = Mat2::IDENTITY;
        for _ in 0..self.angle.quarter_turns() {
            m = Mat2::ROTATE_90 * m;
        }
        if self.reflect_x {
            m = Mat2::REFLECT_X * m;
        }
        if self.reflect_y {
            m = Mat2::REFLECT_Y * m;
        }
        m
    }
}

/// Orientation in the hardware basis: optional 90° turn, then flips.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct HwRotation {
    /// Rotate by 90°.
    pub rot90: bool,
    /// Mirror horizontally.
    pub x_flip: bool,
    /// Mirror vertically.
    pub y_flip: bool,
}

impl HwRotation {
    /// Whether any rotation or flip is active.
    #[must_use]
    pub const fn is_identity(self) -> bool {
        !(self.rot90 || self.x_flip || self.y_flip)
    }

    /// Whether a flip is active.
    #[must_use]
    pub const fn flips(self) -> bool {
        self.x_flip || self.y_flip
    }

    /// Re-expands into a compositor rotation with a 0° or 90° angle.
    #[must_use]
    pub const fn expand(self) -> Rotation {
        Rotation {
            angle: if self.rot90 { Angle::Deg90 } else { Angle::Deg0 },
            reflect_x: self.x_flip,
            reflect_y: self.y_flip,
        }
    }
}

/// Column-major 2×2 integer matrix.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Mat2 {
    /// Two columns `[x, y]`.
    pub cols: [[i32; 2]; 2],
}

impl Mat2 {
    /// Identity.
    pub const IDENTITY: Self = Self {
        cols: [[1, 0], [0, 1]],
    };
    /// Counter-clockwise quarter turn.
    pub const ROTATE_90: Self = Self {
        cols: [[0, 1], [-1, 0]],
    };
    /// Negates x.
    pub const REFLECT_X: Self = Self {
        cols: [[-1, 0], [0, 1]],
    };
    /// Negates y.
    pub const REFLECT_Y: Self = Self {
        cols: [[1, 0], [0, -1]],
    };

    /// Applies the matrix to a point.
    #[must_use]
    pub const fn apply(self, p: [i32; 2]) -> [i32; 2] {
        [
            self.cols[0][0] * p[0] + self.cols[1][0] * p[1],
            self.cols[0][1] * p[0] + self.cols[1][1] * p[1],
        ]
    }
}

impl Mul for Mat2 {
    type Output = Self;

    #[inline]
    fn mul(self, rhs: Self) -> Self {
        Self {
            cols: [self.apply(rhs.cols[0]), self.apply(rhs.cols[1])],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn all_rotations() -> impl Iterator<Item = Rotation> {
        Angle::ALL.into_iter().flat_map(|angle| {
            [(false, false), (true, false), (false, true), (true, true)]
                .into_iter()
                .map(move |(reflect_x, reflect_y)| Rotation {
                    angle,
                    reflect_x,
                    reflect_y,
                })
        })
    }

    #[test]
    fn bits_round_trip_through_drm_encoding() {
        for r in all_rotations() {
            assert_eq!(Rotation::from_bits(r.bits()), Some(r));
        }
    }

    #[test]
    fn from_bits_needs_exactly_one_angle() {
        assert_eq!(Rotation::from_bits(REFLECT_X), None);
        assert_eq!(Rotation::from_bits(ROTATE_0 | ROTATE_90), None);
        assert_eq!(Rotation::from_bits(ROTATE_0 | (1 << 7)), None);
    }

    #[test]
    fn half_turn_becomes_double_flip() {
        let hw = Rotation::rotate(Angle::Deg180).simplify();
        assert_eq!(
            hw,
            HwRotation {
                rot90: false,
                x_flip: true,
                y_flip: true
            }
        );
    }

    #[test]
    fn three_quarter_turn_keeps_rot90() {
        let hw = Rotation {
            angle: Angle::Deg270,
            reflect_x: true,
            reflect_y: false,
        }
        .simplify();
        assert!(hw.rot90);
        assert!(!hw.x_flip);
        assert!(hw.y_flip);
    }

    #[test]
    fn simplified_rotation_is_equivalent() {
        for r in all_rotations() {
            let hw = r.simplify();
            assert_eq!(hw.expand().matrix(), r.matrix(), "{r:?} -> {hw:?}");
        }
    }

    #[test]
    fn simplification_is_idempotent() {
        for r in all_rotations() {
            let hw = r.simplify();
            assert_eq!(hw.expand().simplify(), hw);
        }
    }

    #[test]
    fn four_quarter_turns_are_identity() {
        let q = Mat2::ROTATE_90;
        assert_eq!(q * q * q * q, Mat2::IDENTITY);
        assert_eq!(q * q, Mat2::REFLECT_X * Mat2::REFLECT_Y);
    }
}
