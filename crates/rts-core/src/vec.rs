//! Vector math on the navigation plane.
//!
//! The steering simulation lives on the XZ plane: `Vec2 { x, z }` is a
//! position or velocity there, `Vec3` adds the height-field Y component for
//! world positions, and `Quat` carries entity facing as a rotation about the
//! Y axis.  Everything is single-precision — the steering loop runs 20 times
//! a second over thousands of agents and never needs sub-millimetre units.

use std::ops::{Add, AddAssign, Mul, Neg, Sub};

/// Vector-magnitude zero test used throughout the steering code.
///
/// A power of two so comparisons against it are exact in binary floating
/// point.
pub const EPSILON: f32 = 1.0 / 1024.0;

// ── Vec2 ─────────────────────────────────────────────────────────────────────

/// A 2-D vector on the XZ nav plane.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Vec2 {
    pub x: f32,
    pub z: f32,
}

impl Vec2 {
    pub const ZERO: Vec2 = Vec2 { x: 0.0, z: 0.0 };

    #[inline]
    pub fn new(x: f32, z: f32) -> Self {
        Self { x, z }
    }

    #[inline]
    pub fn dot(self, other: Vec2) -> f32 {
        self.x * other.x + self.z * other.z
    }

    #[inline]
    pub fn len_sq(self) -> f32 {
        self.dot(self)
    }

    #[inline]
    pub fn len(self) -> f32 {
        self.len_sq().sqrt()
    }

    #[inline]
    pub fn dist(self, other: Vec2) -> f32 {
        (self - other).len()
    }

    #[inline]
    pub fn dist_sq(self, other: Vec2) -> f32 {
        (self - other).len_sq()
    }

    /// `true` if the magnitude is below [`EPSILON`].
    #[inline]
    pub fn is_near_zero(self) -> bool {
        self.len() < EPSILON
    }

    /// Unit vector in the same direction, or `ZERO` for near-zero input.
    pub fn normalized(self) -> Vec2 {
        let len = self.len();
        if len < EPSILON {
            Vec2::ZERO
        } else {
            Vec2::new(self.x / len, self.z / len)
        }
    }

    /// Clamp the magnitude to at most `max_len`, preserving direction.
    pub fn truncated(self, max_len: f32) -> Vec2 {
        let len = self.len();
        if len > max_len && len > 0.0 {
            self * (max_len / len)
        } else {
            self
        }
    }
}

impl Add for Vec2 {
    type Output = Vec2;
    #[inline]
    fn add(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x + rhs.x, self.z + rhs.z)
    }
}

impl AddAssign for Vec2 {
    #[inline]
    fn add_assign(&mut self, rhs: Vec2) {
        self.x += rhs.x;
        self.z += rhs.z;
    }
}

impl Sub for Vec2 {
    type Output = Vec2;
    #[inline]
    fn sub(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x - rhs.x, self.z - rhs.z)
    }
}

impl Mul<f32> for Vec2 {
    type Output = Vec2;
    #[inline]
    fn mul(self, rhs: f32) -> Vec2 {
        Vec2::new(self.x * rhs, self.z * rhs)
    }
}

impl Neg for Vec2 {
    type Output = Vec2;
    #[inline]
    fn neg(self) -> Vec2 {
        Vec2::new(-self.x, -self.z)
    }
}

impl std::fmt::Display for Vec2 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({:.3}, {:.3})", self.x, self.z)
    }
}

// ── Vec3 ─────────────────────────────────────────────────────────────────────

/// A world-space position: XZ nav-plane coordinates plus height-field Y.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Vec3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vec3 {
    pub const ZERO: Vec3 = Vec3 { x: 0.0, y: 0.0, z: 0.0 };

    #[inline]
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    /// Project onto the nav plane.
    #[inline]
    pub fn xz(self) -> Vec2 {
        Vec2::new(self.x, self.z)
    }

    /// Lift a nav-plane point to world space at height `y`.
    #[inline]
    pub fn from_xz(v: Vec2, y: f32) -> Self {
        Self { x: v.x, y, z: v.z }
    }
}

// ── Quat ─────────────────────────────────────────────────────────────────────

/// A unit quaternion.  The movement core only ever produces rotations about
/// the world Y axis (entity facing), so no general constructor is offered.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Quat {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub w: f32,
}

impl Quat {
    pub const IDENTITY: Quat = Quat { x: 0.0, y: 0.0, z: 0.0, w: 1.0 };

    /// Rotation of `radians` about the world Y axis.
    pub fn from_y_rotation(radians: f32) -> Self {
        let half = radians * 0.5;
        Self {
            x: 0.0,
            y: half.sin(),
            z: 0.0,
            w: half.cos(),
        }
    }

    /// The Y-axis rotation angle in radians, assuming `self` came from
    /// [`Quat::from_y_rotation`].
    pub fn y_angle(self) -> f32 {
        2.0 * self.y.atan2(self.w)
    }
}

impl Default for Quat {
    fn default() -> Self {
        Self::IDENTITY
    }
}
