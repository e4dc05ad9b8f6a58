//! 2D vector math for the simulation.
//!
//! Server replay has to reproduce a client's integration bit for bit, so the
//! trigonometry used by the physics step is computed in software rather than
//! through the platform's libm, whose results differ between targets.

use std::{
    f32::consts::PI,
    ops::{Add, AddAssign, Mul, Neg, Sub},
};

use pitlane_serde::{BitReader, BitWrite, ConstBitLength, Serde, SerdeErr};

const TAU: f32 = PI * 2.0;

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub const ZERO: Vec2 = Vec2 { x: 0.0, y: 0.0 };

    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Unit vector pointing along `angle` (radians, counter-clockwise from +x).
    pub fn from_angle(angle: f32) -> Self {
        Self::new(cos_det(angle), sin_det(angle))
    }

    pub fn dot(self, other: Vec2) -> f32 {
        self.x * other.x + self.y * other.y
    }

    /// z component of the 3D cross product; positive when `other` lies to the
    /// left of `self`.
    pub fn perp_dot(self, other: Vec2) -> f32 {
        self.x * other.y - self.y * other.x
    }

    pub fn length_squared(self) -> f32 {
        self.dot(self)
    }

    pub fn length(self) -> f32 {
        self.length_squared().sqrt()
    }

    pub fn distance_squared(self, other: Vec2) -> f32 {
        (self - other).length_squared()
    }

    /// Linear blend towards `target`; `t` is clamped to [0, 1].
    pub fn lerp(self, target: Vec2, t: f32) -> Vec2 {
        let t = t.clamp(0.0, 1.0);
        self + (target - self) * t
    }

    /// True when both axes are within `tolerance` of `other`.
    pub fn within_per_axis(self, other: Vec2, tolerance: f32) -> bool {
        (self.x - other.x).abs() <= tolerance && (self.y - other.y).abs() <= tolerance
    }
}

impl Add for Vec2 {
    type Output = Vec2;

    fn add(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl AddAssign for Vec2 {
    fn add_assign(&mut self, rhs: Vec2) {
        self.x += rhs.x;
        self.y += rhs.y;
    }
}

impl Sub for Vec2 {
    type Output = Vec2;

    fn sub(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Mul<f32> for Vec2 {
    type Output = Vec2;

    fn mul(self, rhs: f32) -> Vec2 {
        Vec2::new(self.x * rhs, self.y * rhs)
    }
}

impl Neg for Vec2 {
    type Output = Vec2;

    fn neg(self) -> Vec2 {
        Vec2::new(-self.x, -self.y)
    }
}

impl Serde for Vec2 {
    fn ser(&self, writer: &mut dyn BitWrite) {
        self.x.ser(writer);
        self.y.ser(writer);
    }

    fn de(reader: &mut BitReader) -> Result<Self, SerdeErr> {
        Ok(Vec2::new(f32::de(reader)?, f32::de(reader)?))
    }

    fn bit_length(&self) -> u32 {
        <Self as ConstBitLength>::const_bit_length()
    }
}

impl ConstBitLength for Vec2 {
    fn const_bit_length() -> u32 {
        <f32 as ConstBitLength>::const_bit_length() * 2
    }
}

/// Wraps an angle into [0, 2π).
pub fn normalize_angle(angle: f32) -> f32 {
    let wrapped = angle % TAU;
    if wrapped < 0.0 {
        wrapped + TAU
    } else {
        wrapped
    }
}

/// Deterministic sine using Bhaskara I's approximation.
pub fn sin_det(x: f32) -> f32 {
    let x = normalize_angle(x);

    // map [π, 2π) onto [0, π) using sin(x) = -sin(x - π)
    let (x, sign) = if x > PI { (x - PI, -1.0) } else { (x, 1.0) };

    let numerator = 16.0 * x * (PI - x);
    let denominator = 5.0 * PI * PI - 4.0 * x * (PI - x);

    sign * numerator / denominator
}

/// Deterministic cosine, `sin(x + π/2)`.
pub fn cos_det(x: f32) -> f32 {
    sin_det(x + PI / 2.0)
}
