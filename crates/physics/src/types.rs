//! Planar vector math.
//!
//! Every body in the engine moves in the x–z plane and rotates about the
//! +y axis. A positive angle turns +z towards +x, so a pole standing on the
//! z axis leans to the right as its angle grows.

use std::ops::{Add, AddAssign, Mul, Neg, Sub};

/// A vector in the x–z plane.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct Vec2 {
    pub x: f64,
    pub z: f64,
}

impl Vec2 {
    pub const ZERO: Self = Self::new(0.0, 0.0);

    #[must_use]
    pub const fn new(x: f64, z: f64) -> Self {
        Self { x, z }
    }

    #[must_use]
    pub fn from_array(v: [f64; 2]) -> Self {
        Self::new(v[0], v[1])
    }

    #[must_use]
    pub fn dot(self, other: Self) -> f64 {
        self.x * other.x + self.z * other.z
    }

    #[must_use]
    pub fn length_squared(self) -> f64 {
        self.dot(self)
    }

    #[must_use]
    pub fn length(self) -> f64 {
        self.length_squared().sqrt()
    }

    /// Rotates the vector by `angle` radians about +y.
    #[must_use]
    pub fn rotate(self, angle: f64) -> Self {
        let (s, c) = angle.sin_cos();
        Self::new(c * self.x + s * self.z, -s * self.x + c * self.z)
    }
}

/// Velocity of a point at offset `d` on a body spinning at `omega` about +y.
#[must_use]
pub fn cross(omega: f64, d: Vec2) -> Vec2 {
    Vec2::new(omega * d.z, -omega * d.x)
}

impl Add for Vec2 {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.z + rhs.z)
    }
}

impl AddAssign for Vec2 {
    fn add_assign(&mut self, rhs: Self) {
        self.x += rhs.x;
        self.z += rhs.z;
    }
}

impl Sub for Vec2 {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.z - rhs.z)
    }
}

impl Mul<f64> for Vec2 {
    type Output = Self;

    fn mul(self, rhs: f64) -> Self {
        Self::new(self.x * rhs, self.z * rhs)
    }
}

impl Neg for Vec2 {
    type Output = Self;

    fn neg(self) -> Self {
        Self::new(-self.x, -self.z)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn positive_rotation_leans_up_vector_right() {
        let up = Vec2::new(0.0, 1.0);
        let leaned = up.rotate(std::f64::consts::FRAC_PI_2);
        assert_relative_eq!(leaned.x, 1.0, epsilon = 1e-12);
        assert_relative_eq!(leaned.z, 0.0, epsilon = 1e-12);
    }

    #[test]
    fn cross_is_derivative_of_rotation() {
        let d = Vec2::new(0.3, -0.7);
        let angle = 0.4;
        let h = 1e-6;
        let numeric = (d.rotate(angle + h) - d.rotate(angle - h)) * (0.5 / h);
        let analytic = cross(1.0, d.rotate(angle));
        assert_relative_eq!(numeric.x, analytic.x, epsilon = 1e-8);
        assert_relative_eq!(numeric.z, analytic.z, epsilon = 1e-8);
    }
}
