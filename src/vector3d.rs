//! Double precision 3D vector
//!
//! Small mutable vector used by the lens geometry and by head tracking code
//! that feeds this crate. Operations that produce a vector write into a
//! caller-owned `result` so the per-frame path stays allocation free.
//!
//! The borrow checker already forbids passing the same vector as both an
//! input and `result`, so `cross`/`sub` never read a half-written operand.

use glam::DVec3;

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Vector3d {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vector3d {
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    pub fn zero(&mut self) {
        self.set(0.0, 0.0, 0.0);
    }

    pub fn set(&mut self, x: f64, y: f64, z: f64) {
        self.x = x;
        self.y = y;
        self.z = z;
    }

    pub fn set_from(&mut self, other: &Vector3d) {
        self.set(other.x, other.y, other.z);
    }

    /// Index 0 is x, 1 is y, anything else is z.
    pub fn set_component(&mut self, i: usize, value: f64) {
        match i {
            0 => self.x = value,
            1 => self.y = value,
            _ => self.z = value,
        }
    }

    /// Scale to unit length. A zero vector is left untouched.
    pub fn normalize(&mut self) {
        let d = self.length();
        if d != 0.0 {
            self.scale(1.0 / d);
        }
    }

    pub fn length(&self) -> f64 {
        (self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }

    pub fn scale(&mut self, s: f64) {
        self.x *= s;
        self.y *= s;
        self.z *= s;
    }

    /// Axis index (0, 1, 2) of the component with the largest magnitude.
    ///
    /// Ties resolve through strict `>` comparisons: x only wins if it beats
    /// both others, then y must beat z, otherwise z. So `(1, 1, 1)` yields 2
    /// and `(2, 2, 1)` yields 1.
    pub fn largest_abs_component(v: &Vector3d) -> usize {
        let x_abs = v.x.abs();
        let y_abs = v.y.abs();
        let z_abs = v.z.abs();

        if x_abs > y_abs {
            if x_abs > z_abs {
                return 0;
            }
            return 2;
        }

        if y_abs > z_abs {
            return 1;
        }

        2
    }

    pub fn cross(a: &Vector3d, b: &Vector3d, result: &mut Vector3d) {
        result.set(
            a.y * b.z - a.z * b.y,
            a.z * b.x - a.x * b.z,
            a.x * b.y - a.y * b.x,
        );
    }

    pub fn dot(a: &Vector3d, b: &Vector3d) -> f64 {
        a.x * b.x + a.y * b.y + a.z * b.z
    }

    /// Unit vector orthogonal to `v`.
    ///
    /// Seeds an axis that is never the dominant one, so the cross product is
    /// non-degenerate for any non-zero `v`.
    pub fn ortho(v: &Vector3d, result: &mut Vector3d) {
        let k = (Self::largest_abs_component(v) + 2) % 3;

        let mut seed = Vector3d::default();
        seed.set_component(k, 1.0);

        Self::cross(v, &seed, result);
        result.normalize();
    }

    pub fn sub(a: &Vector3d, b: &Vector3d, result: &mut Vector3d) {
        result.set(a.x - b.x, a.y - b.y, a.z - b.z);
    }
}

impl From<DVec3> for Vector3d {
    fn from(v: DVec3) -> Self {
        Self::new(v.x, v.y, v.z)
    }
}

impl From<Vector3d> for DVec3 {
    fn from(v: Vector3d) -> Self {
        DVec3::new(v.x, v.y, v.z)
    }
}
