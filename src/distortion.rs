//! Radial lens distortion
//!
//! The lens is modelled as a polynomial in the squared radius:
//! `factor(r) = 1 + c0·r² + c1·r⁴ + ...` and `distort(r) = r · factor(r)`.
//! Radii are tangent-angle distances from the optical axis.

use serde::{Deserialize, Serialize};

use crate::error::{config_error, Result, StereoError};

/// Coefficients of the stock Cardboard v1 viewer.
pub const DEFAULT_COEFFICIENTS: [f64; 2] = [0.441, 0.156];

/// Upper bound on secant steps in [`Distortion::distort_inverse`].
pub const MAX_INVERSE_ITERATIONS: usize = 100;

/// Step size at which the inverse is considered converged.
const INVERSE_TOLERANCE: f64 = 1e-4;

/// Accepted residual of a converged inverse, relative to `max(radius, 1)`.
const RESIDUAL_TOLERANCE: f64 = 1e-3;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Distortion {
    coefficients: Vec<f64>,
}

impl Default for Distortion {
    fn default() -> Self {
        Self {
            coefficients: DEFAULT_COEFFICIENTS.to_vec(),
        }
    }
}

impl Distortion {
    /// Build a model from an explicit coefficient list (at least one entry).
    pub fn with_coefficients(coefficients: &[f64]) -> Result<Self> {
        let distortion = Self {
            coefficients: coefficients.to_vec(),
        };
        distortion.validate()?;
        Ok(distortion)
    }

    pub fn coefficients(&self) -> &[f64] {
        &self.coefficients
    }

    /// Overwrite every coefficient slot with the same value.
    pub fn set_all_coefficients(&mut self, coefficient: f64) {
        self.coefficients.iter_mut().for_each(|c| *c = coefficient);
    }

    pub fn validate(&self) -> Result<()> {
        if self.coefficients.is_empty() {
            return Err(config_error("distortion needs at least one coefficient"));
        }
        if self.coefficients.iter().any(|c| !c.is_finite()) {
            return Err(config_error(format!(
                "distortion coefficients must be finite, got {:?}",
                self.coefficients
            )));
        }
        Ok(())
    }

    pub fn distortion_factor(&self, radius: f64) -> f64 {
        let squared_radius = radius * radius;
        let mut result = 1.0;
        let mut r_factor = 1.0;

        for coefficient in &self.coefficients {
            r_factor *= squared_radius;
            result += coefficient * r_factor;
        }

        result
    }

    pub fn distort(&self, radius: f64) -> f64 {
        radius * self.distortion_factor(radius)
    }

    /// Solve `distort(x) = radius` for `x` with the secant method.
    ///
    /// Expects `radius >= 0` and a monotonic, near-identity model over the
    /// range of interest. Fails with [`StereoError::NumericDivergence`] when
    /// the iteration does not settle within [`MAX_INVERSE_ITERATIONS`].
    pub fn distort_inverse(&self, radius: f64) -> Result<f64> {
        let diverged = |iterations: usize| StereoError::NumericDivergence { radius, iterations };
        // A step below tolerance only counts if the residual agrees.
        let settled = |r: f64| {
            let residual = (radius - self.distort(r)).abs();
            residual.is_finite() && residual <= RESIDUAL_TOLERANCE * radius.max(1.0)
        };

        let mut r = radius * 0.9;
        let mut r0 = radius / 0.9;
        let mut dr0 = radius - self.distort(r0);

        for iteration in 1..=MAX_INVERSE_ITERATIONS {
            if (r - r0).abs() <= INVERSE_TOLERANCE {
                return if settled(r) { Ok(r) } else { Err(diverged(iteration)) };
            }

            let dr = radius - self.distort(r);
            if dr == 0.0 {
                return Ok(r);
            }

            let slope = dr - dr0;
            if slope == 0.0 {
                // Flat secant: the model is not invertible around here.
                return Err(diverged(iteration));
            }

            let r2 = r - dr * ((r - r0) / slope);
            if !r2.is_finite() {
                return Err(diverged(iteration));
            }

            r0 = r;
            r = r2;
            dr0 = dr;
        }

        if (r - r0).abs() <= INVERSE_TOLERANCE && settled(r) {
            Ok(r)
        } else {
            Err(diverged(MAX_INVERSE_ITERATIONS))
        }
    }

    /// Map a point in distorted tan-angle space back through the lens.
    ///
    /// This is the per-vertex lookup a distortion mesh performs: the screen
    /// position `(x, y)` relative to the lens center is scaled radially by
    /// `distort_inverse(|p|) / |p|`.
    pub fn undistort_point(&self, x: f64, y: f64) -> Result<(f64, f64)> {
        let d = x.hypot(y);
        if d == 0.0 {
            return Ok((0.0, 0.0));
        }
        let scale = self.distort_inverse(d)? / d;
        Ok((x * scale, y * scale))
    }
}
