//! Per-eye field of view and its off-axis projection

use glam::{DMat4, DVec4, Mat4};
use serde::{Deserialize, Serialize};

/// Four half-angles in degrees, each measured from the eye's optical axis.
///
/// Nothing ties `left` to `right`: HMD lenses sit off-center relative to
/// their half of the screen, so eyes are usually asymmetric.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct FieldOfView {
    pub left: f64,
    pub right: f64,
    pub bottom: f64,
    pub top: f64,
}

impl FieldOfView {
    pub const fn new(left: f64, right: f64, bottom: f64, top: f64) -> Self {
        Self {
            left,
            right,
            bottom,
            top,
        }
    }

    pub const fn symmetric(angle: f64) -> Self {
        Self::new(angle, angle, angle, angle)
    }

    /// Build from tangent extents `(left, right, bottom, top)`, all positive.
    pub fn from_tan_angles(left: f64, right: f64, bottom: f64, top: f64) -> Self {
        Self::new(
            left.atan().to_degrees(),
            right.atan().to_degrees(),
            bottom.atan().to_degrees(),
            top.atan().to_degrees(),
        )
    }

    /// Tangents of the four half-angles in `(left, right, bottom, top)` order.
    pub fn tan_angles(&self) -> [f64; 4] {
        [
            self.left.to_radians().tan(),
            self.right.to_radians().tan(),
            self.bottom.to_radians().tan(),
            self.top.to_radians().tan(),
        ]
    }

    /// Same extents seen from the other eye: left and right swap.
    pub fn mirrored(&self) -> Self {
        Self::new(self.right, self.left, self.bottom, self.top)
    }

    /// Per-angle minimum against a device limit.
    pub fn clamped_to(&self, max: &FieldOfView) -> Self {
        Self::new(
            self.left.min(max.left),
            self.right.min(max.right),
            self.bottom.min(max.bottom),
            self.top.min(max.top),
        )
    }

    /// Off-axis perspective matrix, OpenGL clip convention (z in [-1, 1]).
    ///
    /// The frustum bounds at `z_near` are `-near·tan(left)`, `near·tan(right)`,
    /// `-near·tan(bottom)` and `near·tan(top)`.
    pub fn to_perspective_matrix(&self, z_near: f64, z_far: f64) -> Mat4 {
        let [tan_left, tan_right, tan_bottom, tan_top] = self.tan_angles();
        let left = -tan_left * z_near;
        let right = tan_right * z_near;
        let bottom = -tan_bottom * z_near;
        let top = tan_top * z_near;

        frustum(left, right, bottom, top, z_near, z_far).as_mat4()
    }
}

/// Column-major equivalent of `glFrustum`.
fn frustum(left: f64, right: f64, bottom: f64, top: f64, near: f64, far: f64) -> DMat4 {
    let x_scale = 2.0 * near / (right - left);
    let y_scale = 2.0 * near / (top - bottom);
    let x_offset = (right + left) / (right - left);
    let y_offset = (top + bottom) / (top - bottom);
    let z_scale = -(far + near) / (far - near);
    let z_offset = -2.0 * far * near / (far - near);

    DMat4::from_cols(
        DVec4::new(x_scale, 0.0, 0.0, 0.0),
        DVec4::new(0.0, y_scale, 0.0, 0.0),
        DVec4::new(x_offset, y_offset, z_scale, -1.0),
        DVec4::new(0.0, 0.0, z_offset, 0.0),
    )
}
