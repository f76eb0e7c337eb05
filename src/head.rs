//! Tracked head pose as consumed by the stereo engine
//!
//! Sensor fusion lives elsewhere; this module only defines what the engine
//! reads from it each frame.

use glam::{EulerRot, Mat4, Quat, Vec3};

/// Head view transform (world to head), overwritten once per frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HeadTransform {
    pub head_view: Mat4,
}

impl Default for HeadTransform {
    fn default() -> Self {
        Self {
            head_view: Mat4::IDENTITY,
        }
    }
}

impl HeadTransform {
    pub fn new(head_view: Mat4) -> Self {
        Self { head_view }
    }

    /// View transform for a head whose world orientation is `orientation`.
    pub fn from_orientation(orientation: Quat) -> Self {
        Self::new(Mat4::from_quat(orientation.inverse()))
    }

    /// Rotation part of the view transform.
    pub fn quaternion(&self) -> Quat {
        Quat::from_mat4(&self.head_view).normalize()
    }

    /// Head orientation in world space.
    pub fn orientation(&self) -> Quat {
        self.quaternion().inverse()
    }

    pub fn translation(&self) -> Vec3 {
        self.head_view.w_axis.truncate()
    }

    /// Direction the head looks at, in world space.
    pub fn forward_vector(&self) -> Vec3 {
        -self.head_view.row(2).truncate()
    }

    pub fn up_vector(&self) -> Vec3 {
        self.head_view.row(1).truncate()
    }

    pub fn right_vector(&self) -> Vec3 {
        self.head_view.row(0).truncate()
    }

    /// `(yaw, pitch, roll)` in radians.
    pub fn euler_angles(&self) -> (f32, f32, f32) {
        self.orientation().to_euler(EulerRot::YXZ)
    }
}

/// Source of head poses.
pub trait HeadTracker {
    /// Geometry is skipped until the tracker has a usable pose.
    fn is_ready(&self) -> bool;

    fn last_head_view(&self) -> Mat4;
}

/// Tracker that reports whatever pose it was last given.
#[derive(Debug, Clone)]
pub struct FixedHeadTracker {
    head_view: Mat4,
    ready: bool,
}

impl Default for FixedHeadTracker {
    fn default() -> Self {
        Self {
            head_view: Mat4::IDENTITY,
            ready: true,
        }
    }
}

impl FixedHeadTracker {
    pub fn new(head_view: Mat4) -> Self {
        Self {
            head_view,
            ready: true,
        }
    }

    pub fn set_orientation(&mut self, orientation: Quat) {
        self.head_view = HeadTransform::from_orientation(orientation).head_view;
    }

    pub fn set_ready(&mut self, ready: bool) {
        self.ready = ready;
    }
}

impl HeadTracker for FixedHeadTracker {
    fn is_ready(&self) -> bool {
        self.ready
    }

    fn last_head_view(&self) -> Mat4 {
        self.head_view
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::FRAC_PI_2;

    fn vec_approx(a: Vec3, b: Vec3) -> bool {
        (a - b).length() < 1e-5
    }

    #[test]
    fn identity_head_looks_down_negative_z() {
        let head = HeadTransform::default();
        assert!(vec_approx(head.forward_vector(), Vec3::NEG_Z));
        assert!(vec_approx(head.up_vector(), Vec3::Y));
        assert!(vec_approx(head.right_vector(), Vec3::X));
    }

    #[test]
    fn yaw_left_turns_forward_vector() {
        let head = HeadTransform::from_orientation(Quat::from_rotation_y(FRAC_PI_2));
        assert!(vec_approx(head.forward_vector(), Vec3::NEG_X));
        assert!(vec_approx(head.right_vector(), Vec3::NEG_Z));

        let (yaw, pitch, roll) = head.euler_angles();
        assert!((yaw - FRAC_PI_2).abs() < 1e-5);
        assert!(pitch.abs() < 1e-5 && roll.abs() < 1e-5);
    }

    #[test]
    fn orientation_round_trip() {
        let q = Quat::from_euler(EulerRot::YXZ, 0.3, -0.2, 0.1);
        let head = HeadTransform::from_orientation(q);
        assert!(head.orientation().angle_between(q) < 1e-5);
        assert!(head.translation().length() < 1e-6);
    }

    #[test]
    fn fixed_tracker_reports_readiness() {
        let mut tracker = FixedHeadTracker::default();
        assert!(tracker.is_ready());
        tracker.set_ready(false);
        assert!(!tracker.is_ready());
        tracker.set_orientation(Quat::from_rotation_x(0.5));
        assert_eq!(
            tracker.last_head_view(),
            Mat4::from_quat(Quat::from_rotation_x(0.5).inverse())
        );
    }
}
