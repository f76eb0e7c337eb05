//! Distortion pass collaborator
//!
//! In distortion-corrected mode both eyes are rendered into an offscreen
//! texture that a mesh pass later warps onto the screen. The collaborator
//! owning that pass decides how the texture is split between the eyes.
//! [`LensViewportLayout`] is the CPU side of that split; a GPU renderer can
//! wrap it or implement [`DistortionRenderer`] itself.

use log::{debug, info};

use crate::error::{config_error, Result};
use crate::fov::FieldOfView;
use crate::hmd::HeadMountedDisplay;
use crate::viewport::Viewport;

pub trait DistortionRenderer {
    /// Called whenever the per-eye FOVs are recomputed.
    fn fov_did_change(
        &mut self,
        hmd: &HeadMountedDisplay,
        left_fov: &FieldOfView,
        right_fov: &FieldOfView,
        eye_to_screen_distance: f64,
    ) -> Result<()>;

    /// True when the eye viewports should be re-fetched.
    fn viewports_changed(&self) -> bool;

    /// Overwrite the eye viewports with the collaborator's layout.
    fn update_viewports(&mut self, left: &mut Viewport, right: &mut Viewport) -> Result<()>;

    fn before_draw_frame(&mut self) {}

    fn after_draw_frame(&mut self) {}
}

/// Eye rectangle in tangent-angle units.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TanViewport {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    /// Position of the optical axis inside the texture.
    pub eye_x: f64,
    pub eye_y: f64,
}

impl TanViewport {
    fn for_eye(fov: &FieldOfView, x_offset: f64) -> Self {
        let [left, right, bottom, top] = fov.tan_angles();
        Self {
            x: x_offset,
            y: 0.0,
            width: left + right,
            height: bottom + top,
            eye_x: left + x_offset,
            eye_y: bottom,
        }
    }

    fn to_pixels(self, x_px_per_tan: f64, y_px_per_tan: f64) -> Result<Viewport> {
        Viewport::new(
            (self.x * x_px_per_tan).round() as i32,
            (self.y * y_px_per_tan).round() as i32,
            (self.width * x_px_per_tan).round() as i32,
            (self.height * y_px_per_tan).round() as i32,
        )
    }
}

/// Side-by-side split of the offscreen texture: left eye at x = 0, right eye
/// immediately to its right, both sized by their FOV tangents.
#[derive(Debug, Clone, Default)]
pub struct LensViewportLayout {
    left: TanViewport,
    right: TanViewport,
    x_px_per_tan: f64,
    y_px_per_tan: f64,
    texture_size: (i32, i32),
    viewports_changed: bool,
}

impl LensViewportLayout {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn left_eye(&self) -> &TanViewport {
        &self.left
    }

    pub fn right_eye(&self) -> &TanViewport {
        &self.right
    }

    /// Offscreen texture size in pixels.
    pub fn texture_size(&self) -> (i32, i32) {
        self.texture_size
    }
}

impl DistortionRenderer for LensViewportLayout {
    fn fov_did_change(
        &mut self,
        hmd: &HeadMountedDisplay,
        left_fov: &FieldOfView,
        right_fov: &FieldOfView,
        eye_to_screen_distance: f64,
    ) -> Result<()> {
        if !(eye_to_screen_distance.is_finite() && eye_to_screen_distance > 0.0) {
            return Err(config_error(format!(
                "eye to screen distance must be positive, got {eye_to_screen_distance}"
            )));
        }

        // The warp mesh looks up every screen vertex through the inverse
        // distortion; the farthest corner of an eye's half is the worst case.
        let extents = hmd.left_eye_extents();
        let corner = extents.outer.max(extents.inner).hypot(extents.bottom.max(extents.top));
        hmd.device
            .distortion
            .distort_inverse(corner / eye_to_screen_distance)?;

        let left = TanViewport::for_eye(left_fov, 0.0);
        let right = TanViewport::for_eye(right_fov, left.width);

        self.x_px_per_tan = eye_to_screen_distance / hmd.screen.meters_per_pixel_x();
        self.y_px_per_tan = eye_to_screen_distance / hmd.screen.meters_per_pixel_y();

        let texture_width = ((left.width + right.width) * self.x_px_per_tan).round() as i32;
        let texture_height = (left.height.max(right.height) * self.y_px_per_tan).round() as i32;

        self.left = left;
        self.right = right;
        self.texture_size = (texture_width, texture_height);
        self.viewports_changed = true;

        info!(
            "Distortion layout: texture {}x{} px, {:.1} px per tan unit",
            texture_width, texture_height, self.x_px_per_tan
        );
        Ok(())
    }

    fn viewports_changed(&self) -> bool {
        self.viewports_changed
    }

    fn update_viewports(&mut self, left: &mut Viewport, right: &mut Viewport) -> Result<()> {
        let new_left = self.left.to_pixels(self.x_px_per_tan, self.y_px_per_tan)?;
        let new_right = self.right.to_pixels(self.x_px_per_tan, self.y_px_per_tan)?;
        *left = new_left;
        *right = new_right;
        self.viewports_changed = false;
        debug!("Eye viewports from distortion layout: {:?} / {:?}", left, right);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StereoError;

    fn approx_eq(a: f64, b: f64, tol: f64) -> bool {
        (a - b).abs() <= tol
    }

    #[test]
    fn layout_places_right_eye_after_left() {
        let hmd = HeadMountedDisplay::default();
        let left_fov = hmd.left_eye_visible_fov().unwrap();
        let right_fov = left_fov.mirrored();
        let distance = hmd.virtual_eye_to_screen_distance().unwrap();

        let mut layout = LensViewportLayout::new();
        assert!(!layout.viewports_changed());
        layout
            .fov_did_change(&hmd, &left_fov, &right_fov, distance)
            .unwrap();
        assert!(layout.viewports_changed());

        // mirrored FOVs give equal widths
        assert!(approx_eq(layout.left_eye().width, layout.right_eye().width, 1e-12));
        assert!(approx_eq(layout.right_eye().x, layout.left_eye().width, 1e-12));

        let mut left = Viewport::default();
        let mut right = Viewport::default();
        layout.update_viewports(&mut left, &mut right).unwrap();
        assert!(!layout.viewports_changed());

        assert_eq!(left.x, 0);
        assert!((right.x - left.right()).abs() <= 1);
        let (tex_w, tex_h) = layout.texture_size();
        assert!((right.right() - tex_w).abs() <= 1);
        assert!((left.height - tex_h).abs() <= 1);
    }

    #[test]
    fn tan_viewport_tracks_optical_axis() {
        let fov = FieldOfView::new(45.0, 30.0, 45.0, 20.0);
        let vp = TanViewport::for_eye(&fov, 0.5);
        assert!(approx_eq(vp.eye_x, 1.5, 1e-12));
        assert!(approx_eq(vp.eye_y, 1.0, 1e-12));
    }

    #[test]
    fn bad_distance_is_rejected() {
        let hmd = HeadMountedDisplay::default();
        let fov = FieldOfView::symmetric(40.0);
        let mut layout = LensViewportLayout::new();
        assert!(matches!(
            layout.fov_did_change(&hmd, &fov, &fov, 0.0),
            Err(StereoError::Configuration(_))
        ));
        assert!(!layout.viewports_changed());
    }

    #[test]
    fn non_invertible_lens_is_reported() {
        let mut hmd = HeadMountedDisplay::default();
        hmd.device.distortion = crate::distortion::Distortion::with_coefficients(&[1e300]).unwrap();
        let fov = FieldOfView::symmetric(40.0);
        let mut layout = LensViewportLayout::new();
        assert!(matches!(
            layout.fov_did_change(&hmd, &fov, &fov, 0.042),
            Err(StereoError::NumericDivergence { .. })
        ));
    }
}
