//! Stereo frame computation
//!
//! Each frame the controller reads the tracked head pose, derives the left
//! and right eye views by shifting half the inter-lens distance along X, and
//! (only when device parameters or modes changed) recomputes FOVs and
//! viewports. Drawing hands one [`EyeView`] per eye to the renderer.

use glam::{Mat4, Vec3};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use crate::error::{config_error, Result};
use crate::eye::{Eye, EyeType, EyeView};
use crate::fov::FieldOfView;
use crate::frame_gate::FrameGate;
use crate::head::{HeadTracker, HeadTransform};
use crate::hmd::HeadMountedDisplay;
use crate::lens_layout::{DistortionRenderer, LensViewportLayout};
use crate::viewport::Viewport;

/// Rendering switches and clip planes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StereoConfig {
    pub vr_mode_enabled: bool,
    pub distortion_correction_enabled: bool,
    pub z_near: f64,
    pub z_far: f64,
}

impl Default for StereoConfig {
    fn default() -> Self {
        Self {
            vr_mode_enabled: true,
            distortion_correction_enabled: true,
            z_near: 0.1,
            z_far: 100.0,
        }
    }
}

/// Renderer callbacks, invoked in order once per drawn frame:
/// `prepare_new_frame`, `draw_eye` per eye, `finish_frame`.
pub trait StereoRendererDelegate {
    fn prepare_new_frame(&mut self, head: &HeadTransform);

    /// Set viewport and scissor to `eye.viewport`, then draw the scene.
    fn draw_eye(&mut self, eye: &EyeView);

    /// Called with the full-screen viewport after all eyes are drawn.
    fn finish_frame(&mut self, viewport: &Viewport);

    fn renderer_did_change_size(&mut self, _width: i32, _height: i32) {}
}

/// Left and right eye view matrices for a head view.
///
/// The left eye shifts by `+half` along X and the right by `-half`, both
/// applied after the head transform.
pub fn eye_views(head_view: Mat4, inter_lens_distance: f64) -> (Mat4, Mat4) {
    let half = (inter_lens_distance * 0.5) as f32;
    let left = Mat4::from_translation(Vec3::new(half, 0.0, 0.0)) * head_view;
    let right = Mat4::from_translation(Vec3::new(-half, 0.0, 0.0)) * head_view;
    (left, right)
}

/// FOVs and viewports derived from one device profile.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProjectionLayout {
    pub left_fov: FieldOfView,
    pub right_fov: FieldOfView,
    pub monocular_fov: FieldOfView,
    pub monocular_viewport: Viewport,
    /// Side-by-side split; `None` when the distortion pass owns the layout.
    pub eye_viewports: Option<(Viewport, Viewport)>,
    pub eye_to_screen_distance: f64,
}

/// Pure projection step: no eye state is touched.
pub fn compute_projection(
    hmd: &HeadMountedDisplay,
    distortion_correction: bool,
) -> Result<ProjectionLayout> {
    hmd.validate()?;
    let screen = &hmd.screen;
    let eye_to_screen_distance = hmd.virtual_eye_to_screen_distance()?;
    let monocular_viewport = Viewport::new(0, 0, screen.width, screen.height)?;

    let (left_fov, eye_viewports) = if distortion_correction {
        (hmd.left_eye_visible_fov()?, None)
    } else {
        let half = screen.width / 2;
        let left = Viewport::new(0, 0, half, screen.height)?;
        let right = Viewport::new(half, 0, screen.width - half, screen.height)?;
        (hmd.left_eye_undistorted_fov()?, Some((left, right)))
    };

    Ok(ProjectionLayout {
        left_fov,
        right_fov: left_fov.mirrored(),
        monocular_fov: monocular_fov(&left_fov, screen.width, screen.height),
        monocular_viewport,
        eye_viewports,
        eye_to_screen_distance,
    })
}

fn monocular_fov(left_fov: &FieldOfView, width: i32, height: i32) -> FieldOfView {
    let vertical = left_fov.top.max(left_fov.bottom);
    let aspect = width as f64 / height as f64;
    let horizontal = (vertical.to_radians().tan() * aspect).atan().to_degrees();
    FieldOfView::new(horizontal, horizontal, vertical, vertical)
}

/// Result of one [`StereoController::render_frame`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameOutcome {
    Drawn,
    /// Paused, tracker not ready, or the distortion pass has no layout yet.
    NotReady,
    /// Another frame was still in flight.
    Skipped,
}

pub struct StereoController<R: DistortionRenderer = LensViewportLayout> {
    hmd: HeadMountedDisplay,
    config: StereoConfig,
    distortion_renderer: R,
    head_transform: HeadTransform,

    monocular_eye: Eye,
    left_eye: Eye,
    right_eye: Eye,

    gate: FrameGate,
    projection_changed: bool,
    distortion_renderer_ready: bool,
    geometry_valid: bool,
    paused: bool,
}

impl StereoController<LensViewportLayout> {
    pub fn new(hmd: HeadMountedDisplay, config: StereoConfig) -> Self {
        Self::with_distortion_renderer(hmd, config, LensViewportLayout::new())
    }
}

impl<R: DistortionRenderer> StereoController<R> {
    pub fn with_distortion_renderer(
        hmd: HeadMountedDisplay,
        config: StereoConfig,
        distortion_renderer: R,
    ) -> Self {
        info!(
            "Stereo controller for {} {} (vr={}, distortion={})",
            hmd.device.vendor,
            hmd.device.model,
            config.vr_mode_enabled,
            config.distortion_correction_enabled
        );
        Self {
            hmd,
            config,
            distortion_renderer,
            head_transform: HeadTransform::default(),
            monocular_eye: Eye::new(EyeType::Monocular),
            left_eye: Eye::new(EyeType::Left),
            right_eye: Eye::new(EyeType::Right),
            gate: FrameGate::new(),
            projection_changed: true,
            distortion_renderer_ready: false,
            geometry_valid: false,
            paused: false,
        }
    }

    pub fn hmd(&self) -> &HeadMountedDisplay {
        &self.hmd
    }

    pub fn config(&self) -> &StereoConfig {
        &self.config
    }

    pub fn head_transform(&self) -> &HeadTransform {
        &self.head_transform
    }

    pub fn left_eye(&self) -> &Eye {
        &self.left_eye
    }

    pub fn right_eye(&self) -> &Eye {
        &self.right_eye
    }

    pub fn monocular_eye(&self) -> &Eye {
        &self.monocular_eye
    }

    pub fn distortion_renderer(&self) -> &R {
        &self.distortion_renderer
    }

    /// Shared handle to the frame gate, for sequencing work between frames.
    pub fn frame_gate(&self) -> FrameGate {
        self.gate.clone()
    }

    pub fn is_projection_changed(&self) -> bool {
        self.projection_changed
    }

    /// Swap the device profile. Must happen between frames.
    pub fn set_hmd(&mut self, hmd: HeadMountedDisplay) -> Result<()> {
        hmd.validate()?;
        info!("Device profile changed to {} {}", hmd.device.vendor, hmd.device.model);
        self.hmd = hmd;
        self.projection_changed = true;
        Ok(())
    }

    pub fn set_distortion_correction_enabled(&mut self, enabled: bool) {
        if self.config.distortion_correction_enabled != enabled {
            self.config.distortion_correction_enabled = enabled;
            self.distortion_renderer_ready = false;
            self.projection_changed = true;
        }
    }

    pub fn set_vr_mode_enabled(&mut self, enabled: bool) {
        if self.config.vr_mode_enabled != enabled {
            self.config.vr_mode_enabled = enabled;
            self.projection_changed = true;
        }
    }

    pub fn set_paused(&mut self, paused: bool) {
        self.paused = paused;
    }

    /// New surface size in pixels; recomputes the layout on the next update.
    pub fn resize<D>(&mut self, width: i32, height: i32, delegate: &mut D) -> Result<()>
    where
        D: StereoRendererDelegate + ?Sized,
    {
        if width <= 0 || height <= 0 {
            return Err(config_error(format!(
                "surface size must be positive, got {width}x{height}"
            )));
        }
        self.hmd.screen.width = width;
        self.hmd.screen.height = height;
        self.projection_changed = true;
        delegate.renderer_did_change_size(width, height);
        Ok(())
    }

    /// Per-frame geometry. Returns `Ok(false)` when there is nothing to do.
    ///
    /// On error the previous geometry is kept but marked unusable, so the
    /// next draw is skipped.
    pub fn update<T>(&mut self, tracker: &T) -> Result<bool>
    where
        T: HeadTracker + ?Sized,
    {
        if self.paused || !tracker.is_ready() {
            return Ok(false);
        }

        match self.calculate_frame_parameters(tracker.last_head_view()) {
            Ok(()) => {
                self.geometry_valid = true;
                Ok(true)
            }
            Err(err) => {
                warn!("Stereo geometry failed, dropping frame: {}", err);
                self.geometry_valid = false;
                Err(err)
            }
        }
    }

    fn calculate_frame_parameters(&mut self, head_view: Mat4) -> Result<()> {
        self.head_transform = HeadTransform::new(head_view);

        let (left_view, right_view) = eye_views(head_view, self.hmd.device.inter_lens_distance);
        self.left_eye.view = left_view;
        self.right_eye.view = right_view;
        self.monocular_eye.view = head_view;

        if self.projection_changed {
            let distortion = self.config.distortion_correction_enabled;
            let layout = compute_projection(&self.hmd, distortion)?;

            if distortion {
                self.distortion_renderer.fov_did_change(
                    &self.hmd,
                    &layout.left_fov,
                    &layout.right_fov,
                    layout.eye_to_screen_distance,
                )?;
                self.distortion_renderer_ready = true;
            }

            self.apply_projection(&layout);
            self.projection_changed = false;

            info!(
                "Projection updated: left fov {:?}, right fov {:?}",
                layout.left_fov, layout.right_fov
            );
        }

        if self.config.distortion_correction_enabled && self.distortion_renderer.viewports_changed()
        {
            self.distortion_renderer
                .update_viewports(&mut self.left_eye.viewport, &mut self.right_eye.viewport)?;
        }

        Ok(())
    }

    fn apply_projection(&mut self, layout: &ProjectionLayout) {
        self.monocular_eye.viewport = layout.monocular_viewport;
        self.monocular_eye.set_fov(layout.monocular_fov);
        self.left_eye.set_fov(layout.left_fov);
        self.right_eye.set_fov(layout.right_fov);

        if let Some((left, right)) = layout.eye_viewports {
            self.left_eye.viewport = left;
            self.right_eye.viewport = right;
        }

        self.left_eye.mark_projection_changed();
        self.right_eye.mark_projection_changed();
        self.monocular_eye.mark_projection_changed();
    }

    fn can_draw(&self) -> bool {
        if self.paused || !self.geometry_valid {
            return false;
        }
        !self.config.distortion_correction_enabled || self.distortion_renderer_ready
    }

    /// Emit the current geometry to `delegate`. Returns whether anything was
    /// drawn.
    pub fn draw_frame<D>(&mut self, delegate: &mut D) -> FrameOutcome
    where
        D: StereoRendererDelegate + ?Sized,
    {
        if !self.can_draw() {
            return FrameOutcome::NotReady;
        }
        let Some(_ticket) = self.gate.try_begin() else {
            return FrameOutcome::Skipped;
        };
        self.emit_frame(delegate)
    }

    /// `update` followed by the draw, both under one frame ticket.
    pub fn render_frame<T, D>(&mut self, tracker: &T, delegate: &mut D) -> Result<FrameOutcome>
    where
        T: HeadTracker + ?Sized,
        D: StereoRendererDelegate + ?Sized,
    {
        let Some(_ticket) = self.gate.try_begin() else {
            return Ok(FrameOutcome::Skipped);
        };
        if !self.update(tracker)? || !self.can_draw() {
            return Ok(FrameOutcome::NotReady);
        }
        Ok(self.emit_frame(delegate))
    }

    // Caller holds the frame ticket.
    fn emit_frame<D>(&mut self, delegate: &mut D) -> FrameOutcome
    where
        D: StereoRendererDelegate + ?Sized,
    {
        let distortion = self.config.distortion_correction_enabled;
        if distortion {
            self.distortion_renderer.before_draw_frame();
        }

        delegate.prepare_new_frame(&self.head_transform);

        let (z_near, z_far) = (self.config.z_near, self.config.z_far);
        if self.config.vr_mode_enabled {
            let left = self.left_eye.snapshot(z_near, z_far);
            delegate.draw_eye(&left);
            let right = self.right_eye.snapshot(z_near, z_far);
            delegate.draw_eye(&right);
        } else {
            let mono = self.monocular_eye.snapshot(z_near, z_far);
            delegate.draw_eye(&mono);
        }

        if distortion {
            self.distortion_renderer.after_draw_frame();
        }

        delegate.finish_frame(&self.monocular_eye.viewport);
        debug!("Frame drawn");
        FrameOutcome::Drawn
    }
}
