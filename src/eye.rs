//! Per-eye state and the snapshot handed to renderers

use bytemuck::{Pod, Zeroable};
use glam::Mat4;
use log::trace;

use crate::fov::FieldOfView;
use crate::viewport::Viewport;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EyeType {
    Monocular,
    Left,
    Right,
}

/// One eye: view transform, viewport, FOV and a cached projection.
///
/// The cached perspective is valid only while the projection is clean and
/// the requested near/far pair equals the cached one. Any FOV change marks
/// the projection dirty.
#[derive(Debug, Clone)]
pub struct Eye {
    eye_type: EyeType,
    pub view: Mat4,
    pub viewport: Viewport,
    fov: FieldOfView,

    perspective: Mat4,
    last_z_near: f64,
    last_z_far: f64,
    projection_changed: bool,
    perspective_computations: u64,
}

impl Eye {
    pub fn new(eye_type: EyeType) -> Self {
        Self {
            eye_type,
            view: Mat4::IDENTITY,
            viewport: Viewport::default(),
            fov: FieldOfView::default(),
            perspective: Mat4::IDENTITY,
            last_z_near: 0.0,
            last_z_far: 0.0,
            projection_changed: true,
            perspective_computations: 0,
        }
    }

    pub fn eye_type(&self) -> EyeType {
        self.eye_type
    }

    pub fn fov(&self) -> &FieldOfView {
        &self.fov
    }

    pub fn set_fov(&mut self, fov: FieldOfView) {
        self.fov = fov;
        self.projection_changed = true;
    }

    pub fn mark_projection_changed(&mut self) {
        self.projection_changed = true;
    }

    pub fn is_projection_changed(&self) -> bool {
        self.projection_changed
    }

    /// How many times the perspective matrix has actually been rebuilt.
    pub fn perspective_computations(&self) -> u64 {
        self.perspective_computations
    }

    pub fn calculate_perspective(&mut self, z_near: f64, z_far: f64) -> Mat4 {
        if !self.projection_changed && self.last_z_near == z_near && self.last_z_far == z_far {
            return self.perspective;
        }

        self.perspective = self.fov.to_perspective_matrix(z_near, z_far);
        self.last_z_near = z_near;
        self.last_z_far = z_far;
        self.projection_changed = false;
        self.perspective_computations += 1;

        trace!(
            "{:?} eye perspective rebuilt (near={}, far={}, fov={:?})",
            self.eye_type,
            z_near,
            z_far,
            self.fov
        );

        self.perspective
    }

    /// Immutable per-frame record for the renderer.
    pub fn snapshot(&mut self, z_near: f64, z_far: f64) -> EyeView {
        let projection = self.calculate_perspective(z_near, z_far);
        EyeView {
            eye_type: self.eye_type,
            view: self.view,
            projection,
            viewport: self.viewport,
            fov: self.fov,
        }
    }
}

/// What a renderer needs to draw one eye.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EyeView {
    pub eye_type: EyeType,
    pub view: Mat4,
    pub projection: Mat4,
    pub viewport: Viewport,
    pub fov: FieldOfView,
}

impl EyeView {
    pub fn view_projection(&self) -> Mat4 {
        self.projection * self.view
    }

    pub fn uniforms(&self) -> EyeUniforms {
        EyeUniforms {
            view_proj: self.view_projection().to_cols_array_2d(),
            viewport: self.viewport.to_rect(),
        }
    }
}

// Eye uniforms
#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub struct EyeUniforms {
    pub view_proj: [[f32; 4]; 4],
    pub viewport: [f32; 4], // x, y, width, height in pixels
}
