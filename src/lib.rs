//! HMD Stereo - stereo geometry and lens distortion engine for phone-based
//! VR viewers
//!
//! Turns a tracked head pose plus the viewer's optical constants into per-eye
//! view matrices, field-of-view angles, projection matrices and viewports,
//! then hands each eye to a caller-supplied renderer.
//!
//! ```no_run
//! use hmd_stereo::{FixedHeadTracker, HeadMountedDisplay, ScreenParams, StereoConfig, StereoController};
//!
//! let hmd = HeadMountedDisplay::from_profile("cardboard-v1", ScreenParams::default())?;
//! let mut controller = StereoController::new(hmd, StereoConfig::default());
//! controller.update(&FixedHeadTracker::default())?;
//! let left = controller.left_eye().fov();
//! # Ok::<(), hmd_stereo::StereoError>(())
//! ```

pub mod distortion;
pub mod error;
pub mod eye;
pub mod fov;
pub mod frame_gate;
pub mod head;
pub mod hmd;
pub mod lens_layout;
pub mod logging;
pub mod stereo;
pub mod vector3d;
pub mod viewport;

pub use distortion::Distortion;
pub use error::{Result, StereoError};
pub use eye::{Eye, EyeType, EyeUniforms, EyeView};
pub use fov::FieldOfView;
pub use frame_gate::{FrameGate, FrameTicket};
pub use head::{FixedHeadTracker, HeadTracker, HeadTransform};
pub use hmd::{DeviceParams, HeadMountedDisplay, ScreenParams};
pub use lens_layout::{DistortionRenderer, LensViewportLayout};
pub use stereo::{
    compute_projection, eye_views, FrameOutcome, ProjectionLayout, StereoConfig,
    StereoController, StereoRendererDelegate,
};
pub use vector3d::Vector3d;
pub use viewport::Viewport;
