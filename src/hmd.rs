//! Head mounted display description
//!
//! A [`HeadMountedDisplay`] pairs the viewer's optics ([`DeviceParams`]) with
//! the phone screen it is used with ([`ScreenParams`]). Both are plain data,
//! loaded from built-in profiles or JSON, and replaced as a unit when the
//! user switches viewers.

use std::collections::HashMap;

use lazy_static::lazy_static;
use log::info;
use serde::{Deserialize, Serialize};

use crate::distortion::Distortion;
use crate::error::{config_error, Result, StereoError};
use crate::fov::FieldOfView;
use crate::viewport::Viewport;

const METERS_PER_INCH: f64 = 0.0254;

/// Optical constants of the viewer, all lengths in meters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceParams {
    pub vendor: String,
    pub model: String,
    pub inter_lens_distance: f64,
    pub vertical_distance_to_lens_center: f64,
    pub screen_to_lens_distance: f64,
    /// Largest half-angles the left lens can show; the right eye mirrors it.
    pub max_fov: FieldOfView,
    pub distortion: Distortion,
}

impl Default for DeviceParams {
    fn default() -> Self {
        Self {
            vendor: "Google, Inc.".to_string(),
            model: "Cardboard v1".to_string(),
            inter_lens_distance: 0.06,
            vertical_distance_to_lens_center: 0.035,
            screen_to_lens_distance: 0.042,
            max_fov: FieldOfView::symmetric(40.0),
            distortion: Distortion::default(),
        }
    }
}

impl DeviceParams {
    pub fn validate(&self) -> Result<()> {
        if !(self.screen_to_lens_distance.is_finite() && self.screen_to_lens_distance > 0.0) {
            return Err(config_error(format!(
                "screen to lens distance must be positive, got {}",
                self.screen_to_lens_distance
            )));
        }
        if !(self.inter_lens_distance.is_finite() && self.inter_lens_distance >= 0.0) {
            return Err(config_error(format!(
                "inter lens distance must be non-negative, got {}",
                self.inter_lens_distance
            )));
        }
        if !self.vertical_distance_to_lens_center.is_finite() {
            return Err(config_error("vertical distance to lens center must be finite"));
        }
        let FieldOfView {
            left,
            right,
            bottom,
            top,
        } = self.max_fov;
        if [left, right, bottom, top]
            .iter()
            .any(|a| !(a.is_finite() && (0.0..90.0).contains(a)))
        {
            return Err(config_error(format!(
                "max fov angles must lie in [0, 90) degrees, got {:?}",
                self.max_fov
            )));
        }
        self.distortion.validate()
    }
}

/// Phone display geometry: pixel resolution plus physical size in meters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScreenParams {
    pub width: i32,
    pub height: i32,
    pub width_meters: f64,
    pub height_meters: f64,
    /// Bezel between the bottom screen edge and the viewer tray.
    pub border_size_meters: f64,
}

impl Default for ScreenParams {
    fn default() -> Self {
        Self {
            width: 1920,
            height: 1080,
            width_meters: 0.110,
            height_meters: 0.062,
            border_size_meters: 0.003,
        }
    }
}

impl ScreenParams {
    /// Derive the physical size from pixel density.
    pub fn from_dpi(width: i32, height: i32, xdpi: f64, ydpi: f64) -> Result<Self> {
        if !(xdpi > 0.0 && ydpi > 0.0) {
            return Err(config_error(format!(
                "screen dpi must be positive, got {xdpi}x{ydpi}"
            )));
        }
        let params = Self {
            width,
            height,
            width_meters: width as f64 * METERS_PER_INCH / xdpi,
            height_meters: height as f64 * METERS_PER_INCH / ydpi,
            ..Self::default()
        };
        params.validate()?;
        Ok(params)
    }

    pub fn meters_per_pixel_x(&self) -> f64 {
        self.width_meters / self.width as f64
    }

    pub fn meters_per_pixel_y(&self) -> f64 {
        self.height_meters / self.height as f64
    }

    pub fn validate(&self) -> Result<()> {
        if self.width <= 0 || self.height <= 0 {
            return Err(config_error(format!(
                "screen resolution must be positive, got {}x{}",
                self.width, self.height
            )));
        }
        if !(self.width_meters.is_finite()
            && self.height_meters.is_finite()
            && self.width_meters > 0.0
            && self.height_meters > 0.0)
        {
            return Err(config_error(format!(
                "screen size must be finite and positive, got {}x{} m",
                self.width_meters, self.height_meters
            )));
        }
        if !(self.border_size_meters.is_finite() && self.border_size_meters >= 0.0) {
            return Err(config_error(format!(
                "border size must be non-negative, got {}",
                self.border_size_meters
            )));
        }
        Ok(())
    }
}

lazy_static! {
    static ref PROFILES: HashMap<&'static str, DeviceParams> = {
        let mut profiles = HashMap::new();
        profiles.insert("cardboard-v1", DeviceParams::default());
        profiles.insert(
            "cardboard-v2",
            DeviceParams {
                model: "Cardboard v2".to_string(),
                inter_lens_distance: 0.064,
                vertical_distance_to_lens_center: 0.035,
                screen_to_lens_distance: 0.039,
                max_fov: FieldOfView::symmetric(60.0),
                distortion: Distortion::with_coefficients(&[0.34, 0.55])
                    .unwrap_or_default(),
                ..DeviceParams::default()
            },
        );
        profiles
    };
}

/// Built-in viewer profile by name (`"cardboard-v1"`, `"cardboard-v2"`).
pub fn profile(name: &str) -> Result<DeviceParams> {
    PROFILES
        .get(name)
        .cloned()
        .ok_or_else(|| StereoError::Profile(format!("unknown device profile '{name}'")))
}

pub fn profile_names() -> Vec<&'static str> {
    let mut names: Vec<_> = PROFILES.keys().copied().collect();
    names.sort_unstable();
    names
}

/// Linear extents of the left eye's screen half, measured from its lens
/// center on the screen plane.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LensExtents {
    pub outer: f64,
    pub inner: f64,
    pub bottom: f64,
    pub top: f64,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct HeadMountedDisplay {
    pub screen: ScreenParams,
    pub device: DeviceParams,
}

impl HeadMountedDisplay {
    pub fn new(screen: ScreenParams, device: DeviceParams) -> Result<Self> {
        let hmd = Self { screen, device };
        hmd.validate()?;
        Ok(hmd)
    }

    pub fn from_profile(name: &str, screen: ScreenParams) -> Result<Self> {
        let hmd = Self::new(screen, profile(name)?)?;
        info!(
            "Loaded device profile '{}' ({} {})",
            name, hmd.device.vendor, hmd.device.model
        );
        Ok(hmd)
    }

    /// Parse and validate a JSON profile. Missing fields take defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        let hmd: Self = serde_json::from_str(json)?;
        hmd.validate()?;
        Ok(hmd)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<()> {
        self.screen.validate()?;
        self.device.validate()?;
        self.checked_extents().map(|_| ())
    }

    /// Distance from the eye's optical center to the (virtual) screen plane.
    pub fn virtual_eye_to_screen_distance(&self) -> Result<f64> {
        let distance = self.device.screen_to_lens_distance;
        if !(distance.is_finite() && distance > 0.0) {
            return Err(config_error(format!(
                "eye to screen distance must be positive, got {distance}"
            )));
        }
        Ok(distance)
    }

    /// Height of the lens center above the screen's vertical midpoint.
    pub fn vertical_lens_offset(&self) -> f64 {
        (self.device.vertical_distance_to_lens_center - self.screen.border_size_meters)
            - self.screen.height_meters / 2.0
    }

    pub fn left_eye_extents(&self) -> LensExtents {
        let inter_lens = self.device.inter_lens_distance;
        let vertical = self.device.vertical_distance_to_lens_center;
        let border = self.screen.border_size_meters;
        LensExtents {
            outer: (self.screen.width_meters - inter_lens) / 2.0,
            inner: inter_lens / 2.0,
            bottom: vertical - border,
            top: self.screen.height_meters + border - vertical,
        }
    }

    /// Extents of the left eye's half, refusing lens placements that fall
    /// off the screen.
    fn checked_extents(&self) -> Result<LensExtents> {
        let e = self.left_eye_extents();
        if [e.outer, e.inner, e.bottom, e.top]
            .iter()
            .any(|d| !(d.is_finite() && *d >= 0.0))
        {
            return Err(config_error(format!(
                "lens center lies outside the screen half: {e:?}"
            )));
        }
        Ok(e)
    }

    /// FOV seen through the lens: each screen extent is pushed through the
    /// forward distortion and capped at the device maximum.
    pub fn left_eye_visible_fov(&self) -> Result<FieldOfView> {
        let eye_to_screen = self.virtual_eye_to_screen_distance()?;
        let distortion = &self.device.distortion;
        let angle = |d: f64| distortion.distort(d / eye_to_screen).atan().to_degrees();

        let e = self.checked_extents()?;
        let fov = FieldOfView::new(angle(e.outer), angle(e.inner), angle(e.bottom), angle(e.top))
            .clamped_to(&self.device.max_fov);
        ensure_finite(&fov)?;
        Ok(fov)
    }

    /// FOV of the bare screen half with no lens in the way.
    pub fn left_eye_undistorted_fov(&self) -> Result<FieldOfView> {
        let eye_to_screen = self.virtual_eye_to_screen_distance()?;
        let angle = |d: f64| d.atan2(eye_to_screen).to_degrees();

        let e = self.checked_extents()?;
        let fov = FieldOfView::new(angle(e.outer), angle(e.inner), angle(e.bottom), angle(e.top));
        ensure_finite(&fov)?;
        Ok(fov)
    }

    /// Undistorted FOV that maps onto the visible lens area: the device
    /// maximum pulled back through the inverse distortion, intersected with
    /// the undistorted screen extents.
    pub fn left_eye_no_lens_fov(&self) -> Result<FieldOfView> {
        let eye_to_screen = self.virtual_eye_to_screen_distance()?;
        let distortion = &self.device.distortion;
        let [max_left, max_right, max_bottom, max_top] = self.device.max_fov.tan_angles();

        let e = self.checked_extents()?;
        let left = distortion.distort_inverse(max_left)?.min(e.outer / eye_to_screen);
        let right = distortion.distort_inverse(max_right)?.min(e.inner / eye_to_screen);
        let bottom = distortion.distort_inverse(max_bottom)?.min(e.bottom / eye_to_screen);
        let top = distortion.distort_inverse(max_top)?.min(e.top / eye_to_screen);

        Ok(FieldOfView::from_tan_angles(left, right, bottom, top))
    }

    /// Pixel rectangle of the left screen half covered by `fov` (usually
    /// [`Self::left_eye_no_lens_fov`]).
    pub fn left_eye_visible_screen_rect(&self, fov: &FieldOfView) -> Result<Viewport> {
        let distance = self.virtual_eye_to_screen_distance()?;
        let [tan_left, tan_right, tan_bottom, tan_top] = fov.tan_angles();

        let e = self.checked_extents()?;
        let eye_x = e.outer;
        let eye_y = e.bottom;

        let px_x = |m: f64| (m / self.screen.meters_per_pixel_x()).round() as i32;
        let px_y = |m: f64| (m / self.screen.meters_per_pixel_y()).round() as i32;

        let left = px_x(eye_x - tan_left * distance);
        let right = px_x(eye_x + tan_right * distance);
        let bottom = px_y(eye_y - tan_bottom * distance);
        let top = px_y(eye_y + tan_top * distance);

        Viewport::new(left, bottom, right - left, top - bottom)
    }
}

fn ensure_finite(fov: &FieldOfView) -> Result<()> {
    if [fov.left, fov.right, fov.bottom, fov.top]
        .iter()
        .all(|a| a.is_finite())
    {
        Ok(())
    } else {
        Err(config_error(format!("computed fov is not finite: {fov:?}")))
    }
}
