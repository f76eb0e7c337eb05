//! Error type shared by the geometry engine.

use thiserror::Error;

/// Errors raised while computing stereo geometry.
///
/// Both kinds are fatal to the frame being computed: the controller keeps the
/// previous geometry and skips drawing.
#[derive(Debug, Error)]
pub enum StereoError {
    /// Device, screen or viewport parameters that cannot produce valid geometry.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The distortion inverse did not settle within the iteration bound.
    #[error("distortion inverse of r = {radius} did not converge after {iterations} iterations")]
    NumericDivergence { radius: f64, iterations: usize },

    /// Unknown built-in profile or malformed profile document.
    #[error("device profile error: {0}")]
    Profile(String),
}

impl From<serde_json::Error> for StereoError {
    fn from(err: serde_json::Error) -> Self {
        StereoError::Profile(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, StereoError>;

/// Shorthand for building a [`StereoError::Configuration`].
pub(crate) fn config_error(msg: impl Into<String>) -> StereoError {
    StereoError::Configuration(msg.into())
}
