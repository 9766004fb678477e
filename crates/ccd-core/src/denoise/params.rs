use serde::{Deserialize, Serialize};

use crate::consts::{DEFAULT_THRESHOLD, THRESHOLD_SCALE_SQ};
use crate::error::{CcdError, Result};

use super::geometry::KernelGeometry;

/// User-facing denoise settings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DenoiseParams {
    /// Color distance below which a neighbor joins the average, in 8-bit
    /// RGB units. 0 disables smoothing.
    pub threshold: f64,
    pub geometry: KernelGeometry,
}

impl Default for DenoiseParams {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
            geometry: KernelGeometry::default(),
        }
    }
}

impl DenoiseParams {
    pub fn new(threshold: f64) -> Self {
        Self {
            threshold,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<()> {
        if !self.threshold.is_finite() || self.threshold < 0.0 {
            return Err(CcdError::NegativeThreshold(self.threshold));
        }
        self.geometry.validate()
    }

    pub fn threshold_sq(&self) -> f32 {
        threshold_to_sq(self.threshold)
    }
}

/// Convert a user threshold into squared normalized RGB distance:
/// `(t / (255 * sqrt(3)))^2`.
pub fn threshold_to_sq(threshold: f64) -> f32 {
    (threshold * threshold / THRESHOLD_SCALE_SQ) as f32
}
