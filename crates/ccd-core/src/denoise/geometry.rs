use std::sync::OnceLock;

use serde::{Deserialize, Serialize};

use crate::consts::{DEFAULT_RADIUS, DEFAULT_STEP, MAX_AXIS_TAPS};
use crate::error::{CcdError, Result};

/// Shape of the sparse neighbor grid sampled around every pixel.
///
/// Offsets run from `-radius` to `+radius` in increments of `step` on both
/// axes. The default `{ radius: 12, step: 8 }` samples `{-12, -4, 4, 12}`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KernelGeometry {
    pub radius: usize,
    pub step: usize,
}

impl Default for KernelGeometry {
    fn default() -> Self {
        Self {
            radius: DEFAULT_RADIUS,
            step: DEFAULT_STEP,
        }
    }
}

impl KernelGeometry {
    pub fn validate(&self) -> Result<()> {
        if self.radius == 0 {
            return Err(CcdError::InvalidGeometry(
                "radius must be at least 1".into(),
            ));
        }
        if self.step == 0 {
            return Err(CcdError::InvalidGeometry("step must be at least 1".into()));
        }
        if (2 * self.radius) % self.step != 0 {
            return Err(CcdError::InvalidGeometry(format!(
                "step {} must evenly divide 2 * radius ({})",
                self.step,
                2 * self.radius
            )));
        }
        let taps = self.axis_taps();
        if taps > MAX_AXIS_TAPS {
            return Err(CcdError::InvalidGeometry(format!(
                "{taps} samples per axis exceeds the maximum of {MAX_AXIS_TAPS}"
            )));
        }
        Ok(())
    }

    /// Number of sampled offsets along one axis.
    pub fn axis_taps(&self) -> usize {
        (2 * self.radius)
            .checked_div(self.step)
            .map_or(0, |n| n + 1)
    }

    /// Offsets along one axis, ascending.
    pub fn axis_offsets(&self) -> Vec<isize> {
        let r = self.radius as isize;
        (0..self.axis_taps())
            .map(|i| -r + (i * self.step) as isize)
            .collect()
    }

    /// Every `(dy, dx)` pair of the grid, row-major, excluding `(0, 0)`.
    ///
    /// The center pixel is accounted for separately, so a grid that lands on
    /// zero in both axes must not count it a second time.
    pub fn offsets(&self) -> Vec<(isize, isize)> {
        let axis = self.axis_offsets();
        axis.iter()
            .flat_map(|&dy| axis.iter().map(move |&dx| (dy, dx)))
            .filter(|&off| off != (0, 0))
            .collect()
    }

    /// Largest possible contributor count: the center plus every offset.
    pub fn max_weight(&self) -> usize {
        1 + self.offsets().len()
    }
}

/// `1/n` for every contributor count the kernel can produce.
///
/// Index 0 is unused and holds 0.0.
#[derive(Clone, Debug, PartialEq)]
pub struct ReciprocalTable {
    values: Vec<f64>,
}

impl ReciprocalTable {
    pub fn for_max_weight(max_weight: usize) -> Self {
        let values = (0..=max_weight)
            .map(|n| if n == 0 { 0.0 } else { 1.0 / n as f64 })
            .collect();
        Self { values }
    }

    /// Table for the default geometry, built on first use and shared by
    /// every kernel afterwards.
    pub fn canonical() -> &'static ReciprocalTable {
        static TABLE: OnceLock<ReciprocalTable> = OnceLock::new();
        TABLE.get_or_init(|| Self::for_max_weight(KernelGeometry::default().max_weight()))
    }

    #[inline]
    pub fn get(&self, n: usize) -> f64 {
        self.values[n]
    }

    pub fn max_weight(&self) -> usize {
        self.values.len() - 1
    }
}
