use tracing::debug;

use crate::denoise::{DenoiseKernel, DenoiseParams};
use crate::error::{CcdError, Result};
use crate::frame::{PlanarFrame, VideoFormat, VideoInfo};

/// A denoise filter negotiated against a specific clip.
///
/// Construction checks the clip format, its dimensions and the parameters.
/// Any failure returns an error and no filter exists, so frames are never
/// processed under a rejected configuration.
#[derive(Clone, Debug)]
pub struct CcdFilter {
    info: VideoInfo,
    width: usize,
    height: usize,
    kernel: DenoiseKernel,
}

impl CcdFilter {
    pub fn new(info: &VideoInfo, params: &DenoiseParams) -> Result<Self> {
        let format = info.format.ok_or(CcdError::VariableFormat)?;
        let (width, height) = match (info.width, info.height) {
            (Some(w), Some(h)) => (w, h),
            _ => return Err(CcdError::VariableResolution),
        };

        if format.is_subsampled() {
            return Err(CcdError::SubsampledChroma(format.to_string()));
        }
        if format != VideoFormat::RGBS {
            return Err(CcdError::UnsupportedFormat(format.to_string()));
        }

        let min = params.geometry.radius;
        if (width as usize) < min || (height as usize) < min {
            return Err(CcdError::FrameTooSmall { width, height, min });
        }

        let kernel = DenoiseKernel::new(params)?;
        debug!(
            width,
            height,
            threshold = params.threshold,
            threshold_sq = kernel.threshold_sq(),
            radius = params.geometry.radius,
            step = params.geometry.step,
            "CCD filter configured"
        );

        Ok(Self {
            info: *info,
            width: width as usize,
            height: height as usize,
            kernel,
        })
    }

    pub fn info(&self) -> &VideoInfo {
        &self.info
    }

    pub fn kernel(&self) -> &DenoiseKernel {
        &self.kernel
    }

    /// Denoise one frame of the negotiated clip.
    pub fn process(&self, src: &PlanarFrame) -> Result<PlanarFrame> {
        src.check_planes()?;
        if src.width() != self.width || src.height() != self.height {
            return Err(CcdError::FrameMismatch {
                width: self.width,
                height: self.height,
                got_width: src.width(),
                got_height: src.height(),
            });
        }
        Ok(self.kernel.apply(src))
    }
}
