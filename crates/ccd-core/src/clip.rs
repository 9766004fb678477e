use std::ops::Range;

use rayon::prelude::*;
use tracing::debug;

use crate::denoise::DenoiseParams;
use crate::error::{CcdError, Result};
use crate::filter::CcdFilter;
use crate::frame::{PlanarFrame, VideoFormat, VideoInfo};
use crate::pipeline::ProgressReporter;

/// Anything that can hand out frames on request: a decoded file, an
/// in-memory sequence, or another filter node.
///
/// Requests for different frames may arrive concurrently from worker threads.
pub trait FrameSource: Send + Sync {
    fn info(&self) -> VideoInfo;

    fn get_frame(&self, index: usize) -> Result<PlanarFrame>;

    fn frame_count(&self) -> usize {
        self.info().num_frames
    }
}

/// Fixed list of RGBS frames held in memory.
pub struct MemoryClip {
    frames: Vec<PlanarFrame>,
    info: VideoInfo,
}

impl MemoryClip {
    pub fn new(mut frames: Vec<PlanarFrame>) -> Result<Self> {
        let first = frames.first().ok_or(CcdError::EmptySequence)?;
        let (width, height) = (first.width(), first.height());

        for (index, frame) in frames.iter_mut().enumerate() {
            frame.check_planes()?;
            if frame.width() != width || frame.height() != height {
                return Err(CcdError::FrameMismatch {
                    width,
                    height,
                    got_width: frame.width(),
                    got_height: frame.height(),
                });
            }
            frame.metadata.frame_index = index;
        }

        let info = VideoInfo::fixed(
            VideoFormat::RGBS,
            width as u32,
            height as u32,
            frames.len(),
        );
        Ok(Self { frames, info })
    }
}

impl FrameSource for MemoryClip {
    fn info(&self) -> VideoInfo {
        self.info
    }

    fn get_frame(&self, index: usize) -> Result<PlanarFrame> {
        self.frames
            .get(index)
            .cloned()
            .ok_or(CcdError::FrameIndexOutOfRange {
                index,
                total: self.frames.len(),
            })
    }
}

/// A source wrapped in a CCD filter. Produces denoised frames on request and
/// is itself a `FrameSource`, so nodes can be chained.
pub struct CcdNode<S: FrameSource> {
    source: S,
    filter: CcdFilter,
}

impl<S: FrameSource> CcdNode<S> {
    /// Negotiate the filter against `source`. Fails if the source's format,
    /// dimensions, or `params` are not acceptable.
    pub fn new(source: S, params: &DenoiseParams) -> Result<Self> {
        let filter = CcdFilter::new(&source.info(), params)?;
        Ok(Self { source, filter })
    }

    pub fn filter(&self) -> &CcdFilter {
        &self.filter
    }

    pub fn source(&self) -> &S {
        &self.source
    }
}

impl<S: FrameSource> FrameSource for CcdNode<S> {
    fn info(&self) -> VideoInfo {
        *self.filter.info()
    }

    fn get_frame(&self, index: usize) -> Result<PlanarFrame> {
        let src = self.source.get_frame(index)?;
        let mut dst = self.filter.process(&src)?;
        dst.metadata = src.metadata;
        Ok(dst)
    }
}

/// Request every frame in `range` from `source`, in parallel, and return them
/// in index order. Stops at the first error.
pub fn render_frames<S: FrameSource + ?Sized>(
    source: &S,
    range: Range<usize>,
    reporter: &dyn ProgressReporter,
) -> Result<Vec<PlanarFrame>> {
    let total = source.frame_count();
    if range.end > total {
        return Err(CcdError::FrameIndexOutOfRange {
            index: range.end.saturating_sub(1),
            total,
        });
    }
    debug!(start = range.start, end = range.end, "Rendering frames");

    range
        .into_par_iter()
        .map(|i| {
            let frame = source.get_frame(i)?;
            reporter.advance(1);
            Ok(frame)
        })
        .collect()
}
