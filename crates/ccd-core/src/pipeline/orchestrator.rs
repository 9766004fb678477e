use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info};

use crate::clip::{render_frames, CcdNode};
use crate::error::{CcdError, Result};
use crate::filter::CcdFilter;
use crate::io::image_io::{image_video_info, load_color_image, save_color_image};
use crate::io::ser::SerReader;
use crate::io::ser_writer::SerWriter;

use super::config::{InputKind, PipelineConfig};
use super::types::{NoOpReporter, PipelineStage, ProgressReporter};

/// What a pipeline run produced.
#[derive(Clone, Debug)]
pub struct PipelineSummary {
    pub kind: InputKind,
    pub frames: usize,
    pub width: u32,
    pub height: u32,
    pub output: PathBuf,
}

/// Denoise `config.input` into `config.output`, reporting progress.
///
/// Parameters and the input format are validated before any frame is
/// processed or any output file is created.
pub fn run_pipeline_reported(
    config: &PipelineConfig,
    reporter: Arc<dyn ProgressReporter>,
) -> Result<PipelineSummary> {
    config.denoise.validate()?;

    let kind = InputKind::from_path(&config.input);
    info!(
        input = %config.input.display(),
        output = %config.output.display(),
        kind = %kind,
        threshold = config.denoise.threshold,
        "Starting CCD pipeline"
    );

    match kind {
        InputKind::Video => run_video(config, reporter.as_ref()),
        InputKind::Image => run_image(config, reporter.as_ref()),
    }
}

/// Run the pipeline without progress reporting.
pub fn run_pipeline(config: &PipelineConfig) -> Result<PipelineSummary> {
    run_pipeline_reported(config, Arc::new(NoOpReporter))
}

fn run_video(config: &PipelineConfig, reporter: &dyn ProgressReporter) -> Result<PipelineSummary> {
    // The reader maps the input; creating the writer on the same file would
    // truncate it underneath the mapping.
    if same_file(&config.input, &config.output) {
        return Err(CcdError::OutputIsInput(config.output.clone()));
    }

    reporter.begin_stage(PipelineStage::Reading, None);
    let reader = SerReader::open(&config.input)?;
    let total = reader.frame_count();
    let header = reader.header.clone();
    info!(
        total_frames = total,
        width = header.width,
        height = header.height,
        bit_depth = header.pixel_depth,
        mode = ?header.color_mode(),
        "Reading SER file"
    );
    reporter.finish_stage();

    reporter.begin_stage(PipelineStage::Validating, None);
    let node = CcdNode::new(reader, &config.denoise)?;
    reporter.finish_stage();

    if total == 0 {
        return Err(CcdError::EmptySequence);
    }

    let mut writer = SerWriter::create(&config.output, &header)?;
    let batch = config.batch_size.max(1);

    reporter.begin_stage(PipelineStage::Denoising, Some(total));
    let mut start = 0;
    while start < total {
        let end = (start + batch).min(total);
        let frames = render_frames(&node, start..end, reporter)?;
        for frame in &frames {
            writer.write_frame(frame)?;
        }
        debug!(start, end, "Batch written");
        start = end;
    }
    reporter.finish_stage();

    reporter.begin_stage(PipelineStage::Writing, None);
    if let Some(timestamps) = node.source().timestamps() {
        writer.write_timestamps(&timestamps)?;
    }
    writer.finalize()?;
    reporter.finish_stage();

    info!(frames = total, output = %config.output.display(), "SER denoise complete");
    Ok(PipelineSummary {
        kind: InputKind::Video,
        frames: total,
        width: header.width,
        height: header.height,
        output: config.output.clone(),
    })
}

fn run_image(config: &PipelineConfig, reporter: &dyn ProgressReporter) -> Result<PipelineSummary> {
    reporter.begin_stage(PipelineStage::Reading, None);
    let frame = load_color_image(&config.input)?;
    info!(width = frame.width(), height = frame.height(), "Loaded image");
    reporter.finish_stage();

    reporter.begin_stage(PipelineStage::Validating, None);
    let info = image_video_info(&frame);
    let filter = CcdFilter::new(&info, &config.denoise)?;
    reporter.finish_stage();

    reporter.begin_stage(PipelineStage::Denoising, Some(1));
    let denoised = filter.process(&frame)?;
    reporter.advance(1);
    reporter.finish_stage();

    reporter.begin_stage(PipelineStage::Writing, None);
    save_color_image(&denoised, &config.output)?;
    reporter.finish_stage();

    info!(output = %config.output.display(), "Image denoise complete");
    Ok(PipelineSummary {
        kind: InputKind::Image,
        frames: 1,
        width: frame.width() as u32,
        height: frame.height() as u32,
        output: config.output.clone(),
    })
}

/// Whether `a` and `b` name the same existing file, through symlinks and,
/// on Unix, hard links.
fn same_file(a: &Path, b: &Path) -> bool {
    let (Ok(ca), Ok(cb)) = (a.canonicalize(), b.canonicalize()) else {
        return false;
    };
    if ca == cb {
        return true;
    }
    #[cfg(unix)]
    {
        use std::os::unix::fs::MetadataExt;
        if let (Ok(ma), Ok(mb)) = (ca.metadata(), cb.metadata()) {
            return ma.dev() == mb.dev() && ma.ino() == mb.ino();
        }
    }
    false
}
