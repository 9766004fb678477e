use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use ccd_core::denoise::DenoiseParams;
use ccd_core::pipeline::config::{InputKind, PipelineConfig};
use ccd_core::pipeline::{run_pipeline_reported, PipelineStage, ProgressReporter};
use clap::Args;
use indicatif::{ProgressBar, ProgressStyle};

use crate::summary::{print_denoise_summary, print_run_result};

#[derive(Args)]
pub struct DenoiseArgs {
    /// Input SER video or still image
    pub file: PathBuf,

    /// Pipeline config file (TOML); command-line values override it
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Color distance threshold in 8-bit RGB units (0 disables smoothing)
    #[arg(short, long)]
    pub threshold: Option<f64>,

    /// Outermost neighbor offset in pixels
    #[arg(long)]
    pub radius: Option<usize>,

    /// Spacing between neighbor offsets in pixels
    #[arg(long)]
    pub step: Option<usize>,

    /// Frames denoised in parallel per batch (SER input)
    #[arg(long)]
    pub batch_size: Option<usize>,

    /// Output file path [default: <input>_ccd.<ext>]
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

pub fn run(args: &DenoiseArgs) -> Result<()> {
    let config = build_config(args)?;
    print_denoise_summary(&config);

    let reporter = Arc::new(BarReporter::new()?);
    let started = Instant::now();
    let summary = run_pipeline_reported(&config, reporter.clone())
        .with_context(|| format!("Failed to denoise {}", config.input.display()))?;
    reporter.bar.finish_with_message("Done");

    print_run_result(&summary, started.elapsed());
    Ok(())
}

fn build_config(args: &DenoiseArgs) -> Result<PipelineConfig> {
    let mut config = if let Some(ref config_path) = args.config {
        let contents = std::fs::read_to_string(config_path)
            .with_context(|| format!("Failed to read config {}", config_path.display()))?;
        toml::from_str(&contents).context("Invalid pipeline config")?
    } else {
        PipelineConfig::new(&args.file, default_output(&args.file))
    };

    config.input = args.file.clone();
    if let Some(ref output) = args.output {
        config.output = output.clone();
    }
    apply_overrides(&mut config.denoise, args);
    if let Some(batch_size) = args.batch_size {
        config.batch_size = batch_size;
    }
    Ok(config)
}

fn apply_overrides(params: &mut DenoiseParams, args: &DenoiseArgs) {
    if let Some(threshold) = args.threshold {
        params.threshold = threshold;
    }
    if let Some(radius) = args.radius {
        params.geometry.radius = radius;
    }
    if let Some(step) = args.step {
        params.geometry.step = step;
    }
}

/// `clip.ser` -> `clip_ccd.ser`; images keep PNG, everything else becomes TIFF.
fn default_output(input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("output");
    let ext = match InputKind::from_path(input) {
        InputKind::Video => "ser",
        InputKind::Image => match input
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .as_deref()
        {
            Some("png") => "png",
            _ => "tiff",
        },
    };
    input.with_file_name(format!("{stem}_ccd.{ext}"))
}

/// Drives a single indicatif bar, reset at every pipeline stage.
struct BarReporter {
    bar: ProgressBar,
}

impl BarReporter {
    fn new() -> Result<Self> {
        let bar = ProgressBar::new(1);
        bar.set_style(
            ProgressStyle::default_bar()
                .template("{msg:20} [{bar:40}] {pos}/{len}")?
                .progress_chars("=> "),
        );
        Ok(Self { bar })
    }
}

impl ProgressReporter for BarReporter {
    fn begin_stage(&self, stage: PipelineStage, total_items: Option<usize>) {
        self.bar.set_message(stage.to_string());
        self.bar.set_length(total_items.unwrap_or(1) as u64);
        self.bar.set_position(0);
    }

    fn advance(&self, items_done: usize) {
        self.bar.inc(items_done as u64);
    }

    fn finish_stage(&self) {
        if let Some(len) = self.bar.length() {
            self.bar.set_position(len);
        }
    }
}
