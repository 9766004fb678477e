use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::consts::STREAMING_BATCH_SIZE;
use crate::denoise::DenoiseParams;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PipelineConfig {
    pub input: PathBuf,
    pub output: PathBuf,
    #[serde(default)]
    pub denoise: DenoiseParams,
    /// Frames requested in parallel per batch when processing video.
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
}

fn default_batch_size() -> usize {
    STREAMING_BATCH_SIZE
}

impl PipelineConfig {
    pub fn new(input: impl Into<PathBuf>, output: impl Into<PathBuf>) -> Self {
        Self {
            input: input.into(),
            output: output.into(),
            denoise: DenoiseParams::default(),
            batch_size: STREAMING_BATCH_SIZE,
        }
    }
}

/// How an input path is handled by the pipeline.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InputKind {
    /// SER video, processed frame by frame.
    Video,
    /// Any still image the `image` crate can decode.
    Image,
}

impl InputKind {
    pub fn from_path(path: &Path) -> Self {
        match path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .as_deref()
        {
            Some("ser") => Self::Video,
            _ => Self::Image,
        }
    }
}

impl std::fmt::Display for InputKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Video => write!(f, "SER video"),
            Self::Image => write!(f, "Image"),
        }
    }
}
