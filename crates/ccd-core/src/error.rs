use thiserror::Error;

#[derive(Error, Debug)]
pub enum CcdError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid SER file: {0}")]
    InvalidSer(String),

    #[error("Invalid image dimensions: {width}x{height}")]
    InvalidDimensions { width: u32, height: u32 },

    #[error("Plane stride {stride} is smaller than its width {width}")]
    InvalidStride { width: usize, stride: usize },

    #[error("Frame index {index} out of range (total: {total})")]
    FrameIndexOutOfRange { index: usize, total: usize },

    #[error("Unsupported color mode: {0}")]
    UnsupportedColorMode(String),

    #[error("Variable format clips are not supported")]
    VariableFormat,

    #[error("Variable resolution clips are not supported")]
    VariableResolution,

    #[error("Sub-sampled chroma is not supported (got {0})")]
    SubsampledChroma(String),

    #[error("Input clip must be RGBS, got {0}")]
    UnsupportedFormat(String),

    #[error("Input clip dimensions must be at least {min}x{min}, got {width}x{height}")]
    FrameTooSmall { width: u32, height: u32, min: usize },

    #[error("Threshold must be >= 0, got {0}")]
    NegativeThreshold(f64),

    #[error("Invalid kernel geometry: {0}")]
    InvalidGeometry(String),

    #[error("Frame is {got_width}x{got_height}, expected {width}x{height}")]
    FrameMismatch {
        width: usize,
        height: usize,
        got_width: usize,
        got_height: usize,
    },

    #[error("Image format error: {0}")]
    ImageError(#[from] image::ImageError),

    #[error("Output {0} is the input file; choose a different output path")]
    OutputIsInput(std::path::PathBuf),

    #[error("Empty frame sequence")]
    EmptySequence,
}

pub type Result<T> = std::result::Result<T, CcdError>;
