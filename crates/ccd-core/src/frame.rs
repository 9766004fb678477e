use std::fmt;
use std::path::PathBuf;

use ndarray::{s, Array2, ArrayView1};

use crate::error::{CcdError, Result};

/// One channel of a planar frame.
///
/// Samples live in an `Array2<f32>` of shape `(height, stride)`; only the
/// first `width` columns of each row are image data, the rest is padding.
#[derive(Clone, Debug, PartialEq)]
pub struct Plane {
    data: Array2<f32>,
    width: usize,
}

impl Plane {
    /// Zero-filled plane without row padding.
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            data: Array2::zeros((height, width)),
            width,
        }
    }

    /// Zero-filled plane whose rows are `stride` samples apart.
    pub fn with_stride(width: usize, height: usize, stride: usize) -> Result<Self> {
        if stride < width {
            return Err(CcdError::InvalidStride { width, stride });
        }
        Ok(Self {
            data: Array2::zeros((height, stride)),
            width,
        })
    }

    /// Plane filled with a constant value.
    pub fn filled(width: usize, height: usize, value: f32) -> Self {
        Self {
            data: Array2::from_elem((height, width), value),
            width,
        }
    }

    /// Wrap a `(height, width)` array; stride equals width.
    pub fn from_array(data: Array2<f32>) -> Self {
        let data = if data.is_standard_layout() {
            data
        } else {
            data.as_standard_layout().into_owned()
        };
        let width = data.ncols();
        Self { data, width }
    }

    /// Zeroed plane with the same width, height and stride.
    pub fn like(&self) -> Self {
        Self {
            data: Array2::zeros(self.data.dim()),
            width: self.width,
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.data.nrows()
    }

    pub fn stride(&self) -> usize {
        self.data.ncols()
    }

    pub fn get(&self, x: usize, y: usize) -> f32 {
        self.data[[y, x]]
    }

    pub fn set(&mut self, x: usize, y: usize, value: f32) {
        self.data[[y, x]] = value;
    }

    /// Image samples of row `y`, padding excluded.
    pub fn row(&self, y: usize) -> ArrayView1<'_, f32> {
        self.data.slice(s![y, ..self.width])
    }

    /// Backing storage including padding, shape `(height, stride)`.
    pub fn data(&self) -> &Array2<f32> {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut Array2<f32> {
        &mut self.data
    }

    /// Compact `(height, width)` copy with the padding dropped.
    pub fn to_array(&self) -> Array2<f32> {
        self.data.slice(s![.., ..self.width]).to_owned()
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct FrameMetadata {
    pub frame_index: usize,
    pub timestamp_us: Option<u64>,
}

/// Planar RGB frame: three equally sized `f32` channels.
/// Nominal sample range is [0.0, 1.0].
#[derive(Clone, Debug, PartialEq)]
pub struct PlanarFrame {
    pub red: Plane,
    pub green: Plane,
    pub blue: Plane,
    pub metadata: FrameMetadata,
}

impl PlanarFrame {
    /// Assemble a frame from three planes of identical dimensions.
    pub fn new(red: Plane, green: Plane, blue: Plane) -> Result<Self> {
        let frame = Self {
            red,
            green,
            blue,
            metadata: FrameMetadata::default(),
        };
        frame.check_planes()?;
        Ok(frame)
    }

    /// Frame with every pixel set to `rgb`.
    pub fn filled(width: usize, height: usize, rgb: [f32; 3]) -> Self {
        Self {
            red: Plane::filled(width, height, rgb[0]),
            green: Plane::filled(width, height, rgb[1]),
            blue: Plane::filled(width, height, rgb[2]),
            metadata: FrameMetadata::default(),
        }
    }

    pub fn width(&self) -> usize {
        self.red.width()
    }

    pub fn height(&self) -> usize {
        self.red.height()
    }

    pub fn pixel(&self, x: usize, y: usize) -> [f32; 3] {
        [self.red.get(x, y), self.green.get(x, y), self.blue.get(x, y)]
    }

    pub fn set_pixel(&mut self, x: usize, y: usize, rgb: [f32; 3]) {
        self.red.set(x, y, rgb[0]);
        self.green.set(x, y, rgb[1]);
        self.blue.set(x, y, rgb[2]);
    }

    pub fn planes(&self) -> [&Plane; 3] {
        [&self.red, &self.green, &self.blue]
    }

    pub fn planes_mut(&mut self) -> [&mut Plane; 3] {
        [&mut self.red, &mut self.green, &mut self.blue]
    }

    /// Zeroed frame with the same plane geometry and metadata.
    pub fn like(&self) -> Self {
        Self {
            red: self.red.like(),
            green: self.green.like(),
            blue: self.blue.like(),
            metadata: self.metadata.clone(),
        }
    }

    /// Verify that green and blue match the red plane's dimensions.
    pub fn check_planes(&self) -> Result<()> {
        let (w, h) = (self.red.width(), self.red.height());
        for plane in [&self.green, &self.blue] {
            if plane.width() != w || plane.height() != h {
                return Err(CcdError::FrameMismatch {
                    width: w,
                    height: h,
                    got_width: plane.width(),
                    got_height: plane.height(),
                });
            }
        }
        Ok(())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ColorFamily {
    Rgb,
    Yuv,
    Gray,
    Bayer,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SampleType {
    Integer,
    Float,
}

/// Pixel format of a clip, as negotiated with whatever feeds the filter.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct VideoFormat {
    pub color_family: ColorFamily,
    pub sample_type: SampleType,
    pub bits_per_sample: u32,
    /// log2 horizontal chroma sub-sampling.
    pub subsampling_w: u32,
    /// log2 vertical chroma sub-sampling.
    pub subsampling_h: u32,
}

impl VideoFormat {
    /// Planar RGB, 32-bit float, full resolution on every plane.
    pub const RGBS: VideoFormat = VideoFormat {
        color_family: ColorFamily::Rgb,
        sample_type: SampleType::Float,
        bits_per_sample: 32,
        subsampling_w: 0,
        subsampling_h: 0,
    };

    pub fn is_subsampled(&self) -> bool {
        self.subsampling_w != 0 || self.subsampling_h != 0
    }
}

impl fmt::Display for VideoFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let depth = match (self.sample_type, self.bits_per_sample) {
            (SampleType::Float, 32) => "S".to_string(),
            (SampleType::Float, 16) => "H".to_string(),
            (_, bits) => bits.to_string(),
        };
        match self.color_family {
            ColorFamily::Rgb => match self.sample_type {
                SampleType::Float => write!(f, "RGB{depth}"),
                SampleType::Integer => write!(f, "RGB{}", self.bits_per_sample * 3),
            },
            ColorFamily::Gray => write!(f, "GRAY{depth}"),
            ColorFamily::Bayer => write!(f, "BAYER{depth}"),
            ColorFamily::Yuv => {
                let sub = match (self.subsampling_w, self.subsampling_h) {
                    (0, 0) => "444".to_string(),
                    (1, 0) => "422".to_string(),
                    (1, 1) => "420".to_string(),
                    (2, 0) => "411".to_string(),
                    (2, 2) => "410".to_string(),
                    (0, 1) => "440".to_string(),
                    (w, h) => format!("{w}{h}"),
                };
                write!(f, "YUV{sub}P{depth}")
            }
        }
    }
}

/// Clip-level description of the frames a source will deliver.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct VideoInfo {
    /// `None` when the format may change from frame to frame.
    pub format: Option<VideoFormat>,
    /// `None` when the resolution may change from frame to frame.
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub num_frames: usize,
}

impl VideoInfo {
    /// Constant-format, constant-resolution clip.
    pub fn fixed(format: VideoFormat, width: u32, height: u32, num_frames: usize) -> Self {
        Self {
            format: Some(format),
            width: Some(width),
            height: Some(height),
            num_frames,
        }
    }
}

/// Color/Bayer mode of SER source data.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum ColorMode {
    Mono,
    BayerRGGB,
    BayerGRBG,
    BayerGBRG,
    BayerBGGR,
    RGB,
    BGR,
}

/// Metadata about a source video file.
#[derive(Clone, Debug)]
pub struct SourceInfo {
    pub filename: PathBuf,
    pub total_frames: usize,
    pub width: u32,
    pub height: u32,
    pub bit_depth: u8,
    pub color_mode: ColorMode,
    pub observer: Option<String>,
    pub telescope: Option<String>,
    pub instrument: Option<String>,
}
