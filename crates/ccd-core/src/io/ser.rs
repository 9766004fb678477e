use std::fs::File;
use std::path::Path;

use byteorder::{LittleEndian, ReadBytesExt};
use memmap2::Mmap;

use crate::clip::FrameSource;
use crate::consts::COLOR_CHANNEL_COUNT;
use crate::error::{CcdError, Result};
use crate::frame::{
    ColorFamily, ColorMode, FrameMetadata, Plane, PlanarFrame, SampleType, SourceInfo,
    VideoFormat, VideoInfo,
};

pub const SER_HEADER_SIZE: usize = 178;
pub const SER_MAGIC: &[u8; 14] = b"LUCAM-RECORDER";

const COLOR_ID_MONO: i32 = 0;
const COLOR_ID_RGB: i32 = 100;
const COLOR_ID_BGR: i32 = 101;

/// SER file header (178 bytes).
#[derive(Clone, Debug)]
pub struct SerHeader {
    pub color_id: i32,
    pub little_endian: bool,
    pub width: u32,
    pub height: u32,
    pub pixel_depth: u32,
    pub frame_count: u32,
    pub observer: String,
    pub instrument: String,
    pub telescope: String,
    pub date_time: u64,
    pub date_time_utc: u64,
}

impl SerHeader {
    /// Little-endian interleaved RGB header with empty metadata.
    pub fn rgb(width: u32, height: u32, pixel_depth: u32, frame_count: u32) -> Self {
        Self {
            color_id: COLOR_ID_RGB,
            little_endian: true,
            width,
            height,
            pixel_depth,
            frame_count,
            observer: String::new(),
            instrument: String::new(),
            telescope: String::new(),
            date_time: 0,
            date_time_utc: 0,
        }
    }

    /// Bytes per pixel plane (1 for 8-bit, 2 for 9-16 bit).
    pub fn bytes_per_pixel_plane(&self) -> usize {
        if self.pixel_depth <= 8 { 1 } else { 2 }
    }

    /// Number of planes per pixel (1 for mono/bayer, 3 for RGB/BGR).
    pub fn planes_per_pixel(&self) -> usize {
        match self.color_id {
            COLOR_ID_RGB | COLOR_ID_BGR => COLOR_CHANNEL_COUNT,
            _ => 1,
        }
    }

    /// Total bytes per frame, or `None` if the header's dimensions overflow.
    pub fn frame_byte_size(&self) -> Option<usize> {
        (self.width as usize)
            .checked_mul(self.height as usize)?
            .checked_mul(self.bytes_per_pixel_plane() * self.planes_per_pixel())
    }

    pub fn color_mode(&self) -> ColorMode {
        match self.color_id {
            COLOR_ID_MONO => ColorMode::Mono,
            8 => ColorMode::BayerRGGB,
            9 => ColorMode::BayerGRBG,
            10 => ColorMode::BayerGBRG,
            11 => ColorMode::BayerBGGR,
            COLOR_ID_RGB => ColorMode::RGB,
            COLOR_ID_BGR => ColorMode::BGR,
            _ => ColorMode::Mono,
        }
    }

    /// Format of the frames `SerReader` hands out. RGB/BGR data is decoded
    /// to RGBS; other modes are reported as stored and cannot be decoded.
    pub fn video_format(&self) -> VideoFormat {
        let stored = |color_family| VideoFormat {
            color_family,
            sample_type: SampleType::Integer,
            bits_per_sample: self.pixel_depth,
            subsampling_w: 0,
            subsampling_h: 0,
        };
        match self.color_mode() {
            ColorMode::RGB | ColorMode::BGR => VideoFormat::RGBS,
            ColorMode::Mono => stored(ColorFamily::Gray),
            _ => stored(ColorFamily::Bayer),
        }
    }
}

/// Memory-mapped SER file reader.
pub struct SerReader {
    mmap: Mmap,
    pub header: SerHeader,
    frame_size: usize,
}

impl SerReader {
    /// Open a SER file and parse its header.
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        // The file is only read; external truncation while mapped is not supported.
        let mmap = unsafe { Mmap::map(&file)? };

        if mmap.len() < SER_HEADER_SIZE {
            return Err(CcdError::InvalidSer("File too small for SER header".into()));
        }

        if &mmap[0..14] != SER_MAGIC {
            return Err(CcdError::InvalidSer("Missing LUCAM-RECORDER magic".into()));
        }

        let header = parse_header(&mmap[..SER_HEADER_SIZE])?;

        let frame_size = header
            .frame_byte_size()
            .ok_or_else(|| CcdError::InvalidSer("Frame size overflows".into()))?;
        let expected_data_size = (frame_size as u64)
            .checked_mul(header.frame_count as u64)
            .and_then(|n| n.checked_add(SER_HEADER_SIZE as u64))
            .ok_or_else(|| CcdError::InvalidSer("Frame data size overflows".into()))?;
        if (mmap.len() as u64) < expected_data_size {
            return Err(CcdError::InvalidSer(format!(
                "File truncated: expected at least {} bytes, got {}",
                expected_data_size,
                mmap.len()
            )));
        }

        Ok(Self {
            mmap,
            header,
            frame_size,
        })
    }

    pub fn frame_count(&self) -> usize {
        self.header.frame_count as usize
    }

    /// Bytes per frame, validated against the file size on open.
    pub fn frame_byte_size(&self) -> usize {
        self.frame_size
    }

    /// Get the raw bytes for a single frame (zero-copy from mmap).
    pub fn frame_raw(&self, index: usize) -> Result<&[u8]> {
        let count = self.frame_count();
        if index >= count {
            return Err(CcdError::FrameIndexOutOfRange {
                index,
                total: count,
            });
        }
        let offset = SER_HEADER_SIZE + index * self.frame_size;
        let end = offset + self.frame_size;
        Ok(&self.mmap[offset..end])
    }

    /// Decode an RGB/BGR frame into planar f32 in [0.0, 1.0].
    pub fn read_frame(&self, index: usize) -> Result<PlanarFrame> {
        let mode = self.header.color_mode();
        let bgr = match mode {
            ColorMode::RGB => false,
            ColorMode::BGR => true,
            other => {
                return Err(CcdError::UnsupportedColorMode(format!(
                    "{other:?} SER frames cannot be decoded as RGB"
                )))
            }
        };

        let raw = self.frame_raw(index)?;
        let mut frame = decode_rgb_frame(raw, &self.header, bgr)?;
        frame.metadata = FrameMetadata {
            frame_index: index,
            timestamp_us: self.read_timestamp(index),
        };
        Ok(frame)
    }

    /// Per-frame timestamp from the optional trailer.
    pub fn read_timestamp(&self, index: usize) -> Option<u64> {
        let trailer_offset = SER_HEADER_SIZE + self.frame_size * self.frame_count();
        let ts_offset = trailer_offset.checked_add(index.checked_mul(8)?)?;
        let ts_end = ts_offset.checked_add(8)?;
        if ts_end <= self.mmap.len() {
            let bytes = &self.mmap[ts_offset..ts_end];
            Some(u64::from_le_bytes(bytes.try_into().ok()?))
        } else {
            None
        }
    }

    /// All trailer timestamps, or `None` unless every frame has one.
    pub fn timestamps(&self) -> Option<Vec<u64>> {
        (0..self.frame_count())
            .map(|i| self.read_timestamp(i))
            .collect()
    }

    /// Build SourceInfo from the header.
    pub fn source_info(&self, path: &Path) -> SourceInfo {
        SourceInfo {
            filename: path.to_path_buf(),
            total_frames: self.frame_count(),
            width: self.header.width,
            height: self.header.height,
            bit_depth: self.header.pixel_depth as u8,
            color_mode: self.header.color_mode(),
            observer: non_empty(&self.header.observer),
            telescope: non_empty(&self.header.telescope),
            instrument: non_empty(&self.header.instrument),
        }
    }
}

impl FrameSource for SerReader {
    fn info(&self) -> VideoInfo {
        VideoInfo::fixed(
            self.header.video_format(),
            self.header.width,
            self.header.height,
            self.frame_count(),
        )
    }

    fn get_frame(&self, index: usize) -> Result<PlanarFrame> {
        self.read_frame(index)
    }
}

fn parse_header(buf: &[u8]) -> Result<SerHeader> {
    let mut cursor = std::io::Cursor::new(&buf[14..]); // skip magic

    let _lu_id = cursor.read_i32::<LittleEndian>()?;
    let color_id = cursor.read_i32::<LittleEndian>()?;
    let le_flag = cursor.read_i32::<LittleEndian>()?;
    let width = cursor.read_i32::<LittleEndian>()?;
    let height = cursor.read_i32::<LittleEndian>()?;
    let pixel_depth = cursor.read_i32::<LittleEndian>()?;
    let frame_count = cursor.read_i32::<LittleEndian>()?;

    let observer = read_fixed_string(&buf[42..82]);
    let instrument = read_fixed_string(&buf[82..122]);
    let telescope = read_fixed_string(&buf[122..162]);

    let mut cursor = std::io::Cursor::new(&buf[162..]);
    let date_time = cursor.read_u64::<LittleEndian>()?;
    let date_time_utc = cursor.read_u64::<LittleEndian>()?;

    if width <= 0 || height <= 0 {
        return Err(CcdError::InvalidDimensions {
            width: width.max(0) as u32,
            height: height.max(0) as u32,
        });
    }
    if !(1..=16).contains(&pixel_depth) {
        return Err(CcdError::InvalidSer(format!(
            "Unsupported pixel depth {pixel_depth}"
        )));
    }
    if frame_count < 0 {
        return Err(CcdError::InvalidSer(format!(
            "Negative frame count {frame_count}"
        )));
    }

    // SER format: LittleEndian field = 0 means big-endian pixel data,
    // but many writers (including FireCapture) use 0 for little-endian.
    // Follow Siril's convention: treat 0 as little-endian.
    let little_endian = le_flag != 1;

    Ok(SerHeader {
        color_id,
        little_endian,
        width: width as u32,
        height: height as u32,
        pixel_depth: pixel_depth as u32,
        frame_count: frame_count as u32,
        observer,
        instrument,
        telescope,
        date_time,
        date_time_utc,
    })
}

fn read_fixed_string(buf: &[u8]) -> String {
    String::from_utf8_lossy(buf)
        .trim_end_matches('\0')
        .trim()
        .to_string()
}

fn non_empty(s: &str) -> Option<String> {
    if s.is_empty() { None } else { Some(s.to_string()) }
}

fn decode_rgb_frame(raw: &[u8], header: &SerHeader, bgr: bool) -> Result<PlanarFrame> {
    let h = header.height as usize;
    let w = header.width as usize;
    let bps = header.bytes_per_pixel_plane();
    let max_val = ((1u32 << header.pixel_depth) - 1) as f32;

    let mut frame = PlanarFrame::new(Plane::new(w, h), Plane::new(w, h), Plane::new(w, h))?;
    for row in 0..h {
        for col in 0..w {
            let pixel_offset = (row * w + col) * COLOR_CHANNEL_COUNT * bps;
            let mut rgb = [0.0f32; 3];
            for (plane, v) in rgb.iter_mut().enumerate() {
                let idx = pixel_offset + plane * bps;
                let sample = if bps == 1 {
                    raw[idx] as f32
                } else {
                    let pair = [raw[idx], raw[idx + 1]];
                    if header.little_endian {
                        u16::from_le_bytes(pair) as f32
                    } else {
                        u16::from_be_bytes(pair) as f32
                    }
                };
                *v = sample / max_val;
            }
            if bgr {
                rgb.swap(0, 2);
            }
            frame.set_pixel(col, row, rgb);
        }
    }

    Ok(frame)
}
