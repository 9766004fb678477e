use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::error::{CcdError, Result};
use crate::frame::{ColorMode, PlanarFrame};
use crate::io::ser::{SerHeader, SER_HEADER_SIZE, SER_MAGIC};

/// Writes RGB/BGR SER video, one planar frame at a time.
pub struct SerWriter {
    writer: BufWriter<File>,
    header: SerHeader,
    frames_written: u32,
    buf: Vec<u8>,
}

impl SerWriter {
    /// Create a new SER file and write the header.
    pub fn create(path: &Path, header: &SerHeader) -> Result<Self> {
        if !matches!(header.color_mode(), ColorMode::RGB | ColorMode::BGR) {
            return Err(CcdError::UnsupportedColorMode(format!(
                "SerWriter only encodes RGB/BGR, got {:?}",
                header.color_mode()
            )));
        }
        if !(1..=16).contains(&header.pixel_depth) {
            return Err(CcdError::InvalidSer(format!(
                "Unsupported pixel depth {}",
                header.pixel_depth
            )));
        }

        let frame_size = header
            .frame_byte_size()
            .ok_or_else(|| CcdError::InvalidSer("Frame size overflows".into()))?;

        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);
        write_header(&mut writer, header)?;
        Ok(Self {
            writer,
            header: header.clone(),
            frames_written: 0,
            buf: Vec::with_capacity(frame_size),
        })
    }

    /// Encode a planar frame at the header's bit depth, clamping to [0, 1].
    pub fn write_frame(&mut self, frame: &PlanarFrame) -> Result<()> {
        let (w, h) = (self.header.width as usize, self.header.height as usize);
        if frame.width() != w || frame.height() != h {
            return Err(CcdError::FrameMismatch {
                width: w,
                height: h,
                got_width: frame.width(),
                got_height: frame.height(),
            });
        }

        let bgr = self.header.color_mode() == ColorMode::BGR;
        let wide = self.header.bytes_per_pixel_plane() == 2;
        let max_val = ((1u32 << self.header.pixel_depth) - 1) as f32;

        self.buf.clear();
        for row in 0..h {
            for col in 0..w {
                let mut rgb = frame.pixel(col, row);
                if bgr {
                    rgb.swap(0, 2);
                }
                for v in rgb {
                    let q = (v.clamp(0.0, 1.0) * max_val).round() as u16;
                    if !wide {
                        self.buf.push(q as u8);
                    } else if self.header.little_endian {
                        self.buf.extend_from_slice(&q.to_le_bytes());
                    } else {
                        self.buf.extend_from_slice(&q.to_be_bytes());
                    }
                }
            }
        }

        self.writer.write_all(&self.buf)?;
        self.frames_written += 1;
        Ok(())
    }

    pub fn frames_written(&self) -> u32 {
        self.frames_written
    }

    /// Write the optional timestamp trailer (one u64 per frame, little-endian).
    pub fn write_timestamps(&mut self, timestamps: &[u64]) -> Result<()> {
        for &ts in timestamps {
            self.writer.write_all(&ts.to_le_bytes())?;
        }
        Ok(())
    }

    /// Flush and finalize the file.
    pub fn finalize(mut self) -> Result<()> {
        if self.frames_written != self.header.frame_count {
            return Err(CcdError::InvalidSer(format!(
                "Header announces {} frames but {} were written",
                self.header.frame_count, self.frames_written
            )));
        }
        self.writer.flush()?;
        Ok(())
    }
}

fn write_header(w: &mut impl Write, header: &SerHeader) -> Result<()> {
    w.write_all(SER_MAGIC)?;
    // LuID
    w.write_all(&0i32.to_le_bytes())?;
    w.write_all(&header.color_id.to_le_bytes())?;
    // 0 = little-endian (Siril convention)
    let le_flag: i32 = if header.little_endian { 0 } else { 1 };
    w.write_all(&le_flag.to_le_bytes())?;
    w.write_all(&(header.width as i32).to_le_bytes())?;
    w.write_all(&(header.height as i32).to_le_bytes())?;
    w.write_all(&(header.pixel_depth as i32).to_le_bytes())?;
    w.write_all(&(header.frame_count as i32).to_le_bytes())?;
    write_fixed_string(w, &header.observer, 40)?;
    write_fixed_string(w, &header.instrument, 40)?;
    write_fixed_string(w, &header.telescope, 40)?;
    w.write_all(&header.date_time.to_le_bytes())?;
    w.write_all(&header.date_time_utc.to_le_bytes())?;

    debug_assert_eq!(
        14 + 4 + 4 + 4 + 4 + 4 + 4 + 4 + 40 + 40 + 40 + 8 + 8,
        SER_HEADER_SIZE
    );
    Ok(())
}

fn write_fixed_string(w: &mut impl Write, s: &str, len: usize) -> Result<()> {
    let mut field = vec![0u8; len];
    let bytes = s.as_bytes();
    let n = bytes.len().min(len);
    field[..n].copy_from_slice(&bytes[..n]);
    w.write_all(&field)?;
    Ok(())
}
