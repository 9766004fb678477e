#![allow(dead_code)]

use ccd_core::frame::PlanarFrame;
use ccd_core::io::ser::SER_HEADER_SIZE;

/// SER ColorID values.
pub const COLOR_MONO: i32 = 0;
pub const COLOR_BAYER_RGGB: i32 = 8;
pub const COLOR_RGB: i32 = 100;
pub const COLOR_BGR: i32 = 101;

/// Build a SER file header with configurable bit depth and color mode.
pub fn build_ser_header_full(
    width: u32,
    height: u32,
    bit_depth: u32,
    num_frames: usize,
    color_id: i32,
) -> Vec<u8> {
    let mut buf = Vec::with_capacity(SER_HEADER_SIZE);

    // Magic (14 bytes)
    buf.extend_from_slice(b"LUCAM-RECORDER");
    // LuID (4 bytes)
    buf.extend_from_slice(&0i32.to_le_bytes());
    // ColorID (4 bytes)
    buf.extend_from_slice(&color_id.to_le_bytes());
    // LittleEndian = 0 (little-endian per Siril convention)
    buf.extend_from_slice(&0i32.to_le_bytes());
    buf.extend_from_slice(&(width as i32).to_le_bytes());
    buf.extend_from_slice(&(height as i32).to_le_bytes());
    buf.extend_from_slice(&(bit_depth as i32).to_le_bytes());
    buf.extend_from_slice(&(num_frames as i32).to_le_bytes());
    // Observer, Instrument, Telescope (40 bytes each)
    let mut observer = [0u8; 40];
    observer[..6].copy_from_slice(b"Tester");
    buf.extend_from_slice(&observer);
    buf.extend_from_slice(&[0u8; 40]);
    buf.extend_from_slice(&[0u8; 40]);
    // DateTime, DateTimeUTC (8 bytes each)
    buf.extend_from_slice(&0u64.to_le_bytes());
    buf.extend_from_slice(&0u64.to_le_bytes());

    assert_eq!(buf.len(), SER_HEADER_SIZE);
    buf
}

/// Complete 8-bit SER file: header, frames, optional timestamp trailer.
pub fn build_ser(
    width: u32,
    height: u32,
    color_id: i32,
    frames: &[Vec<u8>],
    timestamps: Option<&[u64]>,
) -> Vec<u8> {
    let mut buf = build_ser_header_full(width, height, 8, frames.len(), color_id);
    for frame in frames {
        buf.extend_from_slice(frame);
    }
    if let Some(ts) = timestamps {
        for t in ts {
            buf.extend_from_slice(&t.to_le_bytes());
        }
    }
    buf
}

/// Interleaved 8-bit RGB frame with a deterministic noisy pattern.
pub fn noisy_rgb_bytes(width: u32, height: u32, seed: u32) -> Vec<u8> {
    let mut state = seed.wrapping_mul(2_654_435_761).wrapping_add(1);
    (0..width * height * 3)
        .map(|_| {
            state = state.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
            (state >> 24) as u8
        })
        .collect()
}

/// Write bytes to a temporary file and return the handle.
///
/// The file stays alive as long as the returned `NamedTempFile` is not dropped.
pub fn write_temp_file(data: &[u8]) -> tempfile::NamedTempFile {
    use std::io::Write;
    let mut f = tempfile::NamedTempFile::new().expect("create temp file");
    f.write_all(data).expect("write data");
    f.flush().expect("flush");
    f
}

/// Uniform frame with a single differently colored pixel.
pub fn frame_with_spike(size: usize, base: [f32; 3], at: (usize, usize), spike: [f32; 3]) -> PlanarFrame {
    let mut frame = PlanarFrame::filled(size, size, base);
    frame.set_pixel(at.0, at.1, spike);
    frame
}

/// Frame with deterministic pseudo-random samples in [0, 1).
pub fn noisy_frame(width: usize, height: usize, seed: u32) -> PlanarFrame {
    let mut frame = PlanarFrame::filled(width, height, [0.0; 3]);
    let mut state = seed.wrapping_mul(2_654_435_761).wrapping_add(7);
    let mut next = move || {
        state = state.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
        (state >> 8) as f32 / (1u32 << 24) as f32
    };
    for y in 0..height {
        for x in 0..width {
            frame.set_pixel(x, y, [next(), next(), next()]);
        }
    }
    frame
}

/// Straightforward per-pixel rendition of the CCD rule for the default
/// geometry, used to cross-check the optimized kernel.
pub fn reference_denoise(src: &PlanarFrame, thr_sq: f32) -> PlanarFrame {
    use ccd_core::denoise::mirror_index;

    const AXIS: [isize; 4] = [-12, -4, 4, 12];
    let (w, h) = (src.width(), src.height());
    let mut dst = PlanarFrame::filled(w, h, [0.0; 3]);

    for y in 0..h {
        for x in 0..w {
            let center = src.pixel(x, y);
            let mut sum = center;
            let mut n = 1usize;
            for dy in AXIS {
                for dx in AXIS {
                    let sy = mirror_index(y as isize + dy, h);
                    let sx = mirror_index(x as isize + dx, w);
                    let c = src.pixel(sx, sy);
                    let d2: f32 = (0..3).map(|i| (c[i] - center[i]) * (c[i] - center[i])).sum();
                    if thr_sq > d2 {
                        for i in 0..3 {
                            sum[i] += c[i];
                        }
                        n += 1;
                    }
                }
            }
            let inv = 1.0 / n as f64;
            let avg = sum.map(|s| ((s as f64 * inv) as f32).clamp(0.0, 1.0));
            dst.set_pixel(x, y, avg);
        }
    }
    dst
}

pub fn assert_frames_close(a: &PlanarFrame, b: &PlanarFrame, tol: f32) {
    assert_eq!(a.width(), b.width());
    assert_eq!(a.height(), b.height());
    for y in 0..a.height() {
        for x in 0..a.width() {
            let (pa, pb) = (a.pixel(x, y), b.pixel(x, y));
            for c in 0..3 {
                assert!(
                    (pa[c] - pb[c]).abs() <= tol,
                    "pixel ({x},{y}) channel {c}: {} vs {}",
                    pa[c],
                    pb[c]
                );
            }
        }
    }
}
