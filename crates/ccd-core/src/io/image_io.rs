use std::path::Path;

use image::{ImageFormat, Rgb};

use crate::error::{CcdError, Result};
use crate::frame::{Plane, PlanarFrame, VideoFormat, VideoInfo};

/// Save a frame as 16-bit RGB TIFF.
pub fn save_color_tiff(frame: &PlanarFrame, path: &Path) -> Result<()> {
    let h = frame.height();
    let w = frame.width();

    let mut pixels: Vec<u16> = Vec::with_capacity(h * w * 3);
    for row in 0..h {
        for col in 0..w {
            for v in frame.pixel(col, row) {
                pixels.push((v.clamp(0.0, 1.0) * 65535.0).round() as u16);
            }
        }
    }

    let img = image::ImageBuffer::<Rgb<u16>, Vec<u16>>::from_raw(w as u32, h as u32, pixels)
        .ok_or(CcdError::InvalidDimensions {
            width: w as u32,
            height: h as u32,
        })?;
    img.save_with_format(path, ImageFormat::Tiff)?;
    Ok(())
}

/// Save a frame as 8-bit RGB PNG.
pub fn save_color_png(frame: &PlanarFrame, path: &Path) -> Result<()> {
    let h = frame.height();
    let w = frame.width();

    let mut img = image::RgbImage::new(w as u32, h as u32);
    for row in 0..h {
        for col in 0..w {
            let [r, g, b] = frame.pixel(col, row);
            let to_u8 = |v: f32| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
            img.put_pixel(col as u32, row as u32, Rgb([to_u8(r), to_u8(g), to_u8(b)]));
        }
    }

    img.save_with_format(path, ImageFormat::Png)?;
    Ok(())
}

/// Save a frame, choosing format from file extension.
pub fn save_color_image(frame: &PlanarFrame, path: &Path) -> Result<()> {
    match path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .as_deref()
    {
        Some("tiff" | "tif") => save_color_tiff(frame, path),
        Some("png") => save_color_png(frame, path),
        _ => save_color_tiff(frame, path),
    }
}

/// Load any image the `image` crate can decode as a planar RGBS frame.
pub fn load_color_image(path: &Path) -> Result<PlanarFrame> {
    let img = image::open(path)?.to_rgb32f();
    let (w, h) = img.dimensions();
    if w == 0 || h == 0 {
        return Err(CcdError::InvalidDimensions {
            width: w,
            height: h,
        });
    }

    let (w, h) = (w as usize, h as usize);
    let mut frame = PlanarFrame::new(Plane::new(w, h), Plane::new(w, h), Plane::new(w, h))?;
    for (col, row, pixel) in img.enumerate_pixels() {
        frame.set_pixel(col as usize, row as usize, pixel.0);
    }
    Ok(frame)
}

/// Clip description of a still image decoded by `load_color_image`.
pub fn image_video_info(frame: &PlanarFrame) -> VideoInfo {
    VideoInfo::fixed(
        VideoFormat::RGBS,
        frame.width() as u32,
        frame.height() as u32,
        1,
    )
}
