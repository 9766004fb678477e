use std::path::PathBuf;

use anyhow::{Context, Result};
use ccd_core::clip::FrameSource;
use ccd_core::denoise::DenoiseParams;
use ccd_core::filter::CcdFilter;
use ccd_core::frame::VideoInfo;
use ccd_core::io::image_io::{image_video_info, load_color_image};
use ccd_core::io::ser::SerReader;
use ccd_core::pipeline::config::InputKind;
use clap::Args;

#[derive(Args)]
pub struct InfoArgs {
    /// Input SER file or still image
    pub file: PathBuf,
}

pub fn run(args: &InfoArgs) -> Result<()> {
    let info = match InputKind::from_path(&args.file) {
        InputKind::Video => ser_info(args)?,
        InputKind::Image => image_info(args)?,
    };

    match CcdFilter::new(&info, &DenoiseParams::default()) {
        Ok(_) => println!("Denoise:     accepted"),
        Err(e) => println!("Denoise:     rejected ({e})"),
    }
    Ok(())
}

fn ser_info(args: &InfoArgs) -> Result<VideoInfo> {
    let reader = SerReader::open(&args.file)
        .with_context(|| format!("Failed to open {}", args.file.display()))?;
    let info = reader.source_info(&args.file);

    println!("File:        {}", info.filename.display());
    println!("Frames:      {}", info.total_frames);
    println!("Dimensions:  {}x{}", info.width, info.height);
    println!("Bit depth:   {}", info.bit_depth);
    println!("Color mode:  {:?}", info.color_mode);
    println!("Format:      {}", reader.header.video_format());

    if let Some(ref obs) = info.observer {
        println!("Observer:    {}", obs);
    }
    if let Some(ref tel) = info.telescope {
        println!("Telescope:   {}", tel);
    }
    if let Some(ref inst) = info.instrument {
        println!("Instrument:  {}", inst);
    }
    println!(
        "Timestamps:  {}",
        if reader.timestamps().is_some() { "yes" } else { "no" }
    );

    let frame_bytes = reader.frame_byte_size();
    let total_mb = (frame_bytes * info.total_frames) as f64 / (1024.0 * 1024.0);
    println!("Data size:   {:.1} MB", total_mb);

    Ok(reader.info())
}

fn image_info(args: &InfoArgs) -> Result<VideoInfo> {
    let frame = load_color_image(&args.file)
        .with_context(|| format!("Failed to load {}", args.file.display()))?;
    let info = image_video_info(&frame);

    println!("File:        {}", args.file.display());
    println!("Dimensions:  {}x{}", frame.width(), frame.height());
    if let Some(format) = info.format {
        println!("Format:      {}", format);
    }
    Ok(info)
}
