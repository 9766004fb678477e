mod common;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use ccd_core::denoise::{denoise, threshold_to_sq, DenoiseParams};
use ccd_core::error::CcdError;
use ccd_core::io::image_io::{load_color_image, save_color_png};
use ccd_core::io::ser::{SerReader, SER_HEADER_SIZE};
use ccd_core::pipeline::config::{InputKind, PipelineConfig};
use ccd_core::pipeline::{run_pipeline, run_pipeline_reported, PipelineStage, ProgressReporter};

use common::{
    assert_frames_close, build_ser, noisy_frame, noisy_rgb_bytes, write_temp_file, COLOR_MONO,
    COLOR_RGB,
};

const W: u32 = 16;
const H: u32 = 16;

fn noisy_ser(frames: usize, timestamps: Option<&[u64]>) -> tempfile::NamedTempFile {
    let data: Vec<Vec<u8>> = (0..frames)
        .map(|i| noisy_rgb_bytes(W, H, i as u32))
        .collect();
    write_temp_file(&build_ser(W, H, COLOR_RGB, &data, timestamps))
}

#[derive(Default)]
struct RecordingReporter {
    stages: Mutex<Vec<PipelineStage>>,
    advanced: AtomicUsize,
}

impl ProgressReporter for RecordingReporter {
    fn begin_stage(&self, stage: PipelineStage, _total_items: Option<usize>) {
        self.stages.lock().unwrap().push(stage);
    }

    fn advance(&self, items_done: usize) {
        self.advanced.fetch_add(items_done, Ordering::Relaxed);
    }
}

// ---------------------------------------------------------------------------
// SER video
// ---------------------------------------------------------------------------

#[test]
fn test_ser_zero_threshold_preserves_frames() {
    let input = noisy_ser(3, Some(&[5, 6, 7]));
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("out.ser");

    let mut config = PipelineConfig::new(input.path(), &output);
    config.denoise = DenoiseParams::new(0.0);
    let summary = run_pipeline(&config).unwrap();

    assert_eq!(summary.kind, InputKind::Video);
    assert_eq!(summary.frames, 3);
    assert_eq!((summary.width, summary.height), (W, H));

    let src = std::fs::read(input.path()).unwrap();
    let dst = std::fs::read(&output).unwrap();
    assert_eq!(src[SER_HEADER_SIZE..], dst[SER_HEADER_SIZE..]);

    let reader = SerReader::open(&output).unwrap();
    assert_eq!(reader.timestamps(), Some(vec![5, 6, 7]));
}

#[test]
fn test_ser_default_threshold_matches_kernel() {
    let input = noisy_ser(2, None);
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("out.ser");

    let mut config = PipelineConfig::new(input.path(), &output);
    config.denoise = DenoiseParams::new(120.0);
    run_pipeline(&config).unwrap();

    let src = SerReader::open(input.path()).unwrap();
    let dst = SerReader::open(&output).unwrap();
    assert_eq!(dst.frame_count(), 2);
    assert_eq!(dst.timestamps(), None);
    for i in 0..2 {
        let expected = denoise(&src.read_frame(i).unwrap(), threshold_to_sq(120.0));
        let got = dst.read_frame(i).unwrap();
        assert_frames_close(&got, &expected, 0.5 / 255.0 + 1e-6);
    }
}

#[test]
fn test_ser_batch_size_does_not_change_output() {
    let input = noisy_ser(5, None);
    let dir = tempfile::tempdir().unwrap();

    let mut outputs = Vec::new();
    for batch_size in [1, 2, 8] {
        let output = dir.path().join(format!("out{batch_size}.ser"));
        let mut config = PipelineConfig::new(input.path(), &output);
        config.denoise = DenoiseParams::new(60.0);
        config.batch_size = batch_size;
        run_pipeline(&config).unwrap();
        outputs.push(std::fs::read(&output).unwrap());
    }
    assert_eq!(outputs[0], outputs[1]);
    assert_eq!(outputs[0], outputs[2]);
}

#[test]
fn test_ser_reporter_sees_every_stage() {
    let input = noisy_ser(4, None);
    let dir = tempfile::tempdir().unwrap();
    let config = PipelineConfig::new(input.path(), dir.path().join("out.ser"));

    let reporter = Arc::new(RecordingReporter::default());
    run_pipeline_reported(&config, reporter.clone()).unwrap();

    assert_eq!(
        *reporter.stages.lock().unwrap(),
        vec![
            PipelineStage::Reading,
            PipelineStage::Validating,
            PipelineStage::Denoising,
            PipelineStage::Writing,
        ]
    );
    assert_eq!(reporter.advanced.load(Ordering::Relaxed), 4);
}

// ---------------------------------------------------------------------------
// Fail closed
// ---------------------------------------------------------------------------

#[test]
fn test_mono_ser_rejected_without_output() {
    let input = write_temp_file(&build_ser(W, H, COLOR_MONO, &[vec![0; 256]], None));
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("out.ser");

    let err = run_pipeline(&PipelineConfig::new(input.path(), &output)).unwrap_err();
    assert!(matches!(err, CcdError::UnsupportedFormat(_)), "got {err:?}");
    assert!(err.to_string().contains("GRAY8"));
    assert!(!output.exists());
}

#[test]
fn test_small_ser_rejected_without_output() {
    let frame = noisy_rgb_bytes(8, 8, 1);
    let input = write_temp_file(&build_ser(8, 8, COLOR_RGB, &[frame], None));
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("out.ser");

    let err = run_pipeline(&PipelineConfig::new(input.path(), &output)).unwrap_err();
    assert!(matches!(err, CcdError::FrameTooSmall { .. }));
    assert!(!output.exists());
}

#[test]
fn test_negative_threshold_rejected_before_reading() {
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("out.ser");
    let mut config = PipelineConfig::new(dir.path().join("missing.ser"), &output);
    config.denoise = DenoiseParams::new(-2.0);

    let err = run_pipeline(&config).unwrap_err();
    assert!(matches!(err, CcdError::NegativeThreshold(_)));
    assert!(!output.exists());
}

#[test]
fn test_output_same_as_input_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("clip.ser");
    let data: Vec<Vec<u8>> = (0..2).map(|i| noisy_rgb_bytes(W, H, i)).collect();
    let original = build_ser(W, H, COLOR_RGB, &data, None);
    std::fs::write(&path, &original).unwrap();

    let err = run_pipeline(&PipelineConfig::new(&path, &path)).unwrap_err();
    assert!(matches!(err, CcdError::OutputIsInput(_)), "got {err:?}");
    assert_eq!(std::fs::read(&path).unwrap(), original);
}

#[cfg(unix)]
#[test]
fn test_output_linked_to_input_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("clip.ser");
    let original = build_ser(W, H, COLOR_RGB, &[noisy_rgb_bytes(W, H, 3)], None);
    std::fs::write(&path, &original).unwrap();

    let hard = dir.path().join("hard.ser");
    std::fs::hard_link(&path, &hard).unwrap();
    let soft = dir.path().join("soft.ser");
    std::os::unix::fs::symlink(&path, &soft).unwrap();

    for output in [hard, soft] {
        let err = run_pipeline(&PipelineConfig::new(&path, &output)).unwrap_err();
        assert!(matches!(err, CcdError::OutputIsInput(_)), "got {err:?}");
    }
    assert_eq!(std::fs::read(&path).unwrap(), original);
}

#[test]
fn test_empty_ser_rejected() {
    let input = write_temp_file(&build_ser(W, H, COLOR_RGB, &[], None));
    let dir = tempfile::tempdir().unwrap();
    let err = run_pipeline(&PipelineConfig::new(input.path(), dir.path().join("o.ser")))
        .unwrap_err();
    assert!(matches!(err, CcdError::EmptySequence));
}

// ---------------------------------------------------------------------------
// Still images
// ---------------------------------------------------------------------------

#[test]
fn test_image_pipeline_png() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("in.png");
    let output = dir.path().join("out.png");
    save_color_png(&noisy_frame(20, 16, 77), &input).unwrap();

    let mut config = PipelineConfig::new(&input, &output);
    config.denoise = DenoiseParams::new(100.0);
    let summary = run_pipeline(&config).unwrap();
    assert_eq!(summary.kind, InputKind::Image);
    assert_eq!(summary.frames, 1);

    let loaded = load_color_image(&input).unwrap();
    let expected = denoise(&loaded, threshold_to_sq(100.0));
    let got = load_color_image(&output).unwrap();
    assert_frames_close(&got, &expected, 0.5 / 255.0 + 1e-6);
}

#[test]
fn test_image_output_extension_case_insensitive() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("in.png");
    let output = dir.path().join("OUT.PNG");
    save_color_png(&noisy_frame(16, 16, 5), &input).unwrap();

    run_pipeline(&PipelineConfig::new(&input, &output)).unwrap();
    let bytes = std::fs::read(&output).unwrap();
    assert_eq!(&bytes[1..4], b"PNG");
}

#[test]
fn test_image_too_small_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("tiny.png");
    let output = dir.path().join("out.png");
    save_color_png(&noisy_frame(6, 6, 1), &input).unwrap();

    let err = run_pipeline(&PipelineConfig::new(&input, &output)).unwrap_err();
    assert!(matches!(err, CcdError::FrameTooSmall { .. }));
    assert!(!output.exists());
}
