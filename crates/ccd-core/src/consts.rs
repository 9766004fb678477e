/// Minimum pixel count (h*w) to use row-level Rayon parallelism.
pub const PARALLEL_PIXEL_THRESHOLD: usize = 65_536;

/// Number of channels in a color frame (R, G, B).
pub const COLOR_CHANNEL_COUNT: usize = 3;

/// Default maximum sampling offset from the center pixel, per axis.
pub const DEFAULT_RADIUS: usize = 12;

/// Default spacing between sampled offsets along one axis.
pub const DEFAULT_STEP: usize = 8;

/// Upper bound on sampled offsets per axis (`1 + 2 * radius / step`).
/// Keeps the per-pixel work constant and the reciprocal table small.
pub const MAX_AXIS_TAPS: usize = 7;

/// Default user-facing color distance threshold.
pub const DEFAULT_THRESHOLD: f64 = 4.0;

/// Divisor mapping a squared user threshold into squared RGB distance space:
/// `(255 * sqrt(3))^2 = 195075`.
///
/// Carried over for compatibility with existing CCD settings. Where the
/// `sqrt(3)` factor comes from is unknown; do not read meaning into it.
pub const THRESHOLD_SCALE_SQ: f64 = 255.0 * 255.0 * 3.0;

/// Number of frames requested in parallel while streaming a video.
/// At 1920x1080 RGBS, 8 frames = ~400 MB of source + destination.
pub const STREAMING_BATCH_SIZE: usize = 8;
