use std::borrow::Cow;

use ndarray::{ArrayViewMut1, Zip};

use crate::consts::PARALLEL_PIXEL_THRESHOLD;
use crate::error::Result;
use crate::frame::PlanarFrame;

use super::geometry::{KernelGeometry, ReciprocalTable};
use super::params::DenoiseParams;

/// Neighbor-consensus averaging kernel with its configuration baked in.
///
/// Every output pixel is the mean of the source pixel and each sampled
/// neighbor whose squared RGB distance from it is strictly below
/// `threshold_sq`, clamped to [0, 1]. The kernel cannot fail once built.
#[derive(Clone, Debug)]
pub struct DenoiseKernel {
    geometry: KernelGeometry,
    offsets: Vec<(isize, isize)>,
    reciprocals: Cow<'static, ReciprocalTable>,
    thr_sq: f32,
}

impl DenoiseKernel {
    /// Validate `params` and build the kernel.
    pub fn new(params: &DenoiseParams) -> Result<Self> {
        params.validate()?;
        Ok(Self::build(params.geometry, params.threshold_sq()))
    }

    /// Default-geometry kernel from an already converted squared threshold.
    pub fn canonical(thr_sq: f32) -> Self {
        Self::build(KernelGeometry::default(), thr_sq)
    }

    fn build(geometry: KernelGeometry, thr_sq: f32) -> Self {
        let offsets = geometry.offsets();
        let reciprocals = if geometry == KernelGeometry::default() {
            Cow::Borrowed(ReciprocalTable::canonical())
        } else {
            Cow::Owned(ReciprocalTable::for_max_weight(1 + offsets.len()))
        };
        Self {
            geometry,
            offsets,
            reciprocals,
            thr_sq,
        }
    }

    pub fn geometry(&self) -> KernelGeometry {
        self.geometry
    }

    pub fn threshold_sq(&self) -> f32 {
        self.thr_sq
    }

    pub fn offsets(&self) -> &[(isize, isize)] {
        &self.offsets
    }

    pub fn max_weight(&self) -> usize {
        self.reciprocals.max_weight()
    }

    /// Filter `src` into a freshly allocated frame with the same layout.
    pub fn apply(&self, src: &PlanarFrame) -> PlanarFrame {
        let mut dst = src.like();
        self.apply_into(src, &mut dst);
        dst
    }

    /// Filter `src` into `dst`. Both frames must have the same dimensions;
    /// strides may differ.
    pub fn apply_into(&self, src: &PlanarFrame, dst: &mut PlanarFrame) {
        debug_assert_eq!(src.width(), dst.width());
        debug_assert_eq!(src.height(), dst.height());

        let (h, w) = (src.height(), src.width());
        let [dst_r, dst_g, dst_b] = dst.planes_mut();
        let rows = Zip::indexed(dst_r.data_mut().rows_mut())
            .and(dst_g.data_mut().rows_mut())
            .and(dst_b.data_mut().rows_mut());

        if h * w >= PARALLEL_PIXEL_THRESHOLD {
            rows.par_for_each(|y, mut r, mut g, mut b| {
                self.denoise_row(src, y, &mut r, &mut g, &mut b);
            });
        } else {
            rows.for_each(|y, mut r, mut g, mut b| {
                self.denoise_row(src, y, &mut r, &mut g, &mut b);
            });
        }
    }

    /// Number of pixels (center included) averaged at `(x, y)`.
    pub fn sample_count(&self, src: &PlanarFrame, x: usize, y: usize) -> usize {
        self.denoise_pixel(src, x, y).1
    }

    fn denoise_row(
        &self,
        src: &PlanarFrame,
        y: usize,
        r_row: &mut ArrayViewMut1<f32>,
        g_row: &mut ArrayViewMut1<f32>,
        b_row: &mut ArrayViewMut1<f32>,
    ) {
        for x in 0..src.width() {
            let ([r, g, b], _) = self.denoise_pixel(src, x, y);
            r_row[x] = r;
            g_row[x] = g;
            b_row[x] = b;
        }
    }

    #[inline]
    fn denoise_pixel(&self, src: &PlanarFrame, x: usize, y: usize) -> ([f32; 3], usize) {
        let (h, w) = (src.height(), src.width());
        let [r, g, b] = src.pixel(x, y);
        let (mut sum_r, mut sum_g, mut sum_b) = (r, g, b);
        let mut n = 1usize;

        for &(dy, dx) in &self.offsets {
            let sy = mirror_index(y as isize + dy, h);
            let sx = mirror_index(x as isize + dx, w);
            let [cr, cg, cb] = src.pixel(sx, sy);

            let dist_sq = (cr - r) * (cr - r) + (cg - g) * (cg - g) + (cb - b) * (cb - b);
            if self.thr_sq > dist_sq {
                sum_r += cr;
                sum_g += cg;
                sum_b += cb;
                n += 1;
            }
        }

        let inv = self.reciprocals.get(n);
        let avg = |sum: f32| ((sum as f64 * inv) as f32).clamp(0.0, 1.0);
        ([avg(sum_r), avg(sum_g), avg(sum_b)], n)
    }
}

/// Reflect an index into `[0, size)` without repeating the edge sample:
/// `-k -> k` and `size - 1 + k -> size - 1 - k`.
///
/// Offsets larger than the image keep bouncing between the edges with period
/// `2 * (size - 1)`, so the result is always in bounds.
pub fn mirror_index(idx: isize, size: usize) -> usize {
    if size <= 1 {
        return 0;
    }
    let period = 2 * (size - 1);
    let m = idx.unsigned_abs() % period;

    if m < size {
        m
    } else {
        period - m
    }
}

/// Denoise a frame with the default geometry.
pub fn denoise(src: &PlanarFrame, thr_sq: f32) -> PlanarFrame {
    DenoiseKernel::canonical(thr_sq).apply(src)
}
