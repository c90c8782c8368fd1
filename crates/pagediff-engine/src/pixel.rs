use image::RgbImage;
use tracing::debug;

use crate::bitmap::{DifferenceMask, validate_pair};
use crate::{DiffError, Threshold};

/// Outcome of a pixel-by-pixel comparison.
///
/// Counts are per pixel: a pixel that differs in all three channels counts once,
/// and `total_pixel_count` is `width * height`.
#[derive(Debug, Clone)]
pub struct PixelDiff {
    pub mask: DifferenceMask,
    pub differing_pixel_count: u64,
    pub total_pixel_count: u64,
    /// 100.0 only when no pixel differs.
    pub similarity_percentage: f64,
    /// Largest per-channel delta seen anywhere, regardless of threshold.
    pub max_channel_delta: u8,
}

impl PixelDiff {
    pub fn is_identical(&self) -> bool {
        self.differing_pixel_count == 0
    }
}

/// Compares equal-sized RGB bitmaps under a per-channel tolerance.
#[derive(Debug, Clone, Copy, Default)]
pub struct PixelDiffEngine {
    pub threshold: Threshold,
}

impl PixelDiffEngine {
    pub fn new(threshold: Threshold) -> Self {
        Self { threshold }
    }

    /// A pixel differs when any channel's absolute delta exceeds the threshold.
    ///
    /// Linear in pixel count; no allocation besides the mask.
    pub fn compare(&self, left: &RgbImage, right: &RgbImage) -> Result<PixelDiff, DiffError> {
        validate_pair(left, right)?;

        let (w, h) = left.dimensions();
        let total_pixel_count = (w as u64) * (h as u64);
        let limit = self.threshold.value();

        let mut cells = Vec::with_capacity(total_pixel_count as usize);
        let mut differing_pixel_count: u64 = 0;
        let mut max_channel_delta: u8 = 0;

        for (lp, rp) in left
            .as_raw()
            .chunks_exact(3)
            .zip(right.as_raw().chunks_exact(3))
        {
            let delta = lp[0]
                .abs_diff(rp[0])
                .max(lp[1].abs_diff(rp[1]))
                .max(lp[2].abs_diff(rp[2]));
            max_channel_delta = max_channel_delta.max(delta);
            let differs = delta > limit;
            differing_pixel_count += differs as u64;
            cells.push(differs);
        }

        let similarity_percentage = similarity(differing_pixel_count, total_pixel_count);
        debug!(
            width = w,
            height = h,
            threshold = limit,
            differing = differing_pixel_count,
            max_channel_delta,
            "pixel comparison done"
        );

        Ok(PixelDiff {
            mask: DifferenceMask::from_cells(w, h, cells),
            differing_pixel_count,
            total_pixel_count,
            similarity_percentage,
            max_channel_delta,
        })
    }
}

/// `100 * (1 - differing / total)`, kept strictly below 100 whenever anything
/// differs so that "similarity == 100" and "identical" never disagree.
pub(crate) fn similarity(differing: u64, total: u64) -> f64 {
    if differing == 0 || total == 0 {
        return 100.0;
    }
    let pct = 100.0 * (1.0 - differing as f64 / total as f64);
    pct.min(f64::from_bits(100.0_f64.to_bits() - 1))
}
