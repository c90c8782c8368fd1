use image::RgbImage;
use serde::{Deserialize, Serialize};

use crate::bitmap::DifferenceMask;
use crate::pixel::{PixelDiff, PixelDiffEngine};
use crate::regions::{Region, RegionConfig, RegionExtractor};
use crate::{DiffError, Threshold};

/// Per-page comparison outcome.
///
/// `is_identical`, `differing_pixel_count == 0` and `similarity_percentage == 100.0`
/// always agree.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PageComparison {
    pub page_index: usize,
    pub is_identical: bool,
    pub similarity_percentage: f64,
    pub differing_pixel_count: u64,
    pub total_pixel_count: u64,
    pub regions: Vec<Region>,
}

impl PageComparison {
    pub fn new(page_index: usize, diff: &PixelDiff, regions: Vec<Region>) -> Self {
        Self {
            page_index,
            is_identical: diff.differing_pixel_count == 0,
            similarity_percentage: diff.similarity_percentage,
            differing_pixel_count: diff.differing_pixel_count,
            total_pixel_count: diff.total_pixel_count,
            regions,
        }
    }

    pub fn difference_percentage(&self) -> f64 {
        100.0 - self.similarity_percentage
    }

    pub fn region_count(&self) -> usize {
        self.regions.len()
    }
}

/// Everything needed to compare one page pair.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageOptions {
    pub threshold: Threshold,
    pub regions: RegionConfig,
}

/// The comparison plus the mask it was derived from (for visualization).
#[derive(Debug, Clone)]
pub struct PageOutput {
    pub comparison: PageComparison,
    pub mask: DifferenceMask,
}

/// Run the pixel engine and region extractor over one page pair.
pub fn compare_page(
    page_index: usize,
    left: &RgbImage,
    right: &RgbImage,
    options: &PageOptions,
) -> Result<PageOutput, DiffError> {
    let diff = PixelDiffEngine::new(options.threshold).compare(left, right)?;
    let regions = RegionExtractor::new(options.regions).extract(&diff.mask);
    let comparison = PageComparison::new(page_index, &diff, regions);
    Ok(PageOutput {
        comparison,
        mask: diff.mask,
    })
}
