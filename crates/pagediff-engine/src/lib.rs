//! Visual difference engine for rasterized document pages.
//!
//! Two equal-sized RGB bitmaps go through [`PixelDiffEngine`] (mask, counts,
//! similarity), then [`RegionExtractor`] (bounding boxes), and end up as a
//! [`PageComparison`]. [`aggregate`] folds page results of two documents into
//! a [`ComparisonSummary`]; [`visualize`] draws the regions for reports.
//!
//! Everything here is synchronous and allocation-only: callers decide how to
//! parallelize pages.

pub mod aggregate;
pub mod bitmap;
mod error;
pub mod pixel;
pub mod regions;
pub mod result;
mod threshold;
pub mod visualize;

pub use aggregate::{
    ComparisonStatus, ComparisonSummary, PageCountMismatch, Side, SimilarityWeighting, aggregate,
};
pub use bitmap::DifferenceMask;
pub use error::DiffError;
pub use pixel::{PixelDiff, PixelDiffEngine};
pub use regions::{Region, RegionConfig, RegionExtractor};
pub use result::{PageComparison, PageOptions, PageOutput, compare_page};
pub use threshold::Threshold;
pub use visualize::HighlightStyle;
