pub mod runner;

use pagediff_engine::PageComparison;

use crate::document::SizeMismatch;

pub use self::runner::{CompareSettings, compare_all};

/// A page pair that went through the engine.
pub struct ComparedPage {
    pub comparison: PageComparison,
    /// Annotated PNG of the first document's page; only when a report needs it.
    pub annotated_png: Option<Vec<u8>>,
    /// Set when the two pages were rendered at different sizes and padded.
    pub size_mismatch: Option<SizeMismatch>,
}

/// Per-page outcome streamed back from the workers.
pub enum PageOutcome {
    Ok(ComparedPage),
    Err(String),
}
