pub mod html;
pub mod images;
pub mod json;
pub mod pdf;
pub mod terminal;
pub mod text;

use std::path::PathBuf;

use pagediff_engine::Threshold;

/// Run context printed alongside a summary.
#[derive(Debug, Clone)]
pub struct ReportMeta {
    pub doc1: PathBuf,
    pub doc2: PathBuf,
    pub doc1_pages: usize,
    pub doc2_pages: usize,
    pub dpi: u32,
    pub threshold: Threshold,
}

/// Human-facing 1-based page label.
pub fn page_label(page_index: usize) -> String {
    format!("Page {}", page_index + 1)
}

/// `diff_page_001.png` etc.; shared by the image writer and the HTML report.
pub fn image_file_name(page_index: usize) -> String {
    format!("diff_page_{:03}.png", page_index + 1)
}
