use std::fmt::Write as _;
use std::path::Path;

use anyhow::{Context, Result};
use pagediff_engine::{ComparisonSummary, Side};

use super::{ReportMeta, page_label};

/// Plain-text summary, also used for `--output-text`.
pub fn build(meta: &ReportMeta, summary: &ComparisonSummary) -> String {
    let mut out = String::new();
    let rule = "=".repeat(50);

    // Writing into a String cannot fail.
    let _ = writeln!(out, "Document Comparison Summary");
    let _ = writeln!(out, "{rule}");
    let _ = writeln!(
        out,
        "Document 1: {} ({} pages)",
        meta.doc1.display(),
        meta.doc1_pages
    );
    let _ = writeln!(
        out,
        "Document 2: {} ({} pages)",
        meta.doc2.display(),
        meta.doc2_pages
    );
    let _ = writeln!(out, "DPI: {}, Threshold: {}", meta.dpi, meta.threshold);
    let _ = writeln!(out);
    let verdict = if summary.are_identical {
        "IDENTICAL"
    } else {
        "DIFFERENT"
    };
    let _ = writeln!(out, "Result: {verdict}");
    let _ = writeln!(out);
    let _ = writeln!(
        out,
        "Overall Similarity: {:.2}%",
        summary.overall_similarity
    );
    let _ = writeln!(out, "Pages Compared: {}", summary.pages_compared);
    let _ = writeln!(out, "Identical Pages: {}", summary.pages_identical);
    let _ = writeln!(out, "Different Pages: {}", summary.pages_different);

    if let Some(mismatch) = summary.page_count_mismatch {
        let (side, extra) = mismatch.extra_pages();
        let which = match side {
            Side::First => 1,
            Side::Second => 2,
        };
        let _ = writeln!(
            out,
            "Page Count Mismatch: {} vs {} (pages {}-{} only in document {which})",
            mismatch.doc1_pages,
            mismatch.doc2_pages,
            extra.start + 1,
            extra.end,
        );
    }

    if !summary.page_results.is_empty() {
        let _ = writeln!(out);
        let _ = writeln!(out, "Per-Page Details:");
        let _ = writeln!(out, "{}", "-".repeat(50));
        for page in &summary.page_results {
            let status = if page.is_identical {
                "IDENTICAL"
            } else {
                "DIFFERENT"
            };
            let _ = writeln!(out, "  {}: {status}", page_label(page.page_index));
            if !page.is_identical {
                let _ = writeln!(out, "    Similarity: {:.2}%", page.similarity_percentage);
                let _ = writeln!(
                    out,
                    "    Different Pixels: {} / {}",
                    page.differing_pixel_count, page.total_pixel_count
                );
                let _ = writeln!(out, "    Difference Regions: {}", page.region_count());
                for r in &page.regions {
                    let _ = writeln!(
                        out,
                        "      at ({}, {}) size {}x{}",
                        r.x, r.y, r.width, r.height
                    );
                }
            }
        }
    }

    out
}

pub fn write(path: &Path, meta: &ReportMeta, summary: &ComparisonSummary) -> Result<()> {
    std::fs::write(path, build(meta, summary))
        .with_context(|| format!("Failed to write {}", path.display()))
}
