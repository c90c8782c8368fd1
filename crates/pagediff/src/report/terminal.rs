use std::io::Write;
use std::path::Path;
use std::time::Duration;

use pagediff_engine::{ComparisonSummary, PageComparison, Side};

use super::{ReportMeta, page_label};
use crate::document::SizeMismatch;

/// Clear the current terminal line (wipes progress indicator).
pub fn clear_line() {
    print!("\r\x1b[2K");
}

pub fn format_duration(d: Duration) -> String {
    let ms = d.as_millis();
    if ms < 1000 {
        format!("{ms}ms")
    } else {
        format!("{:.1}s", d.as_secs_f64())
    }
}

/// Show comparison progress indicator.
pub fn show_progress(done: usize, total: usize) {
    if done < total {
        clear_line();
        print!("  Comparing  [{done}/{total}]");
        let _ = std::io::stdout().flush();
    }
}

pub fn print_header(meta: &ReportMeta) {
    println!(
        "Comparing {} ({} pages) with {} ({} pages)",
        meta.doc1.display(),
        meta.doc1_pages,
        meta.doc2.display(),
        meta.doc2_pages
    );
    println!(
        "  \x1b[2mdpi {}, threshold {}\x1b[0m",
        meta.dpi, meta.threshold
    );
    println!();
}

fn page_line(page: &PageComparison, size_mismatch: Option<SizeMismatch>) -> String {
    let label = page_label(page.page_index);
    let mut line = if page.is_identical {
        format!("  \x1b[32mSAME\x1b[0m  {label}")
    } else {
        format!(
            "  \x1b[31mDIFF\x1b[0m  {label}  ({:.2}% similar, {} pixels, {} region(s))",
            page.similarity_percentage,
            page.differing_pixel_count,
            page.region_count()
        )
    };
    if let Some((lw, lh, rw, rh)) = size_mismatch {
        line.push_str(&format!("  \x1b[2m(padded: {lw}x{lh} vs {rw}x{rh})\x1b[0m"));
    }
    line
}

/// Print a single page result line.
pub fn print_page_line(page: &PageComparison, size_mismatch: Option<SizeMismatch>) {
    clear_line();
    println!("{}", page_line(page, size_mismatch));
}

/// Print the final summary.
pub fn print_summary(summary: &ComparisonSummary, elapsed: Duration) {
    clear_line();
    println!();
    if summary.are_identical {
        println!("Result:     \x1b[32mIDENTICAL\x1b[0m");
    } else {
        println!("Result:     \x1b[31mDIFFERENT\x1b[0m");
    }
    println!("Similarity: {:.2}%", summary.overall_similarity);
    println!(
        "Pages:      {} compared, \x1b[32m{} identical\x1b[0m, \x1b[31m{} different\x1b[0m",
        summary.pages_compared, summary.pages_identical, summary.pages_different
    );
    println!("Time:       {}", format_duration(elapsed));

    if let Some(mismatch) = summary.page_count_mismatch {
        let (side, extra) = mismatch.extra_pages();
        let doc = match side {
            Side::First => "first",
            Side::Second => "second",
        };
        println!();
        println!(
            "\x1b[33mPage counts differ ({} vs {}).\x1b[0m Pages {}-{} exist only in the {doc} document.",
            mismatch.doc1_pages,
            mismatch.doc2_pages,
            extra.start + 1,
            extra.end
        );
    }

    let different = summary.different_pages();
    if !different.is_empty() && different.len() <= 20 {
        let labels: Vec<String> = different.iter().map(|&i| (i + 1).to_string()).collect();
        println!();
        println!("Different pages: {}", labels.join(", "));
    }
}

/// List the report files that were written.
pub fn print_outputs(outputs: &[(&str, &Path)]) {
    if outputs.is_empty() {
        return;
    }
    println!();
    for (kind, path) in outputs {
        println!("  {kind:<6} {}", path.display());
    }
}
