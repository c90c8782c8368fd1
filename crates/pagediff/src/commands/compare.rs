use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use anyhow::{Result, bail};
use pagediff_engine::{PageComparison, aggregate};
use tracing::debug;

use crate::cli::CompareArgs;
use crate::compare::{CompareSettings, PageOutcome, compare_all};
use crate::config::ResolvedRunConfig;
use crate::document::Document;
use crate::report::{self, ReportMeta, terminal};

/// Exit code used when the run is interrupted with Ctrl-C.
const INTERRUPTED_EXIT_CODE: i32 = 130;

/// `pagediff compare`: render, compare, aggregate, report.
/// Returns exit code: 0 = identical, 1 = different.
pub async fn compare(config: ResolvedRunConfig, args: CompareArgs) -> Result<i32> {
    let (doc1, doc2) = tokio::try_join!(
        Document::open(&args.doc1, config.dpi),
        Document::open(&args.doc2, config.dpi)
    )?;
    let meta = ReportMeta {
        doc1: doc1.path().to_path_buf(),
        doc2: doc2.path().to_path_buf(),
        doc1_pages: doc1.page_count(),
        doc2_pages: doc2.page_count(),
        dpi: config.dpi,
        threshold: config.page.threshold,
    };
    let pages = meta.doc1_pages.min(meta.doc2_pages);
    debug!(
        doc1_pages = meta.doc1_pages,
        doc2_pages = meta.doc2_pages,
        pages,
        "documents loaded"
    );

    let show_output = !args.quiet;
    let show_progress = show_output && !args.no_progress;
    if show_output {
        terminal::print_header(&meta);
    }

    let cancel = Arc::new(AtomicBool::new(false));
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                cancel.store(true, Ordering::Relaxed);
            }
        });
    }

    let settings = CompareSettings {
        parallel: config.parallel,
        page: config.page,
        highlight: config.highlight,
        keep_images: args.wants_images(),
    };

    let run_start = Instant::now();
    let mut rx = compare_all(Arc::new(doc1), Arc::new(doc2), pages, settings, cancel.clone());

    let mut results: Vec<Option<PageComparison>> = vec![None; pages];
    let mut images: Vec<Option<Vec<u8>>> = vec![None; pages];
    let mut first_error: Option<(usize, String)> = None;
    let mut done = 0usize;

    if show_progress {
        terminal::show_progress(done, pages);
    }
    while let Some((index, outcome)) = rx.recv().await {
        done += 1;
        debug!(done, total = pages, page = index, "received result");
        match outcome {
            PageOutcome::Ok(page) => {
                if args.verbose {
                    terminal::print_page_line(&page.comparison, page.size_mismatch);
                }
                images[index] = page.annotated_png;
                results[index] = Some(page.comparison);
            }
            PageOutcome::Err(msg) => {
                if first_error.as_ref().is_none_or(|(i, _)| index < *i) {
                    first_error = Some((index, msg));
                }
            }
        }
        if show_progress {
            terminal::show_progress(done, pages);
        }
    }
    if show_progress {
        terminal::clear_line();
    }

    if cancel.load(Ordering::Relaxed) {
        eprintln!("\nInterrupted.");
        return Ok(INTERRUPTED_EXIT_CODE);
    }
    if let Some((index, msg)) = first_error {
        bail!("{} failed: {msg}", report::page_label(index));
    }

    let results: Vec<PageComparison> = results.into_iter().flatten().collect();
    if results.len() != pages {
        bail!("Only {} of {pages} pages were compared", results.len());
    }

    let summary = aggregate(results, meta.doc1_pages, meta.doc2_pages, config.weighting);
    debug!(
        identical = summary.are_identical,
        similarity = summary.overall_similarity,
        "comparison finished"
    );

    let mut outputs: Vec<(&str, &Path)> = Vec::new();
    if let Some(path) = &args.output_json {
        report::json::write(path, &meta, &summary)?;
        outputs.push(("json", path.as_path()));
    }
    if let Some(path) = &args.output_text {
        report::text::write(path, &meta, &summary)?;
        outputs.push(("text", path.as_path()));
    }
    if let Some(path) = &args.output_html {
        report::html::write(path, &meta, &summary, &images)?;
        outputs.push(("html", path.as_path()));
    }
    if let Some(path) = &args.output_pdf {
        report::pdf::write(path, &meta, &summary, &images)?;
        outputs.push(("pdf", path.as_path()));
    }
    if let Some(dir) = &args.output_images {
        report::images::write(dir, &images)?;
        outputs.push(("images", dir.as_path()));
    }

    if show_output {
        terminal::print_summary(&summary, run_start.elapsed());
        terminal::print_outputs(&outputs);
    }

    Ok(summary.status().exit_code())
}
