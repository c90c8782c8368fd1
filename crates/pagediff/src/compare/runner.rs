use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use anyhow::{Context, Result};
use image::{ImageFormat, RgbImage};
use pagediff_engine::{HighlightStyle, PageOptions, compare_page, visualize};
use tokio::sync::{Mutex, mpsc};
use tracing::{Instrument, debug, debug_span, info_span, warn};

use super::{ComparedPage, PageOutcome};
use crate::document::{Document, normalize};

#[derive(Debug, Clone, Copy)]
pub struct CompareSettings {
    pub parallel: usize,
    pub page: PageOptions,
    pub highlight: HighlightStyle,
    /// Produce annotated PNGs for reports.
    pub keep_images: bool,
}

/// Compare pages `0..pages` of both documents on a fixed pool of workers.
///
/// Workers pull page indices in order from a shared queue. `cancel` and the
/// first page failure are only checked between pages, never mid-comparison.
///
/// Returns a `Receiver` immediately. Outcomes stream in as pages complete,
/// tagged with their page index.
pub fn compare_all(
    doc1: Arc<Document>,
    doc2: Arc<Document>,
    pages: usize,
    settings: CompareSettings,
    cancel: Arc<AtomicBool>,
) -> mpsc::Receiver<(usize, PageOutcome)> {
    let parallel = settings.parallel.max(1);
    let worker_count = pages.min(parallel);
    debug!(pages, workers = worker_count, parallel, "starting comparison run");

    let queue = Arc::new(Mutex::new((0..pages).collect::<VecDeque<usize>>()));
    let failed = Arc::new(AtomicBool::new(false));
    let (tx, rx) = mpsc::channel(parallel * 2);

    let mut set = tokio::task::JoinSet::new();
    for idx in 0..worker_count {
        let queue = queue.clone();
        let tx = tx.clone();
        let doc1 = doc1.clone();
        let doc2 = doc2.clone();
        let cancel = cancel.clone();
        let failed = failed.clone();
        let span = info_span!("worker", id = idx);
        set.spawn(
            async move {
                debug!("started");
                loop {
                    if cancel.load(Ordering::Relaxed) {
                        debug!("cancelled, exiting");
                        break;
                    }
                    if failed.load(Ordering::Relaxed) {
                        debug!("another page failed, exiting");
                        break;
                    }

                    let (index, remaining) = {
                        let mut q = queue.lock().await;
                        match q.pop_front() {
                            Some(i) => (i, q.len()),
                            None => {
                                debug!("queue empty, exiting");
                                break;
                            }
                        }
                    };
                    debug!(page = index, remaining, "picked page");

                    let started = Instant::now();
                    let outcome = match compare_one(&doc1, &doc2, index, settings)
                        .instrument(debug_span!("page", index))
                        .await
                    {
                        Ok(page) => {
                            debug!(
                                page = index,
                                identical = page.comparison.is_identical,
                                elapsed_ms = started.elapsed().as_millis() as u64,
                                "compared"
                            );
                            PageOutcome::Ok(page)
                        }
                        Err(e) => {
                            warn!(page = index, error = %format!("{e:#}"), "page failed");
                            failed.store(true, Ordering::Relaxed);
                            PageOutcome::Err(format!("{e:#}"))
                        }
                    };

                    if tx.send((index, outcome)).await.is_err() {
                        warn!("channel send failed (receiver dropped), stopping");
                        break;
                    }
                }
                debug!("exiting");
            }
            .instrument(span),
        );
    }

    // Channel closes once every worker's sender is gone.
    drop(tx);

    tokio::spawn(async move {
        while let Some(result) = set.join_next().await {
            if let Err(e) = result {
                warn!(error = %e, "worker task panicked");
            }
        }
        debug!("all workers done");
    });

    rx
}

/// Render, normalize, compare and (optionally) annotate one page pair.
async fn compare_one(
    doc1: &Document,
    doc2: &Document,
    index: usize,
    settings: CompareSettings,
) -> Result<ComparedPage> {
    let (left, right) = tokio::try_join!(doc1.render_page(index), doc2.render_page(index))?;

    tokio::task::spawn_blocking(move || -> Result<ComparedPage> {
        let (left, right, size_mismatch) = normalize(left, right);
        if let Some((lw, lh, rw, rh)) = size_mismatch {
            warn!(
                page = index + 1,
                "page sizes differ ({lw}x{lh} vs {rw}x{rh}), padded with white"
            );
        }

        let output = compare_page(index, &left, &right, &settings.page)?;

        let annotated_png = if settings.keep_images {
            let annotated = visualize::render_with_mask(
                &left,
                &output.mask,
                &output.comparison.regions,
                &settings.highlight,
            );
            Some(encode_png(&annotated)?)
        } else {
            None
        };

        Ok(ComparedPage {
            comparison: output.comparison,
            annotated_png,
            size_mismatch,
        })
    })
    .await
    .context("Comparison task panicked")?
}

fn encode_png(img: &RgbImage) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    img.write_to(&mut std::io::Cursor::new(&mut buf), ImageFormat::Png)
        .context("Failed to encode annotated page")?;
    Ok(buf)
}
