use std::path::Path;

use anyhow::{Context, Result};
use pagediff_engine::{ComparisonSummary, Threshold};
use serde::Serialize;

use super::ReportMeta;

#[derive(Serialize)]
struct JsonReport<'a> {
    doc1: String,
    doc2: String,
    doc1_pages: usize,
    doc2_pages: usize,
    dpi: u32,
    threshold: Threshold,
    #[serde(flatten)]
    summary: &'a ComparisonSummary,
}

pub fn build(meta: &ReportMeta, summary: &ComparisonSummary) -> Result<String> {
    let report = JsonReport {
        doc1: meta.doc1.display().to_string(),
        doc2: meta.doc2.display().to_string(),
        doc1_pages: meta.doc1_pages,
        doc2_pages: meta.doc2_pages,
        dpi: meta.dpi,
        threshold: meta.threshold,
        summary,
    };
    serde_json::to_string_pretty(&report).context("Failed to serialize JSON report")
}

pub fn write(path: &Path, meta: &ReportMeta, summary: &ComparisonSummary) -> Result<()> {
    let json = build(meta, summary)?;
    std::fs::write(path, json).with_context(|| format!("Failed to write {}", path.display()))
}
