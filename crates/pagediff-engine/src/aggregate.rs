use std::ops::Range;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::result::PageComparison;

/// How per-page similarities combine into `overall_similarity`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SimilarityWeighting {
    /// Arithmetic mean over compared pages; every page counts the same.
    #[default]
    PageMean,
    /// Pages weighted by their pixel count.
    PixelWeighted,
}

/// Which input document a page belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    First,
    Second,
}

/// The two documents have different page totals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PageCountMismatch {
    pub doc1_pages: usize,
    pub doc2_pages: usize,
}

impl PageCountMismatch {
    /// Pages of the longer document that were never compared.
    pub fn extra_pages(&self) -> (Side, Range<usize>) {
        if self.doc1_pages > self.doc2_pages {
            (Side::First, self.doc2_pages..self.doc1_pages)
        } else {
            (Side::Second, self.doc1_pages..self.doc2_pages)
        }
    }
}

/// Process-level outcome, as consumed by the command surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComparisonStatus {
    Identical,
    Different,
    Error,
}

impl ComparisonStatus {
    pub fn exit_code(self) -> i32 {
        match self {
            Self::Identical => 0,
            Self::Different => 1,
            Self::Error => 2,
        }
    }
}

/// Multi-page result of comparing two documents.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComparisonSummary {
    pub pages_compared: usize,
    pub pages_identical: usize,
    pub pages_different: usize,
    pub overall_similarity: f64,
    pub are_identical: bool,
    pub weighting: SimilarityWeighting,
    pub page_results: Vec<PageComparison>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_count_mismatch: Option<PageCountMismatch>,
}

impl ComparisonSummary {
    pub fn status(&self) -> ComparisonStatus {
        if self.are_identical {
            ComparisonStatus::Identical
        } else {
            ComparisonStatus::Different
        }
    }

    /// Indices of compared pages that differ.
    pub fn different_pages(&self) -> Vec<usize> {
        self.page_results
            .iter()
            .filter(|p| !p.is_identical)
            .map(|p| p.page_index)
            .collect()
    }

    pub fn page(&self, page_index: usize) -> Option<&PageComparison> {
        self.page_results.iter().find(|p| p.page_index == page_index)
    }
}

/// Combine per-page results of two documents with `doc1_pages` and `doc2_pages` pages.
///
/// Only pages below `min(doc1_pages, doc2_pages)` are kept; results are
/// ordered by page index, and a repeated index keeps its first result. Pages that exist in just one document are never
/// compared against blanks: they show up only through `page_count_mismatch`,
/// which alone makes the documents different.
///
/// With nothing compared, `overall_similarity` is 100 for two empty documents
/// and 0 when one side has pages the other lacks.
pub fn aggregate(
    mut results: Vec<PageComparison>,
    doc1_pages: usize,
    doc2_pages: usize,
    weighting: SimilarityWeighting,
) -> ComparisonSummary {
    let comparable = doc1_pages.min(doc2_pages);
    results.retain(|r| r.page_index < comparable);
    results.sort_by_key(|r| r.page_index);
    results.dedup_by_key(|r| r.page_index);

    let page_count_mismatch = (doc1_pages != doc2_pages).then_some(PageCountMismatch {
        doc1_pages,
        doc2_pages,
    });

    let pages_compared = results.len();
    let pages_identical = results.iter().filter(|r| r.is_identical).count();
    let pages_different = pages_compared - pages_identical;

    let overall_similarity = if results.is_empty() {
        if page_count_mismatch.is_some() { 0.0 } else { 100.0 }
    } else {
        match weighting {
            SimilarityWeighting::PageMean => {
                results.iter().map(|r| r.similarity_percentage).sum::<f64>()
                    / pages_compared as f64
            }
            SimilarityWeighting::PixelWeighted => {
                let total: f64 = results.iter().map(|r| r.total_pixel_count as f64).sum();
                results
                    .iter()
                    .map(|r| r.similarity_percentage * r.total_pixel_count as f64)
                    .sum::<f64>()
                    / total
            }
        }
    };

    let are_identical = pages_different == 0 && page_count_mismatch.is_none();
    debug!(
        pages_compared,
        pages_identical,
        pages_different,
        overall_similarity,
        mismatch = page_count_mismatch.is_some(),
        "aggregated"
    );

    ComparisonSummary {
        pages_compared,
        pages_identical,
        pages_different,
        overall_similarity,
        are_identical,
        weighting,
        page_results: results,
        page_count_mismatch,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(index: usize, differing: u64, total: u64) -> PageComparison {
        let similarity = crate::pixel::similarity(differing, total);
        PageComparison {
            page_index: index,
            is_identical: differing == 0,
            similarity_percentage: similarity,
            differing_pixel_count: differing,
            total_pixel_count: total,
            regions: Vec::new(),
        }
    }

    #[test]
    fn all_identical() {
        let s = aggregate(
            vec![page(0, 0, 100), page(1, 0, 100)],
            2,
            2,
            SimilarityWeighting::PageMean,
        );
        assert_eq!(s.pages_compared, 2);
        assert_eq!(s.pages_identical, 2);
        assert_eq!(s.pages_different, 0);
        assert_eq!(s.overall_similarity, 100.0);
        assert!(s.are_identical);
        assert!(s.page_count_mismatch.is_none());
        assert_eq!(s.status(), ComparisonStatus::Identical);
        assert_eq!(s.status().exit_code(), 0);
    }

    #[test]
    fn one_page_differs() {
        let s = aggregate(
            vec![page(0, 0, 100), page(1, 50, 100)],
            2,
            2,
            SimilarityWeighting::PageMean,
        );
        assert_eq!(s.pages_identical, 1);
        assert_eq!(s.pages_different, 1);
        assert!((s.overall_similarity - 75.0).abs() < 1e-9);
        assert!(!s.are_identical);
        assert_eq!(s.different_pages(), vec![1]);
        assert_eq!(s.status().exit_code(), 1);
    }

    #[test]
    fn extra_pages_make_documents_different() {
        let results = (0..3).map(|i| page(i, 0, 1000)).collect();
        let s = aggregate(results, 5, 3, SimilarityWeighting::PageMean);
        assert_eq!(s.pages_compared, 3);
        assert_eq!(s.pages_identical, 3);
        assert_eq!(s.pages_different, 0);
        assert_eq!(
            s.page_count_mismatch,
            Some(PageCountMismatch {
                doc1_pages: 5,
                doc2_pages: 3
            })
        );
        assert!(!s.are_identical);
        assert_eq!(s.status(), ComparisonStatus::Different);
        assert_eq!(
            s.page_count_mismatch.unwrap().extra_pages(),
            (Side::First, 3..5)
        );
    }

    #[test]
    fn second_document_longer() {
        let m = PageCountMismatch {
            doc1_pages: 1,
            doc2_pages: 4,
        };
        assert_eq!(m.extra_pages(), (Side::Second, 1..4));
    }

    #[test]
    fn results_beyond_shorter_document_are_dropped_and_sorted() {
        let results = vec![page(2, 0, 10), page(0, 1, 10), page(3, 5, 10), page(1, 0, 10)];
        let s = aggregate(results, 3, 4, SimilarityWeighting::PageMean);
        let indices: Vec<usize> = s.page_results.iter().map(|p| p.page_index).collect();
        assert_eq!(indices, vec![0, 1, 2]);
        assert_eq!(s.pages_compared, 3);
        assert!(s.page(3).is_none());
        assert_eq!(s.page(0).map(|p| p.differing_pixel_count), Some(1));
    }

    #[test]
    fn repeated_page_index_counts_once() {
        let s = aggregate(
            vec![page(1, 0, 100), page(0, 0, 100), page(1, 50, 100)],
            2,
            2,
            SimilarityWeighting::PageMean,
        );
        assert_eq!(s.pages_compared, 2);
        assert_eq!(s.pages_identical, 2);
        assert!(s.are_identical);
        assert_eq!(
            s.page_results.iter().map(|p| p.page_index).collect::<Vec<_>>(),
            vec![0, 1]
        );
    }

    #[test]
    fn counts_always_add_up() {
        for n in 0..6 {
            let results = (0..n).map(|i| page(i, (i % 2) as u64, 10)).collect();
            let s = aggregate(results, n, n + (n % 2), SimilarityWeighting::PageMean);
            assert_eq!(s.pages_identical + s.pages_different, s.pages_compared);
            if s.page_count_mismatch.is_some() {
                assert!(!s.are_identical);
            }
        }
    }

    #[test]
    fn weighting_changes_overall() {
        // A small fully-different page and a large identical one.
        let results = vec![page(0, 100, 100), page(1, 0, 900)];
        let mean = aggregate(results.clone(), 2, 2, SimilarityWeighting::PageMean);
        assert!((mean.overall_similarity - 50.0).abs() < 1e-9);
        let weighted = aggregate(results, 2, 2, SimilarityWeighting::PixelWeighted);
        assert!((weighted.overall_similarity - 90.0).abs() < 1e-9);
    }

    #[test]
    fn empty_documents() {
        let s = aggregate(Vec::new(), 0, 0, SimilarityWeighting::PageMean);
        assert!(s.are_identical);
        assert_eq!(s.overall_similarity, 100.0);

        let s = aggregate(Vec::new(), 2, 0, SimilarityWeighting::PageMean);
        assert!(!s.are_identical);
        assert_eq!(s.overall_similarity, 0.0);
    }

    #[test]
    fn error_status_code() {
        assert_eq!(ComparisonStatus::Error.exit_code(), 2);
    }

    #[test]
    fn serializes_without_mismatch_when_counts_match() {
        let s = aggregate(vec![page(0, 0, 4)], 1, 1, SimilarityWeighting::PageMean);
        let json = serde_json::to_value(&s).unwrap();
        assert!(json.get("page_count_mismatch").is_none());
        assert_eq!(json["weighting"], "page-mean");
        assert_eq!(json["are_identical"], true);
    }
}
