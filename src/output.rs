//! Results of an extraction run.

use crate::error::PageError;
use crate::record::Record;
use serde::{Deserialize, Serialize};

/// Outcome of one page.
///
/// A failed page has no records and carries the reason in `error`; a page that
/// simply held no inventions has no records and no error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageResult {
    /// 1-indexed page number.
    pub page_num: usize,
    /// Records in the order the model emitted them.
    pub records: Vec<Record>,
    pub input_tokens: usize,
    pub output_tokens: usize,
    /// Wall-clock time of the model call and parsing.
    pub duration_ms: u64,
    pub error: Option<PageError>,
}

impl PageResult {
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

/// Aggregate numbers for a run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionStats {
    /// Pages attempted.
    pub total_pages: usize,
    /// Pages that produced a result without error (possibly zero records).
    pub processed_pages: usize,
    /// Pages whose result carries an error.
    pub failed_pages: usize,
    pub total_records: usize,
    pub total_input_tokens: u64,
    pub total_output_tokens: u64,
    pub total_duration_ms: u64,
}

impl ExtractionStats {
    /// Sum up per-page results.
    pub fn from_pages(pages: &[PageResult], total_duration_ms: u64) -> Self {
        Self {
            total_pages: pages.len(),
            processed_pages: pages.iter().filter(|p| p.is_ok()).count(),
            failed_pages: pages.iter().filter(|p| !p.is_ok()).count(),
            total_records: pages.iter().map(|p| p.records.len()).sum(),
            total_input_tokens: pages.iter().map(|p| p.input_tokens as u64).sum(),
            total_output_tokens: pages.iter().map(|p| p.output_tokens as u64).sum(),
            total_duration_ms,
        }
    }
}

/// Everything an eager extraction run produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionOutput {
    /// Per-page results in page order.
    pub pages: Vec<PageResult>,
    pub stats: ExtractionStats,
}

impl ExtractionOutput {
    /// All records, page order then within-page order.
    pub fn records(&self) -> impl Iterator<Item = &Record> {
        self.pages.iter().flat_map(|p| p.records.iter())
    }

    /// Consume the output, keeping only the records.
    pub fn into_records(self) -> Vec<Record> {
        self.pages.into_iter().flat_map(|p| p.records).collect()
    }

    /// Page failures, in page order.
    pub fn errors(&self) -> impl Iterator<Item = &PageError> {
        self.pages.iter().filter_map(|p| p.error.as_ref())
    }
}
