//! Progress-callback trait for per-page extraction events.
//!
//! Inject an [`Arc<dyn ExtractionProgressCallback>`] via
//! [`crate::config::ExtractionConfigBuilder::progress_callback`] to receive
//! events as the pipeline works through the page range.
//!
//! # Example
//!
//! ```rust
//! use invention_cards::{ExtractionConfig, ExtractionProgressCallback};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct RecordCounter {
//!     records: AtomicUsize,
//! }
//!
//! impl ExtractionProgressCallback for RecordCounter {
//!     fn on_page_complete(&self, page_num: usize, record_count: usize) {
//!         self.records.fetch_add(record_count, Ordering::SeqCst);
//!         eprintln!("page {page_num}: {record_count} inventions");
//!     }
//! }
//!
//! let counter = Arc::new(RecordCounter { records: AtomicUsize::new(0) });
//! let config = ExtractionConfig::builder()
//!     .progress_callback(counter as Arc<dyn ExtractionProgressCallback>)
//!     .build()
//!     .unwrap();
//! ```

use std::sync::Arc;

/// Called by the extraction pipeline as it processes each page.
///
/// Pages are processed one at a time, so events arrive in page order. All
/// methods have default no-op implementations.
pub trait ExtractionProgressCallback: Send + Sync {
    /// Called once before the first page.
    ///
    /// # Arguments
    /// * `total_pages` — number of pages in the requested range
    fn on_extraction_start(&self, total_pages: usize) {
        let _ = total_pages;
    }

    /// Called just before the page image is read.
    fn on_page_start(&self, page_num: usize) {
        let _ = page_num;
    }

    /// Called when a page produced its records (possibly none).
    fn on_page_complete(&self, page_num: usize, record_count: usize) {
        let _ = (page_num, record_count);
    }

    /// Called when a page failed and contributes no records.
    fn on_page_error(&self, page_num: usize, error: &str) {
        let _ = (page_num, error);
    }

    /// Called once after the last page.
    ///
    /// # Arguments
    /// * `total_pages`  — pages attempted
    /// * `record_count` — records extracted across all pages
    fn on_extraction_complete(&self, total_pages: usize, record_count: usize) {
        let _ = (total_pages, record_count);
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl ExtractionProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::ExtractionConfig`].
pub type ProgressCallback = Arc<dyn ExtractionProgressCallback>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct EventLog {
        events: Mutex<Vec<String>>,
    }

    impl ExtractionProgressCallback for EventLog {
        fn on_extraction_start(&self, total_pages: usize) {
            self.events.lock().unwrap().push(format!("start {total_pages}"));
        }

        fn on_page_complete(&self, page_num: usize, record_count: usize) {
            self.events
                .lock()
                .unwrap()
                .push(format!("page {page_num}: {record_count}"));
        }

        fn on_page_error(&self, page_num: usize, _error: &str) {
            self.events.lock().unwrap().push(format!("page {page_num}: error"));
        }
    }

    #[test]
    fn noop_callback_does_not_panic() {
        let cb = NoopProgressCallback;
        cb.on_extraction_start(3);
        cb.on_page_start(1);
        cb.on_page_complete(1, 4);
        cb.on_page_error(2, "rate limited");
        cb.on_extraction_complete(3, 4);
    }

    #[test]
    fn overridden_methods_receive_events() {
        let log = Arc::new(EventLog::default());
        let cb: ProgressCallback = log.clone();
        cb.on_extraction_start(2);
        cb.on_page_start(3);
        cb.on_page_complete(3, 2);
        cb.on_page_error(4, "no JSON");
        cb.on_extraction_complete(2, 2);

        let events = log.events.lock().unwrap();
        assert_eq!(*events, vec!["start 2", "page 3: 2", "page 4: error"]);
    }
}
