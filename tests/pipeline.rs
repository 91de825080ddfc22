//! Integration tests for the extraction pipeline.
//!
//! Page images and model answers are scripted in memory, so these run without
//! pdfium or network access. Each scripted image carries its page number as
//! its payload; the scripted model answers by looking that payload up.

use async_trait::async_trait;
use edgequake_llm::ImageData;
use futures::StreamExt;
use invention_cards::{
    extract_pages, stream_pages, CardsError, ExtractionConfig, ExtractionProgressCallback,
    PageError, PageImageSource, PageRange, PdfImageSource, ResponseEnvelope, VisionModel,
};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

// ── Test helpers ─────────────────────────────────────────────────────────────

struct ScriptedPages {
    total: usize,
    /// Pages whose scan holds the given number of images instead of one.
    odd_pages: HashMap<usize, usize>,
}

impl ScriptedPages {
    fn new(total: usize) -> Self {
        Self {
            total,
            odd_pages: HashMap::new(),
        }
    }
}

#[async_trait]
impl PageImageSource for ScriptedPages {
    fn page_count(&self) -> usize {
        self.total
    }

    async fn page_image(&self, page_num: usize) -> Result<ImageData, CardsError> {
        if let Some(&found) = self.odd_pages.get(&page_num) {
            return Err(CardsError::SourceImage {
                page: page_num,
                found,
            });
        }
        Ok(ImageData::new(format!("page-{page_num}"), "image/png"))
    }
}

struct ScriptedModel {
    answers: HashMap<String, ResponseEnvelope>,
}

#[async_trait]
impl VisionModel for ScriptedModel {
    async fn complete(&self, _prompt: &str, images: Vec<ImageData>) -> ResponseEnvelope {
        images
            .first()
            .and_then(|img| self.answers.get(&img.data))
            .cloned()
            .unwrap_or_else(|| ResponseEnvelope::completion("[]"))
    }
}

fn entry(title: &str, year: &str) -> String {
    format!(
        r#"{{"title": "{title}", "year": "{year}", "description": "About {title}.",
            "summary": "A summary.", "inventor": "Someone", "location": "Somewhere",
            "field": "General", "related": ""}}"#
    )
}

fn fenced(entries: &[String]) -> ResponseEnvelope {
    ResponseEnvelope::completion(format!(
        "Here are the inventions:\n```json\n[{}]\n```",
        entries.join(",")
    ))
}

/// Pages 3–5: two entries each on 3 and 5, an error envelope on 4.
fn three_page_model() -> ScriptedModel {
    let mut answers = HashMap::new();
    answers.insert(
        "page-3".to_string(),
        fenced(&[entry("Compass", "1100"), entry("Gunpowder", "1044")]),
    );
    answers.insert(
        "page-4".to_string(),
        ResponseEnvelope::failure("rate limited"),
    );
    answers.insert(
        "page-5".to_string(),
        fenced(&[entry("Spectacles", "1286"), entry("Mechanical clock", "1300")]),
    );
    ScriptedModel { answers }
}

#[derive(Default)]
struct EventLog(Mutex<Vec<String>>);

impl ExtractionProgressCallback for EventLog {
    fn on_extraction_start(&self, total_pages: usize) {
        self.0.lock().unwrap().push(format!("start {total_pages}"));
    }
    fn on_page_complete(&self, page_num: usize, record_count: usize) {
        self.0
            .lock()
            .unwrap()
            .push(format!("page {page_num}: {record_count}"));
    }
    fn on_page_error(&self, page_num: usize, _error: &str) {
        self.0.lock().unwrap().push(format!("page {page_num}: error"));
    }
    fn on_extraction_complete(&self, total_pages: usize, record_count: usize) {
        self.0
            .lock()
            .unwrap()
            .push(format!("done {total_pages}/{record_count}"));
    }
}

// ── Eager extraction ─────────────────────────────────────────────────────────

#[tokio::test]
async fn records_follow_page_order_and_skip_failed_pages() {
    let config = ExtractionConfig::default();
    let output = extract_pages(
        &ScriptedPages::new(10),
        &three_page_model(),
        PageRange::new(3, 5).unwrap(),
        &config,
    )
    .await
    .unwrap();

    let ids: Vec<&str> = output.records().map(|r| r.identifier()).collect();
    assert_eq!(
        ids,
        vec!["compass", "gunpowder", "spectacles", "mechanical-clock"]
    );

    assert_eq!(output.stats.total_pages, 3);
    assert_eq!(output.stats.failed_pages, 1);
    let errors: Vec<&PageError> = output.errors().collect();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].page(), 4);
    assert!(errors[0].is_recoverable());
}

#[tokio::test]
async fn page_with_two_images_aborts_the_run() {
    let mut source = ScriptedPages::new(10);
    source.odd_pages.insert(4, 2);
    let config = ExtractionConfig::default();

    let err = extract_pages(
        &source,
        &three_page_model(),
        PageRange::new(3, 5).unwrap(),
        &config,
    )
    .await
    .unwrap_err();
    assert!(matches!(err, CardsError::SourceImage { page: 4, found: 2 }));
}

#[tokio::test]
async fn invalid_object_fails_only_its_page() {
    let mut answers = HashMap::new();
    answers.insert(
        "page-1".to_string(),
        ResponseEnvelope::completion(format!(
            "[{}, {{\"title\": \"Lever\", \"year\": \"250BCE\"}}]",
            entry("Pulley", "1500BCE")
        )),
    );
    answers.insert(
        "page-2".to_string(),
        fenced(&[entry("Water wheel", "200BCE")]),
    );
    let config = ExtractionConfig::default();

    let output = extract_pages(
        &ScriptedPages::new(2),
        &ScriptedModel { answers },
        PageRange::new(1, 2).unwrap(),
        &config,
    )
    .await
    .unwrap();

    assert!(output.pages[0].records.is_empty());
    assert!(matches!(
        output.pages[0].error,
        Some(PageError::InvalidRecord { page: 1, index: 1, .. })
    ));
    let ids: Vec<&str> = output.records().map(|r| r.identifier()).collect();
    assert_eq!(ids, vec!["water-wheel"]);
    assert_eq!(output.pages[1].records[0].year_as_number(), Ok(-200));
}

#[tokio::test]
async fn progress_events_arrive_in_page_order() {
    let log = Arc::new(EventLog::default());
    let config = ExtractionConfig::builder()
        .progress_callback(log.clone())
        .build()
        .unwrap();

    extract_pages(
        &ScriptedPages::new(10),
        &three_page_model(),
        PageRange::new(3, 5).unwrap(),
        &config,
    )
    .await
    .unwrap();

    assert_eq!(
        *log.0.lock().unwrap(),
        vec![
            "start 3",
            "page 3: 2",
            "page 4: error",
            "page 5: 2",
            "done 3/4",
        ]
    );
}

#[tokio::test]
async fn same_title_on_two_pages_is_kept_twice() {
    let mut answers = HashMap::new();
    answers.insert("page-1".to_string(), fenced(&[entry("Telescope", "1608")]));
    answers.insert("page-2".to_string(), fenced(&[entry("TELESCOPE", "1609")]));
    let config = ExtractionConfig::default();

    let output = extract_pages(
        &ScriptedPages::new(2),
        &ScriptedModel { answers },
        PageRange::new(1, 2).unwrap(),
        &config,
    )
    .await
    .unwrap();

    let ids: Vec<&str> = output.records().map(|r| r.identifier()).collect();
    assert_eq!(ids, vec!["telescope", "telescope"]);
    let unique: HashSet<&str> = ids.into_iter().collect();
    assert_eq!(unique.len(), 1);
}

#[tokio::test]
async fn unreadable_year_and_missing_closing_fence_keep_the_page() {
    let mut answers = HashMap::new();
    answers.insert(
        "page-1".to_string(),
        ResponseEnvelope::completion(format!(
            "Here:\n```json\n[{}, {}]\n",
            entry("Wheel", "3500BCE"),
            entry("Plow", "c. 3000BCE")
        )),
    );
    let config = ExtractionConfig::default();

    let output = extract_pages(
        &ScriptedPages::new(1),
        &ScriptedModel { answers },
        PageRange::single(1).unwrap(),
        &config,
    )
    .await
    .unwrap();

    assert!(output.pages[0].is_ok());
    let ids: Vec<&str> = output.records().map(|r| r.identifier()).collect();
    assert_eq!(ids, vec!["wheel", "plow"]);
}

// ── Streaming extraction ─────────────────────────────────────────────────────

#[tokio::test]
async fn stream_yields_pages_in_order() {
    let config = ExtractionConfig::default();
    let pages: Vec<_> = stream_pages(
        Arc::new(ScriptedPages::new(10)),
        Arc::new(three_page_model()),
        PageRange::new(3, 5).unwrap(),
        &config,
    )
    .unwrap()
    .collect()
    .await;

    let page_nums: Vec<usize> = pages
        .iter()
        .map(|p| p.as_ref().unwrap().page_num)
        .collect();
    assert_eq!(page_nums, vec![3, 4, 5]);

    let ids: Vec<String> = pages
        .into_iter()
        .flat_map(|p| p.unwrap().records)
        .map(|r| r.identifier().to_string())
        .collect();
    assert_eq!(
        ids,
        vec!["compass", "gunpowder", "spectacles", "mechanical-clock"]
    );
}

// ── PDF source ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn missing_pdf_is_file_not_found() {
    let err = PdfImageSource::open("/definitely/not/here/volume1.pdf", None)
        .await
        .unwrap_err();
    assert!(matches!(err, CardsError::FileNotFound { .. }));
}
