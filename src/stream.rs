//! Streaming extraction API: emit each page's records as soon as it is done.
//!
//! ## Why stream?
//!
//! A volume of the encyclopedia runs to hundreds of pages, each costing a
//! model round-trip of several seconds. A stream lets the caller print or
//! append TSV rows page by page, so an interrupted run keeps what it already
//! extracted.
//!
//! Unlike the eager [`crate::extract::extract`], [`extract_stream`] yields a
//! `PageResult` per page. Pages are processed one at a time, so items always
//! arrive in page order. A fatal error (a page that cannot supply its image)
//! is yielded as the final `Err` item; nothing follows it.

use crate::config::{ExtractionConfig, PageRange};
use crate::error::CardsError;
use crate::extract::{check_range, process_page, resolve_model};
use crate::output::PageResult;
use crate::pipeline::llm::VisionModel;
use crate::pipeline::source::{PageImageSource, PdfImageSource};
use futures::future;
use futures::stream::{self, StreamExt};
use std::path::Path;
use std::pin::Pin;
use std::sync::Arc;
use tokio_stream::Stream;
use tracing::info;

/// A boxed stream of page results.
pub type PageStream = Pin<Box<dyn Stream<Item = Result<PageResult, CardsError>> + Send>>;

/// Extract records from `range` of a PDF, streaming pages as they complete.
///
/// # Returns
/// - `Ok(PageStream)` — page results in page order
/// - `Err(CardsError)` — the PDF could not be opened, the range does not fit
///   it, or no provider is configured
///
/// # Example
/// ```rust,no_run
/// use invention_cards::{codec, extract_stream, ExtractionConfig, PageRange};
/// use futures::StreamExt;
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let config = ExtractionConfig::default();
/// let mut pages = extract_stream("volume1.pdf", PageRange::new(12, 14)?, &config).await?;
/// while let Some(page) = pages.next().await {
///     for record in page?.records {
///         println!("{}", codec::encode_row(&record));
///     }
/// }
/// # Ok(())
/// # }
/// ```
pub async fn extract_stream(
    pdf_path: impl AsRef<Path>,
    range: PageRange,
    config: &ExtractionConfig,
) -> Result<PageStream, CardsError> {
    info!("Starting streaming extraction: {}", pdf_path.as_ref().display());
    let source = PdfImageSource::open(pdf_path, config.password.as_deref()).await?;
    let model = resolve_model(config)?;
    stream_pages(Arc::new(source), Arc::new(model), range, config)
}

/// Stream the page loop over any image source and model.
pub fn stream_pages(
    source: Arc<dyn PageImageSource>,
    model: Arc<dyn VisionModel>,
    range: PageRange,
    config: &ExtractionConfig,
) -> Result<PageStream, CardsError> {
    check_range(source.as_ref(), range)?;

    if let Some(ref cb) = config.progress_callback {
        cb.on_extraction_start(range.len());
    }

    let cfg = config.clone();
    let pages = stream::iter(range.pages())
        .then(move |page_num| {
            let source = Arc::clone(&source);
            let model = Arc::clone(&model);
            let cfg = cfg.clone();
            async move { process_page(source.as_ref(), model.as_ref(), page_num, &cfg).await }
        })
        // Stop right after the first fatal error.
        .scan(false, |failed, item| {
            if *failed {
                return future::ready(None);
            }
            *failed = item.is_err();
            future::ready(Some(item))
        });

    Ok(Box::pin(pages))
}
