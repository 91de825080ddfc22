//! Eager (whole-range) extraction entry points.
//!
//! ## Why eager vs. streaming?
//!
//! This module waits for every page in the range and returns one
//! [`ExtractionOutput`]. Use [`crate::stream::extract_stream`] instead to
//! receive each page's records as soon as that page is done.
//!
//! ## Failure policy
//!
//! Pages are processed one at a time, in increasing order. A page whose model
//! call or response parsing fails contributes no records and the run goes on;
//! a page that cannot supply its image (no image, several images, unreadable
//! PDF) is fatal and aborts the run with `Err`.

use crate::config::{ExtractionConfig, PageRange, DEFAULT_MODEL};
use crate::error::CardsError;
use crate::output::{ExtractionOutput, ExtractionStats, PageResult};
use crate::pipeline::llm::{summarize_page, ProviderVisionModel, VisionModel};
use crate::pipeline::source::{PageImageSource, PdfImageSource};
use crate::prompts::EXTRACTION_PROMPT;
use edgequake_llm::{ImageData, LLMProvider, ProviderFactory};
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

/// Extract records from `range` of the PDF at `pdf_path`.
///
/// This is the primary entry point for the library.
///
/// # Returns
/// `Ok(ExtractionOutput)` even if some pages failed (check
/// `output.stats.failed_pages` / [`ExtractionOutput::errors`]).
///
/// # Errors
/// - file not found, PDF unreadable
/// - provider not configured
/// - a page out of range or not holding exactly one image
pub async fn extract(
    pdf_path: impl AsRef<Path>,
    range: PageRange,
    config: &ExtractionConfig,
) -> Result<ExtractionOutput, CardsError> {
    let source = PdfImageSource::open(pdf_path, config.password.as_deref()).await?;
    let model = resolve_model(config)?;
    extract_pages(&source, &model, range, config).await
}

/// Run the page loop over any image source and model.
pub async fn extract_pages(
    source: &dyn PageImageSource,
    model: &dyn VisionModel,
    range: PageRange,
    config: &ExtractionConfig,
) -> Result<ExtractionOutput, CardsError> {
    let total_start = Instant::now();
    check_range(source, range)?;
    info!("Extracting pages {}..={}", range.from(), range.to());

    if let Some(ref cb) = config.progress_callback {
        cb.on_extraction_start(range.len());
    }

    let mut pages = Vec::with_capacity(range.len());
    for page_num in range.pages() {
        pages.push(process_page(source, model, page_num, config).await?);
    }

    let stats = ExtractionStats::from_pages(&pages, total_start.elapsed().as_millis() as u64);
    info!(
        "Extraction complete: {} records from {}/{} pages, {}ms total",
        stats.total_records, stats.processed_pages, stats.total_pages, stats.total_duration_ms
    );

    if let Some(ref cb) = config.progress_callback {
        cb.on_extraction_complete(stats.total_pages, stats.total_records);
    }

    Ok(ExtractionOutput { pages, stats })
}

/// Extract records from standalone page images (e.g. scans saved as JPEG).
///
/// Each image counts as one page, numbered from 1 in the given order.
pub async fn extract_images(
    images: Vec<ImageData>,
    model: &dyn VisionModel,
    config: &ExtractionConfig,
) -> ExtractionOutput {
    let total_start = Instant::now();
    let prompt = extraction_prompt(config);

    let mut pages = Vec::with_capacity(images.len());
    for (idx, image) in images.into_iter().enumerate() {
        pages.push(summarize_page(model, idx + 1, image, prompt).await);
    }

    let stats = ExtractionStats::from_pages(&pages, total_start.elapsed().as_millis() as u64);
    ExtractionOutput { pages, stats }
}

/// One page: image, model call, parse, progress events.
pub(crate) async fn process_page(
    source: &dyn PageImageSource,
    model: &dyn VisionModel,
    page_num: usize,
    config: &ExtractionConfig,
) -> Result<PageResult, CardsError> {
    if let Some(ref cb) = config.progress_callback {
        cb.on_page_start(page_num);
    }

    info!("Extracting image from page {}.", page_num);
    let image = source.page_image(page_num).await?;
    let result = summarize_page(model, page_num, image, extraction_prompt(config)).await;

    if let Some(ref cb) = config.progress_callback {
        match &result.error {
            None => cb.on_page_complete(page_num, result.records.len()),
            Some(e) => cb.on_page_error(page_num, &e.to_string()),
        }
    }
    Ok(result)
}

/// Reject ranges reaching past the end of the source before any work starts.
pub(crate) fn check_range(source: &dyn PageImageSource, range: PageRange) -> Result<(), CardsError> {
    if range.to() > source.page_count() {
        return Err(CardsError::PageOutOfRange {
            page: range.to(),
            total: source.page_count(),
        });
    }
    Ok(())
}

pub(crate) fn extraction_prompt(config: &ExtractionConfig) -> &str {
    config.prompt.as_deref().unwrap_or(EXTRACTION_PROMPT)
}

/// Build the [`VisionModel`] for a config from its resolved provider.
pub fn resolve_model(config: &ExtractionConfig) -> Result<ProviderVisionModel, CardsError> {
    let provider = resolve_provider(config)?;
    Ok(ProviderVisionModel::new(
        provider,
        config.temperature,
        config.max_tokens,
    ))
}

/// Resolve the LLM provider, from most-specific to least-specific.
///
/// 1. **Pre-built provider** (`config.provider`) — used as-is.
/// 2. **Named provider** (`config.provider_name`) with `config.model` or
///    [`DEFAULT_MODEL`]; the factory reads the matching API key variable.
/// 3. **Environment pair** (`EDGEQUAKE_LLM_PROVIDER` + `EDGEQUAKE_MODEL`).
/// 4. **OpenAI** when `OPENAI_API_KEY` is set.
/// 5. **Full auto-detection** (`ProviderFactory::from_env`).
pub fn resolve_provider(config: &ExtractionConfig) -> Result<Arc<dyn LLMProvider>, CardsError> {
    if let Some(ref provider) = config.provider {
        return Ok(Arc::clone(provider));
    }

    if let Some(ref name) = config.provider_name {
        return create_vision_provider(name, config.model_or_default());
    }

    if let (Ok(prov), Ok(model)) = (
        std::env::var("EDGEQUAKE_LLM_PROVIDER"),
        std::env::var("EDGEQUAKE_MODEL"),
    ) {
        if !prov.is_empty() && !model.is_empty() {
            return create_vision_provider(&prov, &model);
        }
    }

    if let Ok(openai_key) = std::env::var("OPENAI_API_KEY") {
        if !openai_key.is_empty() {
            return create_vision_provider("openai", config.model_or_default());
        }
    }

    warn!(
        "No provider configured; auto-detecting (model default {})",
        DEFAULT_MODEL
    );
    let (llm_provider, _embedding) =
        ProviderFactory::from_env().map_err(|e| CardsError::ProviderNotConfigured {
            provider: "auto".to_string(),
            hint: format!(
                "No LLM provider could be auto-detected from environment.\n\
                Set OPENAI_API_KEY, ANTHROPIC_API_KEY, or pass --provider.\n\
                Error: {}",
                e
            ),
        })?;

    Ok(llm_provider)
}

fn create_vision_provider(
    provider_name: &str,
    model: &str,
) -> Result<Arc<dyn LLMProvider>, CardsError> {
    ProviderFactory::create_llm_provider(provider_name, model).map_err(|e| {
        CardsError::ProviderNotConfigured {
            provider: provider_name.to_string(),
            hint: format!("{e}"),
        }
    })
}
