//! Configuration for extraction runs and card-art generation.
//!
//! Every knob lives in an explicit struct built once by the caller (the CLI,
//! a test, a host application) and passed by reference into the pipeline.
//! Library code never reads API keys from the environment on its own; the
//! only environment lookups are in provider auto-detection, which runs when
//! the caller has not supplied a provider.
//!
//! # Design choice: builder over constructor
//! The builder lets callers set only what they care about and rely on
//! documented defaults for the rest, and gives one place to validate.

use crate::error::CardsError;
use crate::progress::ProgressCallback;
use edgequake_llm::LLMProvider;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

/// Model used when neither the caller nor the environment names one.
pub const DEFAULT_MODEL: &str = "gpt-4o";

/// Configuration for page extraction.
///
/// Built via [`ExtractionConfig::builder()`] or using
/// [`ExtractionConfig::default()`].
///
/// # Example
/// ```rust
/// use invention_cards::ExtractionConfig;
///
/// let config = ExtractionConfig::builder()
///     .model("gpt-4o")
///     .max_tokens(4000)
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct ExtractionConfig {
    /// LLM model identifier, e.g. "gpt-4o". If None, uses [`DEFAULT_MODEL`].
    pub model: Option<String>,

    /// LLM provider name (e.g. "openai", "anthropic", "ollama").
    /// If None along with `provider`, the provider is auto-detected.
    pub provider_name: Option<String>,

    /// Pre-constructed LLM provider. Takes precedence over `provider_name`.
    pub provider: Option<Arc<dyn LLMProvider>>,

    /// Sampling temperature. Default: 0.1.
    ///
    /// Extraction is transcription plus light summarising; a low temperature
    /// keeps titles and years faithful to the page.
    pub temperature: f32,

    /// Maximum tokens the model may generate per page. Default: 4000.
    ///
    /// A dense encyclopedia page holds six to ten entries, each with its full
    /// description echoed back. Too low a cap truncates the JSON array
    /// mid-object and the whole page is lost.
    pub max_tokens: usize,

    /// Replacement for [`crate::prompts::EXTRACTION_PROMPT`].
    pub prompt: Option<String>,

    /// PDF user password for encrypted documents.
    pub password: Option<String>,

    /// Receives page start/complete/error events.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            model: None,
            provider_name: None,
            provider: None,
            temperature: 0.1,
            max_tokens: 4000,
            prompt: None,
            password: None,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for ExtractionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExtractionConfig")
            .field("model", &self.model)
            .field("provider_name", &self.provider_name)
            .field("provider", &self.provider.as_ref().map(|_| "<dyn LLMProvider>"))
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("prompt", &self.prompt.as_ref().map(|p| p.len()))
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<callback>"),
            )
            .finish()
    }
}

impl ExtractionConfig {
    /// Create a new builder for `ExtractionConfig`.
    pub fn builder() -> ExtractionConfigBuilder {
        ExtractionConfigBuilder {
            config: Self::default(),
        }
    }

    /// The model to request, falling back to [`DEFAULT_MODEL`].
    pub fn model_or_default(&self) -> &str {
        self.model.as_deref().unwrap_or(DEFAULT_MODEL)
    }
}

/// Builder for [`ExtractionConfig`].
#[derive(Debug)]
pub struct ExtractionConfigBuilder {
    config: ExtractionConfig,
}

impl ExtractionConfigBuilder {
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = Some(model.into());
        self
    }

    pub fn provider_name(mut self, name: impl Into<String>) -> Self {
        self.config.provider_name = Some(name.into());
        self
    }

    pub fn provider(mut self, provider: Arc<dyn LLMProvider>) -> Self {
        self.config.provider = Some(provider);
        self
    }

    pub fn temperature(mut self, t: f32) -> Self {
        self.config.temperature = t.clamp(0.0, 2.0);
        self
    }

    pub fn max_tokens(mut self, n: usize) -> Self {
        self.config.max_tokens = n;
        self
    }

    pub fn prompt(mut self, prompt: impl Into<String>) -> Self {
        self.config.prompt = Some(prompt.into());
        self
    }

    pub fn password(mut self, pwd: impl Into<String>) -> Self {
        self.config.password = Some(pwd.into());
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ExtractionConfig, CardsError> {
        let c = &self.config;
        if c.max_tokens == 0 {
            return Err(CardsError::InvalidConfig(
                "max_tokens must be ≥ 1".into(),
            ));
        }
        if c.prompt.as_deref().is_some_and(|p| p.trim().is_empty()) {
            return Err(CardsError::InvalidConfig(
                "custom extraction prompt is empty".into(),
            ));
        }
        Ok(self.config)
    }
}

// ── Page range ───────────────────────────────────────────────────────────

/// An inclusive, 1-indexed range of PDF pages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRange {
    from: usize,
    to: usize,
}

impl PageRange {
    /// Validate `from..=to`: both 1-indexed, `from <= to`.
    pub fn new(from: usize, to: usize) -> Result<Self, CardsError> {
        if from == 0 || from > to {
            return Err(CardsError::InvalidPageRange { from, to });
        }
        Ok(Self { from, to })
    }

    /// A single page.
    pub fn single(page: usize) -> Result<Self, CardsError> {
        Self::new(page, page)
    }

    pub fn from(&self) -> usize {
        self.from
    }

    pub fn to(&self) -> usize {
        self.to
    }

    /// Number of pages in the range.
    pub fn len(&self) -> usize {
        self.to - self.from + 1
    }

    /// Always false; a valid range holds at least one page.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Page numbers in increasing order.
    pub fn pages(&self) -> std::ops::RangeInclusive<usize> {
        self.from..=self.to
    }
}

// ── Card art ─────────────────────────────────────────────────────────────

/// Default endpoint for image generation.
pub const DEFAULT_IMAGE_ENDPOINT: &str = "https://api.openai.com/v1/images/generations";

/// Configuration for card-art generation.
///
/// The API key is a plain field: whoever builds the config decides where it
/// comes from.
#[derive(Clone)]
pub struct ArtConfig {
    /// Bearer token for the image endpoint.
    pub api_key: String,
    /// Image-generation endpoint. Default: [`DEFAULT_IMAGE_ENDPOINT`].
    pub endpoint: String,
    /// Image model. Default: "dall-e-3".
    pub model: String,
    /// Requested size. Default: "1024x1024".
    pub size: String,
    /// Requested quality. Default: "standard".
    pub quality: String,
    /// Directory receiving `<id>.jpg`, `<id>-1.jpg`, …. Default: "images".
    pub images_dir: PathBuf,
    /// Regenerate even when `<id>.jpg` already exists. Default: false.
    pub force: bool,
    /// HTTP timeout for both the generation call and the download, in seconds.
    /// Default: 120.
    pub http_timeout_secs: u64,
}

impl Default for ArtConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            endpoint: DEFAULT_IMAGE_ENDPOINT.to_string(),
            model: "dall-e-3".to_string(),
            size: "1024x1024".to_string(),
            quality: "standard".to_string(),
            images_dir: PathBuf::from("images"),
            force: false,
            http_timeout_secs: 120,
        }
    }
}

impl fmt::Debug for ArtConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ArtConfig")
            .field("api_key", &"<redacted>")
            .field("endpoint", &self.endpoint)
            .field("model", &self.model)
            .field("size", &self.size)
            .field("quality", &self.quality)
            .field("images_dir", &self.images_dir)
            .field("force", &self.force)
            .field("http_timeout_secs", &self.http_timeout_secs)
            .finish()
    }
}

impl ArtConfig {
    /// Create a new builder for `ArtConfig`.
    pub fn builder() -> ArtConfigBuilder {
        ArtConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`ArtConfig`].
#[derive(Debug)]
pub struct ArtConfigBuilder {
    config: ArtConfig,
}

impl ArtConfigBuilder {
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.config.api_key = key.into();
        self
    }

    pub fn endpoint(mut self, url: impl Into<String>) -> Self {
        self.config.endpoint = url.into();
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = model.into();
        self
    }

    pub fn size(mut self, size: impl Into<String>) -> Self {
        self.config.size = size.into();
        self
    }

    pub fn quality(mut self, quality: impl Into<String>) -> Self {
        self.config.quality = quality.into();
        self
    }

    pub fn images_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.images_dir = dir.into();
        self
    }

    pub fn force(mut self, v: bool) -> Self {
        self.config.force = v;
        self
    }

    pub fn http_timeout_secs(mut self, secs: u64) -> Self {
        self.config.http_timeout_secs = secs.max(1);
        self
    }

    /// Build the configuration, validating constraints.
    ///
    /// An empty API key is accepted here; the OpenAI generator rejects it when
    /// constructed, so offline batches (tests, custom artists) can skip it.
    pub fn build(self) -> Result<ArtConfig, CardsError> {
        let c = &self.config;
        if !(c.endpoint.starts_with("http://") || c.endpoint.starts_with("https://")) {
            return Err(CardsError::InvalidConfig(format!(
                "image endpoint must be an HTTP/HTTPS URL, got '{}'",
                c.endpoint
            )));
        }
        if c.model.trim().is_empty() {
            return Err(CardsError::InvalidConfig("image model is empty".into()));
        }
        Ok(self.config)
    }
}
