//! Card art: generate one illustration per record and save it under
//! `<images_dir>/<id>.jpg`.
//!
//! ## Naming
//!
//! The first image for a record is `<id>.jpg`. Regenerating (with `force`)
//! never overwrites: the new image lands on the first free `<id>-N.jpg`, so
//! earlier candidates stay around to choose from.
//!
//! ## Failure policy
//!
//! Each record is independent. A failed generation or download is logged,
//! counted in the [`BatchReport`], and the batch moves on.

use crate::config::ArtConfig;
use crate::error::CardsError;
use crate::prompts::card_art_prompt;
use crate::record::Record;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{error, info};

/// Something that turns a prompt into image bytes.
#[async_trait]
pub trait CardArtist: Send + Sync {
    async fn render(&self, prompt: &str) -> Result<Vec<u8>, CardsError>;
}

// ── OpenAI-compatible image endpoint ─────────────────────────────────────

#[derive(Debug, Serialize)]
struct GenerationRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    size: &'a str,
    quality: &'a str,
    n: u32,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum GenerationResponse {
    Failure { error: GenerationError },
    Images { data: Vec<GeneratedImage> },
}

#[derive(Debug, Deserialize)]
struct GenerationError {
    message: String,
}

#[derive(Debug, Deserialize)]
struct GeneratedImage {
    url: String,
}

/// [`CardArtist`] calling an OpenAI-style `images/generations` endpoint and
/// downloading the returned URL.
pub struct OpenAiArtist {
    client: reqwest::Client,
    config: ArtConfig,
}

impl OpenAiArtist {
    pub fn new(config: &ArtConfig) -> Result<Self, CardsError> {
        if config.api_key.trim().is_empty() {
            return Err(CardsError::ProviderNotConfigured {
                provider: "openai-images".to_string(),
                hint: "Set OPENAI_API_KEY or pass --api-key.".to_string(),
            });
        }

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.http_timeout_secs))
            .build()
            .map_err(|e| CardsError::Internal(format!("HTTP client: {}", e)))?;

        Ok(Self {
            client,
            config: config.clone(),
        })
    }

    async fn request_url(&self, prompt: &str) -> Result<String, CardsError> {
        let body = GenerationRequest {
            model: &self.config.model,
            prompt,
            size: &self.config.size,
            quality: &self.config.quality,
            n: 1,
        };

        let response = self
            .client
            .post(&self.config.endpoint)
            .bearer_auth(&self.config.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| CardsError::Generation {
                message: e.to_string(),
            })?;

        let status = response.status();
        let parsed: GenerationResponse =
            response.json().await.map_err(|e| CardsError::Generation {
                message: format!("HTTP {}: {}", status, e),
            })?;

        match parsed {
            GenerationResponse::Failure { error } => Err(CardsError::Generation {
                message: error.message,
            }),
            GenerationResponse::Images { data } => data
                .into_iter()
                .next()
                .map(|img| img.url)
                .ok_or_else(|| CardsError::Generation {
                    message: "response contained no images".to_string(),
                }),
        }
    }

    async fn download(&self, url: &str) -> Result<Vec<u8>, CardsError> {
        let failed = |reason: String| CardsError::DownloadFailed {
            url: url.to_string(),
            reason,
        };

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| failed(e.to_string()))?;
        if !response.status().is_success() {
            return Err(failed(format!("HTTP {}", response.status())));
        }

        let bytes = response.bytes().await.map_err(|e| failed(e.to_string()))?;
        Ok(bytes.to_vec())
    }
}

#[async_trait]
impl CardArtist for OpenAiArtist {
    async fn render(&self, prompt: &str) -> Result<Vec<u8>, CardsError> {
        let url = self.request_url(prompt).await?;
        self.download(&url).await
    }
}

// ── Paths ─────────────────────────────────────────────────────────────────

/// `<dir>/<id>.jpg`, whether or not it exists.
pub fn default_image_path(dir: &Path, identifier: &str) -> PathBuf {
    dir.join(format!("{}.jpg", identifier))
}

/// The first of `<id>.jpg`, `<id>-1.jpg`, `<id>-2.jpg`, … not yet on disk.
pub fn unique_image_path(dir: &Path, identifier: &str) -> PathBuf {
    let mut candidate = default_image_path(dir, identifier);
    let mut index = 0;
    while candidate.exists() {
        index += 1;
        candidate = dir.join(format!("{}-{}.jpg", identifier, index));
    }
    candidate
}

/// Write `bytes` to the first free image path for `identifier`.
///
/// The bytes go to a temporary file in the same directory first, so a crash
/// never leaves a truncated `<id>.jpg` behind to be mistaken for a finished
/// image on the next run.
pub fn save_image(dir: &Path, identifier: &str, bytes: &[u8]) -> Result<PathBuf, CardsError> {
    let write_err = |path: &Path, source: std::io::Error| CardsError::OutputWriteFailed {
        path: path.to_path_buf(),
        source,
    };

    std::fs::create_dir_all(dir).map_err(|e| write_err(dir, e))?;
    let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(|e| write_err(dir, e))?;
    tmp.write_all(bytes).map_err(|e| write_err(tmp.path(), e))?;

    let target = unique_image_path(dir, identifier);
    tmp.persist_noclobber(&target)
        .map_err(|e| write_err(&target, e.error))?;
    Ok(target)
}

// ── Batch ─────────────────────────────────────────────────────────────────

/// What happened to each record of a batch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BatchReport {
    /// Saved image paths.
    pub generated: Vec<PathBuf>,
    /// Records skipped because `<id>.jpg` already exists.
    pub skipped: Vec<String>,
    /// Records whose generation or save failed, with the reason.
    pub failed: Vec<(String, String)>,
}

/// Generate and save art for every record in order.
pub async fn generate_card_images<'a, I>(
    records: I,
    artist: &dyn CardArtist,
    config: &ArtConfig,
) -> BatchReport
where
    I: IntoIterator<Item = &'a Record>,
{
    let mut report = BatchReport::default();

    for record in records {
        let id = record.identifier();
        if !config.force && default_image_path(&config.images_dir, id).exists() {
            info!("Image already exists for {}. Skipping.", id);
            report.skipped.push(id.to_string());
            continue;
        }

        info!("Generating image for {} ({}).", id, record.year());
        let outcome = match artist.render(&card_art_prompt(record)).await {
            Ok(bytes) => save_image(&config.images_dir, id, &bytes),
            Err(e) => Err(e),
        };

        match outcome {
            Ok(path) => {
                info!("Saved image at {}.", path.display());
                report.generated.push(path);
            }
            Err(e) => {
                error!("Failed to generate image for {}: {}", id, e);
                report.failed.push((id.to_string(), e.to_string()));
            }
        }
    }

    report
}
