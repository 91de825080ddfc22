//! # invention-cards
//!
//! Turn scanned pages of a chronological encyclopedia of science and
//! technology into a catalog of invention cards, then illustrate and announce
//! them.
//!
//! ## Why this crate?
//!
//! The source volumes are scans: one image per page, no text layer. Each
//! page holds several short entries (an invention or discovery, its year,
//! the people and place behind it). This crate hands the page image to a
//! Vision Language Model, asks for the entries as a JSON array, validates each
//! one into a [`Record`], and stores the records as rows of a tab-separated
//! catalog that the downstream tools (card art, social posts) read back.
//!
//! ## Pipeline Overview
//!
//! ```text
//! PDF page
//!  │
//!  ├─ 1. Source  the page's single embedded image (pdfium, spawn_blocking)
//!  ├─ 2. Encode  PNG → base64 ImageData
//!  ├─ 3. VLM     image + extraction prompt → response envelope
//!  ├─ 4. Parse   isolate JSON, validate objects → Vec<Record>
//!  └─ 5. Codec   Record → 9-column TSV row
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use invention_cards::{codec, extract, ExtractionConfig, PageRange};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Provider auto-detected from OPENAI_API_KEY / ANTHROPIC_API_KEY / …
//!     let config = ExtractionConfig::default();
//!     let output = extract("volume1.pdf", PageRange::new(12, 14)?, &config).await?;
//!     for record in output.records() {
//!         println!("{}", codec::encode_row(record));
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `cards` binary (clap + anyhow + tracing-subscriber + indicatif) |

// ── Modules ──────────────────────────────────────────────────────────────

pub mod art;
pub mod blurb;
pub mod catalog;
pub mod codec;
pub mod config;
pub mod error;
pub mod extract;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod prompts;
pub mod record;
pub mod stream;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use art::{generate_card_images, BatchReport, CardArtist, OpenAiArtist};
pub use blurb::{compose_blurb, Blurb};
pub use catalog::{Catalog, CatalogQuery};
pub use config::{
    ArtConfig, ArtConfigBuilder, ExtractionConfig, ExtractionConfigBuilder, PageRange,
};
pub use error::{CardsError, PageError, RecordError};
pub use extract::{extract, extract_images, extract_pages, resolve_model, resolve_provider};
pub use output::{ExtractionOutput, ExtractionStats, PageResult};
pub use pipeline::llm::{ProviderVisionModel, ResponseEnvelope, VisionModel};
pub use pipeline::source::{PageImageSource, PdfImageSource};
pub use progress::{ExtractionProgressCallback, NoopProgressCallback, ProgressCallback};
pub use record::{Record, RecordDraft};
pub use stream::{extract_stream, stream_pages, PageStream};
