//! Error types for the invention-cards library.
//!
//! Three error types reflect three distinct failure scopes:
//!
//! * [`CardsError`] — **Fatal**: the current invocation cannot proceed (the
//!   PDF cannot be opened, a page does not hold exactly one image, the
//!   requested identifier is not in the catalog). Returned as
//!   `Err(CardsError)` from the top-level functions.
//!
//! * [`PageError`] — **Per page**: one page produced no records (the model
//!   answered with an error envelope, the response held no parsable JSON, or
//!   one of the objects failed validation). Stored inside
//!   [`crate::output::PageResult`] so a multi-page run keeps going.
//!
//! * [`RecordError`] — a single record or catalog row is invalid. It surfaces
//!   wrapped in one of the two types above depending on where it was found.

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the invention-cards library.
///
/// Page-level failures use [`PageError`] and are stored in
/// [`crate::output::PageResult`] rather than propagated here.
#[derive(Debug, Error)]
pub enum CardsError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("File not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    // ── PDF errors ────────────────────────────────────────────────────────
    /// pdfium could not open the document.
    #[error("PDF '{path}' could not be opened: {detail}")]
    CorruptPdf { path: PathBuf, detail: String },

    /// A requested page number exceeds the document's page count.
    #[error("Page {page} is out of range (document has {total} pages)")]
    PageOutOfRange { page: usize, total: usize },

    /// The page does not carry exactly one embedded image.
    #[error("Page {page}: expected exactly one embedded image, found {found}")]
    SourceImage { page: usize, found: usize },

    /// pdfium failed while reading an embedded image.
    #[error("Page {page}: could not read embedded image: {detail}")]
    ImageReadFailed { page: usize, detail: String },

    /// `--from`/`--to` do not describe a valid 1-based inclusive range.
    #[error("Invalid page range {from}..={to}: pages are 1-indexed and from must be <= to")]
    InvalidPageRange { from: usize, to: usize },

    // ── Catalog errors ────────────────────────────────────────────────────
    /// The catalog file could not be read or tokenised.
    #[error("Failed to read catalog '{path}': {detail}")]
    CatalogRead { path: PathBuf, detail: String },

    /// A catalog row could not be decoded into a record.
    #[error("Catalog line {line}: {source}")]
    InvalidRow {
        line: u64,
        #[source]
        source: RecordError,
    },

    /// A requested identifier matched nothing in the catalog.
    #[error("Invention with id '{id}' not found.")]
    IdentifierNotFound { id: String },

    // ── Generation errors ─────────────────────────────────────────────────
    /// The configured provider is not initialised (missing API key etc.).
    #[error("LLM provider '{provider}' is not configured.\n{hint}")]
    ProviderNotConfigured { provider: String, hint: String },

    /// A text or image generation call answered with an error.
    #[error("Generation failed: {message}")]
    Generation { message: String },

    /// Generated art could not be fetched.
    #[error("Failed to download '{url}': {reason}")]
    DownloadFailed { url: String, reason: String },

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not create or write an output file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// A failure confined to a single page.
///
/// Stored alongside [`crate::output::PageResult`] when a page yields no
/// records. The extraction run continues with the next page either way.
#[derive(Debug, Clone, PartialEq, Eq, Error, serde::Serialize, serde::Deserialize)]
pub enum PageError {
    /// The model answered with an error envelope.
    #[error("Page {page}: generation failed: {message}")]
    Generation { page: usize, message: String },

    /// No JSON segment could be isolated from the response body.
    #[error("Page {page}: could not isolate JSON from response: {detail}")]
    Extraction { page: usize, detail: String },

    /// The isolated segment is not a JSON array of objects.
    #[error("Page {page}: malformed JSON: {detail}")]
    MalformedJson {
        page: usize,
        detail: String,
        raw: String,
    },

    /// One of the parsed objects failed record validation.
    #[error("Page {page}: record {index} is invalid: {detail}")]
    InvalidRecord {
        page: usize,
        index: usize,
        detail: String,
    },
}

impl PageError {
    /// 1-indexed page the error belongs to.
    pub fn page(&self) -> usize {
        match self {
            PageError::Generation { page, .. }
            | PageError::Extraction { page, .. }
            | PageError::MalformedJson { page, .. }
            | PageError::InvalidRecord { page, .. } => *page,
        }
    }

    /// Whether the failure degrades silently to "zero records".
    ///
    /// Generation and extraction failures are expected from a general-purpose
    /// model and are recoverable. A record that fails validation aborts the
    /// whole page instead of dropping just that object.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, PageError::InvalidRecord { .. })
    }
}

/// Validation and row-parse failures for a single record.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecordError {
    /// A required field is absent (or `null`).
    #[error("missing required field '{field}'")]
    MissingField { field: &'static str },

    /// A field is present but not of the expected primitive type.
    #[error("field '{field}' must be a {expected}")]
    WrongType {
        field: &'static str,
        expected: &'static str,
    },

    /// The value handed to the constructor is not a JSON object.
    #[error("expected a JSON object, got {found}")]
    NotAnObject { found: String },

    /// The year has a non-numeric residual after removing the era suffix.
    #[error("year '{year}' is not a number or a number followed by BCE")]
    InvalidYear { year: String },

    /// A delimited row has a column count outside {7, 8, 9}.
    #[error("expected 7, 8 or 9 tab-separated cells, found {found}")]
    RowWidth { found: usize },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn source_image_display() {
        let e = CardsError::SourceImage { page: 12, found: 3 };
        let msg = e.to_string();
        assert!(msg.contains("Page 12"), "got: {msg}");
        assert!(msg.contains("found 3"), "got: {msg}");
    }

    #[test]
    fn identifier_not_found_display() {
        let e = CardsError::IdentifierNotFound {
            id: "steam-engine".into(),
        };
        assert!(e.to_string().contains("steam-engine"));
    }

    #[test]
    fn invalid_row_carries_line_and_cause() {
        let e = CardsError::InvalidRow {
            line: 4,
            source: RecordError::RowWidth { found: 6 },
        };
        let msg = e.to_string();
        assert!(msg.contains("line 4"), "got: {msg}");
        assert!(msg.contains("found 6"), "got: {msg}");
    }

    #[test]
    fn page_error_recoverability() {
        let gen = PageError::Generation {
            page: 2,
            message: "rate limited".into(),
        };
        let bad = PageError::InvalidRecord {
            page: 2,
            index: 0,
            detail: "missing required field 'title'".into(),
        };
        assert!(gen.is_recoverable());
        assert!(!bad.is_recoverable());
        assert_eq!(gen.page(), 2);
        assert_eq!(bad.page(), 2);
    }
}
