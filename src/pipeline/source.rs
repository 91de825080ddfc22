//! Page images: pull the single scanned image embedded in a PDF page.
//!
//! The encyclopedia PDFs are scans, one image per page. Rather than
//! rasterising the page (which would re-sample the scan), the embedded image
//! object is read back as-is. A page carrying zero or several images does not
//! fit that model and is a fatal [`CardsError::SourceImage`].
//!
//! ## Why spawn_blocking?
//!
//! `pdfium-render` wraps the pdfium C++ library, which is not async-safe.
//! Every document access runs on tokio's blocking pool, opening the document
//! fresh each time: pdfium documents borrow their `Pdfium` binding and cannot
//! be kept across await points.

use crate::error::CardsError;
use crate::pipeline::encode::encode_page_image;
use async_trait::async_trait;
use edgequake_llm::ImageData;
use image::DynamicImage;
use pdfium_render::prelude::*;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Where page images come from.
///
/// Implemented by [`PdfImageSource`] for real documents; tests provide
/// in-memory sources.
#[async_trait]
pub trait PageImageSource: Send + Sync {
    /// Total number of pages available.
    fn page_count(&self) -> usize;

    /// The page's single embedded image, base64-encoded.
    ///
    /// `page_num` is 1-indexed. Fails with [`CardsError::SourceImage`] when
    /// the page does not hold exactly one image.
    async fn page_image(&self, page_num: usize) -> Result<ImageData, CardsError>;
}

/// A PDF on disk, read through pdfium.
#[derive(Debug, Clone)]
pub struct PdfImageSource {
    path: PathBuf,
    password: Option<String>,
    page_count: usize,
}

impl PdfImageSource {
    /// Open the document once to validate it and count its pages.
    pub async fn open(
        path: impl AsRef<Path>,
        password: Option<&str>,
    ) -> Result<Self, CardsError> {
        let path = path.as_ref().to_path_buf();
        if !path.exists() {
            return Err(CardsError::FileNotFound { path });
        }
        let password = password.map(str::to_string);

        let (p, pwd) = (path.clone(), password.clone());
        let page_count = tokio::task::spawn_blocking(move || count_pages_blocking(&p, pwd.as_deref()))
            .await
            .map_err(|e| CardsError::Internal(format!("Page count task panicked: {}", e)))??;

        info!("Loaded PDF with {} pages: {}", page_count, path.display());
        Ok(Self {
            path,
            password,
            page_count,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl PageImageSource for PdfImageSource {
    fn page_count(&self) -> usize {
        self.page_count
    }

    async fn page_image(&self, page_num: usize) -> Result<ImageData, CardsError> {
        if page_num == 0 || page_num > self.page_count {
            return Err(CardsError::PageOutOfRange {
                page: page_num,
                total: self.page_count,
            });
        }

        let path = self.path.clone();
        let password = self.password.clone();
        let image = tokio::task::spawn_blocking(move || {
            extract_image_blocking(&path, password.as_deref(), page_num)
        })
        .await
        .map_err(|e| CardsError::Internal(format!("Image task panicked: {}", e)))??;

        encode_page_image(&image).map_err(|e| CardsError::ImageReadFailed {
            page: page_num,
            detail: format!("Image encoding failed: {}", e),
        })
    }
}

fn load_document<'a>(
    pdfium: &'a Pdfium,
    pdf_path: &Path,
    password: Option<&'a str>,
) -> Result<PdfDocument<'a>, CardsError> {
    pdfium
        .load_pdf_from_file(pdf_path, password)
        .map_err(|e| CardsError::CorruptPdf {
            path: pdf_path.to_path_buf(),
            detail: format!("{:?}", e),
        })
}

fn count_pages_blocking(pdf_path: &Path, password: Option<&str>) -> Result<usize, CardsError> {
    let pdfium = Pdfium::default();
    let document = load_document(&pdfium, pdf_path, password)?;
    Ok(document.pages().len() as usize)
}

/// Blocking read of the single image on `page_num` (1-indexed).
fn extract_image_blocking(
    pdf_path: &Path,
    password: Option<&str>,
    page_num: usize,
) -> Result<DynamicImage, CardsError> {
    let pdfium = Pdfium::default();
    let document = load_document(&pdfium, pdf_path, password)?;

    let page = document
        .pages()
        .get((page_num - 1) as u16)
        .map_err(|e| CardsError::ImageReadFailed {
            page: page_num,
            detail: format!("{:?}", e),
        })?;

    let objects = page.objects();
    let images: Vec<_> = objects
        .iter()
        .filter(|object| object.as_image_object().is_some())
        .collect();

    if images.len() != 1 {
        return Err(CardsError::SourceImage {
            page: page_num,
            found: images.len(),
        });
    }

    let image = images[0]
        .as_image_object()
        .ok_or(CardsError::SourceImage {
            page: page_num,
            found: 0,
        })?
        .get_raw_image()
        .map_err(|e| CardsError::ImageReadFailed {
            page: page_num,
            detail: format!("{:?}", e),
        })?;

    debug!(
        "Page {} image → {}x{} px",
        page_num,
        image.width(),
        image.height()
    );
    Ok(image)
}
