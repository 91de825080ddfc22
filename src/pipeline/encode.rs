//! Image encoding: `DynamicImage` → base64 PNG wrapped in `ImageData`.
//!
//! Scanned pages usually embed a JPEG, but pdfium hands the image back
//! decoded. Re-encoding as PNG is lossless, so the model sees exactly the
//! pixels stored in the PDF.

use crate::error::CardsError;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use edgequake_llm::ImageData;
use image::{DynamicImage, ImageFormat};
use std::io::Cursor;
use std::path::Path;
use tracing::debug;

/// Encode a page image as a base64 PNG ready for the vision API.
///
/// `detail: "high"` lets GPT-4-class models tile the image instead of
/// downsampling it to one 512 px overview, which is what small print in a
/// two-column encyclopedia needs.
pub fn encode_page_image(img: &DynamicImage) -> Result<ImageData, image::ImageError> {
    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)?;

    let b64 = STANDARD.encode(&buf);
    debug!(
        "Encoded {}x{} image → {} bytes base64",
        img.width(),
        img.height(),
        b64.len()
    );

    Ok(ImageData::new(b64, "image/png").with_detail("high"))
}

/// Wrap raw image bytes already in a known format (e.g. a JPEG read from
/// disk) without decoding them.
pub fn encode_image_bytes(bytes: &[u8], mime_type: &str) -> ImageData {
    ImageData::new(STANDARD.encode(bytes), mime_type).with_detail("high")
}

/// Read a page image saved as a file, for `page_num` of a loose-image run.
///
/// The MIME type comes from the file extension; the bytes are passed through
/// untouched.
pub fn read_image_file(path: &Path, page_num: usize) -> Result<ImageData, CardsError> {
    let format = ImageFormat::from_path(path).map_err(|e| CardsError::ImageReadFailed {
        page: page_num,
        detail: format!("{}: {}", path.display(), e),
    })?;
    let bytes = std::fs::read(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => CardsError::FileNotFound {
            path: path.to_path_buf(),
        },
        _ => CardsError::ImageReadFailed {
            page: page_num,
            detail: format!("{}: {}", path.display(), e),
        },
    })?;
    debug!("Read {} ({} bytes)", path.display(), bytes.len());
    Ok(encode_image_bytes(&bytes, format.to_mime_type()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    #[test]
    fn encode_scanned_page() {
        let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(12, 8, Rgb([240, 235, 220])));
        let data = encode_page_image(&img).expect("encode should succeed");
        assert_eq!(data.mime_type, "image/png");

        let decoded = STANDARD.decode(&data.data).expect("valid base64");
        assert_eq!(&decoded[..4], b"\x89PNG");
    }

    #[test]
    fn raw_bytes_keep_mime_type() {
        let data = encode_image_bytes(b"\xFF\xD8\xFF\xE0fakejpeg", "image/jpeg");
        assert_eq!(data.mime_type, "image/jpeg");
        assert_eq!(STANDARD.decode(&data.data).unwrap(), b"\xFF\xD8\xFF\xE0fakejpeg");
    }

    #[test]
    fn image_file_mime_follows_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("page-012.jpg");
        std::fs::write(&path, b"\xFF\xD8\xFF\xE0scan").unwrap();

        let data = read_image_file(&path, 1).unwrap();
        assert_eq!(data.mime_type, "image/jpeg");
    }

    #[test]
    fn unknown_extension_and_missing_file_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let notes = dir.path().join("notes.txt");
        std::fs::write(&notes, b"hello").unwrap();
        assert!(matches!(
            read_image_file(&notes, 2),
            Err(CardsError::ImageReadFailed { page: 2, .. })
        ));
        assert!(matches!(
            read_image_file(&dir.path().join("gone.png"), 3),
            Err(CardsError::FileNotFound { .. })
        ));
    }
}
