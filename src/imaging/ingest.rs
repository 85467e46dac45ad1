//! Image ingestion: MIME gate → decode → fit → resample.
//!
//! The decoded source bitmap only lives inside [`ingest_bytes`]; the caller
//! gets back the normalized [`OriginalCanvas`] and nothing else.

use super::calculations::{FitError, fit};
use crate::types::{BoundingBox, Dimensions, OriginalCanvas};
use image::imageops::FilterType;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum IngestError {
    #[error("Unsupported input type: {0}")]
    UnsupportedInputType(String),
    #[error("Failed to decode image: {0}")]
    Decode(String),
    #[error(transparent)]
    Fit(#[from] FitError),
}

/// Extensions with decoders compiled in, and the MIME type each maps to.
const KNOWN_EXTENSIONS: &[(&str, &str)] = &[
    ("jpg", "image/jpeg"),
    ("jpeg", "image/jpeg"),
    ("png", "image/png"),
    ("gif", "image/gif"),
    ("bmp", "image/bmp"),
    ("tif", "image/tiff"),
    ("tiff", "image/tiff"),
    ("webp", "image/webp"),
];

/// Whether a declared type names an image format (`image/*`).
pub fn is_image_type(mime: &str) -> bool {
    mime.trim()
        .get(..5)
        .is_some_and(|prefix| prefix.eq_ignore_ascii_case("image"))
}

/// Guess the MIME type of a file from its extension.
pub fn mime_for_path(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?;
    KNOWN_EXTENSIONS
        .iter()
        .find(|(known, _)| known.eq_ignore_ascii_case(ext))
        .map(|(_, mime)| *mime)
}

/// Decode `bytes` and normalize them into a canvas that fits `bounds`.
///
/// Non-image types are rejected before any decoding. Images already inside
/// the box keep their pixels as-is; larger ones are resampled with Lanczos3.
#[tracing::instrument(skip(bytes), fields(len = bytes.len()))]
pub fn ingest_bytes(
    bytes: &[u8],
    mime: &str,
    bounds: BoundingBox,
) -> Result<OriginalCanvas, IngestError> {
    if !is_image_type(mime) {
        return Err(IngestError::UnsupportedInputType(mime.to_string()));
    }

    let source = image::load_from_memory(bytes).map_err(|e| IngestError::Decode(e.to_string()))?;
    let source_dims = Dimensions {
        width: source.width(),
        height: source.height(),
    };
    let target = fit(source_dims, bounds)?;
    tracing::debug!(%source_dims, %target, %bounds, "fitted source image");

    let pixels = if target == source_dims {
        source.into_rgba8()
    } else {
        source
            .resize_exact(target.width, target.height, FilterType::Lanczos3)
            .into_rgba8()
    };

    // fit() never yields a zero axis, so this only fails on a decoder bug.
    OriginalCanvas::new(pixels).ok_or(IngestError::Fit(FitError::InvalidDimensions {
        width: target.width,
        height: target.height,
    }))
}
