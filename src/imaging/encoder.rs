//! Export encoding: turns a rendered bitmap into downloadable bytes.
//!
//! [`ExportEncoder`] is the trait the session calls; [`RustEncoder`] is the
//! production implementation using the `image` crate's pure-Rust encoders.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as B64;
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::codecs::webp::WebPEncoder;
use image::{DynamicImage, ExtendedColorType, ImageEncoder, RgbaImage};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EncodeError {
    #[error("Unknown export format: {0}")]
    UnknownFormat(String),
    #[error("Encoding failed: {0}")]
    Failed(String),
}

/// Output format for exported images.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ExportFormat {
    #[default]
    Png,
    /// Lossy JPEG, quality 1-100. Alpha is dropped.
    Jpeg { quality: u8 },
    /// Lossless WebP.
    WebP,
}

impl ExportFormat {
    pub fn mime(self) -> &'static str {
        match self {
            ExportFormat::Png => "image/png",
            ExportFormat::Jpeg { .. } => "image/jpeg",
            ExportFormat::WebP => "image/webp",
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Png => "png",
            ExportFormat::Jpeg { .. } => "jpg",
            ExportFormat::WebP => "webp",
        }
    }

    /// Parse a format name, attaching `quality` when the format is lossy.
    pub fn parse_with_quality(name: &str, quality: u8) -> Result<Self, EncodeError> {
        match name.trim().to_ascii_lowercase().as_str() {
            "png" => Ok(ExportFormat::Png),
            "jpg" | "jpeg" => Ok(ExportFormat::Jpeg {
                quality: quality.clamp(1, 100),
            }),
            "webp" => Ok(ExportFormat::WebP),
            other => Err(EncodeError::UnknownFormat(other.to_string())),
        }
    }
}

impl FromStr for ExportFormat {
    type Err = EncodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_with_quality(s, 90)
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExportFormat::Jpeg { quality } => write!(f, "jpeg (quality {quality})"),
            other => f.write_str(other.extension()),
        }
    }
}

/// Serializes a bitmap into an encoded byte stream.
pub trait ExportEncoder: Send + Sync {
    fn encode(&self, bitmap: &RgbaImage, format: ExportFormat) -> Result<Vec<u8>, EncodeError>;
}

/// Pure Rust encoder using the `image` crate codecs.
#[derive(Debug, Clone, Copy, Default)]
pub struct RustEncoder;

impl RustEncoder {
    pub fn new() -> Self {
        Self
    }
}

fn encode_failed(format: ExportFormat) -> impl Fn(image::ImageError) -> EncodeError {
    move |e| EncodeError::Failed(format!("{} encode failed: {}", format.extension(), e))
}

impl ExportEncoder for RustEncoder {
    fn encode(&self, bitmap: &RgbaImage, format: ExportFormat) -> Result<Vec<u8>, EncodeError> {
        let (w, h) = bitmap.dimensions();
        let mut out = Vec::new();
        match format {
            ExportFormat::Png => PngEncoder::new(&mut out)
                .write_image(bitmap.as_raw(), w, h, ExtendedColorType::Rgba8)
                .map_err(encode_failed(format))?,
            ExportFormat::Jpeg { quality } => {
                let rgb = DynamicImage::ImageRgba8(bitmap.clone()).to_rgb8();
                JpegEncoder::new_with_quality(&mut out, quality)
                    .write_image(rgb.as_raw(), w, h, ExtendedColorType::Rgb8)
                    .map_err(encode_failed(format))?
            }
            ExportFormat::WebP => WebPEncoder::new_lossless(&mut out)
                .write_image(bitmap.as_raw(), w, h, ExtendedColorType::Rgba8)
                .map_err(encode_failed(format))?,
        }
        Ok(out)
    }
}

/// Wrap encoded bytes as a `data:` URL, e.g. for a download link `href`.
pub fn to_data_url(bytes: &[u8], format: ExportFormat) -> String {
    format!("data:{};base64,{}", format.mime(), B64.encode(bytes))
}
