//! Shared value types used across ingestion, the session, and export.
//!
//! Pixel buffers are `image::RgbaImage` throughout. Canvases hold them
//! behind an `Arc` so a published render can be handed to an encoder or a
//! caller without copying, while the session keeps sole authority over
//! which render is current.

use image::RgbaImage;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Width and height of a bitmap in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

impl Dimensions {
    /// Build dimensions, rejecting a zero axis.
    pub fn new(width: u32, height: u32) -> Option<Self> {
        (width > 0 && height > 0).then_some(Self { width, height })
    }

    pub fn of(bitmap: &RgbaImage) -> Self {
        Self {
            width: bitmap.width(),
            height: bitmap.height(),
        }
    }

    /// Width divided by height.
    pub fn aspect(self) -> f64 {
        self.width as f64 / self.height as f64
    }
}

impl fmt::Display for Dimensions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Maximum permitted size of the working canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub max_width: u32,
    pub max_height: u32,
}

impl BoundingBox {
    pub fn new(max_width: u32, max_height: u32) -> Self {
        Self {
            max_width,
            max_height,
        }
    }
}

impl Default for BoundingBox {
    fn default() -> Self {
        Self::new(500, 500)
    }
}

impl fmt::Display for BoundingBox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.max_width, self.max_height)
    }
}

/// Name of a filter as shown to the user and looked up in a registry.
///
/// Surrounding whitespace is stripped on construction, so `" sepia "` and
/// `"sepia"` name the same filter.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct FilterName(String);

impl FilterName {
    /// The identity filter. Selecting it shows the original untouched.
    pub const NORMAL: &'static str = "normal";

    pub fn new(name: impl AsRef<str>) -> Self {
        Self(name.as_ref().trim().to_string())
    }

    pub fn normal() -> Self {
        Self(Self::NORMAL.to_string())
    }

    pub fn is_normal(&self) -> bool {
        self.0 == Self::NORMAL
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for FilterName {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

impl From<&str> for FilterName {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<FilterName> for String {
    fn from(value: FilterName) -> Self {
        value.0
    }
}

impl fmt::Display for FilterName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The normalized, immutable reference bitmap for the loaded image.
///
/// Cloning an `OriginalCanvas` shares the pixel buffer; effects always work
/// on [`OriginalCanvas::copy_pixels`], never on the shared buffer.
#[derive(Debug, Clone)]
pub struct OriginalCanvas {
    pixels: Arc<RgbaImage>,
    dims: Dimensions,
}

impl OriginalCanvas {
    /// Wrap an already-normalized bitmap. Returns `None` for an empty bitmap.
    pub fn new(pixels: RgbaImage) -> Option<Self> {
        let dims = Dimensions::new(pixels.width(), pixels.height())?;
        Some(Self {
            pixels: Arc::new(pixels),
            dims,
        })
    }

    pub fn dims(&self) -> Dimensions {
        self.dims
    }

    pub fn pixels(&self) -> &RgbaImage {
        &self.pixels
    }

    /// A fresh, exclusively owned copy of the pixel buffer.
    pub fn copy_pixels(&self) -> RgbaImage {
        self.pixels.as_ref().clone()
    }
}

/// A bitmap published by the session for display and export.
#[derive(Debug, Clone)]
pub struct RenderedCanvas {
    pub selection: FilterName,
    pub pixels: Arc<RgbaImage>,
    pub dims: Dimensions,
    /// Whether the download action should be offered for this render.
    pub exportable: bool,
    /// Publish counter within the session, starting at 1.
    pub revision: u64,
}
