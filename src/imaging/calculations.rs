//! Pure calculation functions for canvas dimensions.
//!
//! All functions here are pure and testable without any I/O or images.

use crate::types::{BoundingBox, Dimensions};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FitError {
    #[error("Invalid dimensions: {width}x{height} (both axes must be non-zero)")]
    InvalidDimensions { width: u32, height: u32 },
}

/// Fit source dimensions inside a bounding box, preserving aspect ratio.
///
/// Sources strictly smaller than the box on both axes are returned as-is
/// (no upscaling). Otherwise the driving axis is pinned to the box:
///
/// - wide (`width > height`): width becomes `max_width`
/// - tall or square: height becomes `max_height`
///
/// The other axis is rounded half-up to a whole pixel, never below 1. With a
/// non-square box, if that axis would still overflow, the other axis is
/// pinned instead.
///
/// # Examples
/// ```
/// # use filterbooth::imaging::fit;
/// # use filterbooth::types::{BoundingBox, Dimensions};
/// let bounds = BoundingBox::new(500, 500);
/// let wide = Dimensions::new(800, 400).unwrap();
/// assert_eq!(fit(wide, bounds).unwrap(), Dimensions::new(500, 250).unwrap());
///
/// let tall = Dimensions::new(300, 600).unwrap();
/// assert_eq!(fit(tall, bounds).unwrap(), Dimensions::new(250, 500).unwrap());
/// ```
pub fn fit(source: Dimensions, bounds: BoundingBox) -> Result<Dimensions, FitError> {
    if source.width == 0 || source.height == 0 {
        return Err(FitError::InvalidDimensions {
            width: source.width,
            height: source.height,
        });
    }
    if bounds.max_width == 0 || bounds.max_height == 0 {
        return Err(FitError::InvalidDimensions {
            width: bounds.max_width,
            height: bounds.max_height,
        });
    }

    if source.width < bounds.max_width && source.height < bounds.max_height {
        return Ok(source);
    }

    let pin_width = || {
        let ratio = source.width as f64 / bounds.max_width as f64;
        (bounds.max_width, round_pixels(source.height as f64 / ratio))
    };
    let pin_height = || {
        let ratio = source.height as f64 / bounds.max_height as f64;
        (round_pixels(source.width as f64 / ratio), bounds.max_height)
    };

    // A non-square box can leave the other axis too long; pin that one instead.
    let (width, height) = if source.width > source.height {
        match pin_width() {
            (_, h) if h > bounds.max_height => pin_height(),
            wide => wide,
        }
    } else {
        match pin_height() {
            (w, _) if w > bounds.max_width => pin_width(),
            tall => tall,
        }
    };

    Ok(Dimensions { width, height })
}

/// Round a positive pixel extent half-up, with a floor of one pixel.
fn round_pixels(value: f64) -> u32 {
    (value.round() as u32).max(1)
}

/// Negative half extents `(top, left)` that center a canvas on its anchor.
///
/// Uses integer division, so odd extents lean towards the top-left.
pub fn center_offsets(dims: Dimensions) -> (i64, i64) {
    (-(dims.height as i64 / 2), -(dims.width as i64 / 2))
}
