//! Holder for the single canonical canvas of the current session.

use crate::types::OriginalCanvas;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("No image loaded")]
    NoImageLoaded,
}

/// Owns at most one [`OriginalCanvas`].
///
/// Replacement is a single assignment of a fully built canvas, so a reader
/// sees either the old canvas or the new one.
#[derive(Debug, Default)]
pub struct OriginalImageStore {
    canvas: Option<OriginalCanvas>,
}

impl OriginalImageStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace any prior original.
    pub fn set_original(&mut self, canvas: OriginalCanvas) {
        self.canvas = Some(canvas);
    }

    pub fn current(&self) -> Result<&OriginalCanvas, StoreError> {
        self.canvas.as_ref().ok_or(StoreError::NoImageLoaded)
    }

    pub fn clear(&mut self) {
        self.canvas = None;
    }

    pub fn is_loaded(&self) -> bool {
        self.canvas.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::RgbaImage;

    fn canvas(w: u32, h: u32) -> OriginalCanvas {
        OriginalCanvas::new(RgbaImage::new(w, h)).unwrap()
    }

    #[test]
    fn empty_store_has_no_image() {
        let store = OriginalImageStore::new();
        assert!(!store.is_loaded());
        assert_eq!(store.current().unwrap_err(), StoreError::NoImageLoaded);
    }

    #[test]
    fn set_replaces_prior_original() {
        let mut store = OriginalImageStore::new();
        store.set_original(canvas(10, 10));
        store.set_original(canvas(20, 5));
        assert_eq!(store.current().unwrap().dims().width, 20);
    }

    #[test]
    fn clear_forgets_original() {
        let mut store = OriginalImageStore::new();
        store.set_original(canvas(1, 1));
        store.clear();
        assert!(store.current().is_err());
    }
}
