//! Named-effect registry trait.
//!
//! The [`EffectRegistry`] trait is the seam between the session, which
//! decides *what* bitmap to feed and *when*, and the pixel code that does
//! the work. The production implementation is
//! [`BuiltinEffects`](super::effects::BuiltinEffects); tests use a
//! recording mock.

use crate::types::FilterName;
use image::RgbaImage;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EffectError {
    #[error("No effect named '{0}'")]
    NotFound(FilterName),
    #[error("Effect failed: {0}")]
    Execution(String),
}

/// A set of named pixel transforms.
///
/// `apply` takes the bitmap by value: the caller hands over an exclusively
/// owned clone and receives exclusive ownership of the result.
pub trait EffectRegistry: Send + Sync {
    /// Effect names in presentation order.
    fn names(&self) -> Vec<FilterName>;

    /// Whether an effect with this name exists.
    fn has(&self, name: &FilterName) -> bool;

    /// Run the named effect.
    fn apply(&self, name: &FilterName, bitmap: RgbaImage) -> Result<RgbaImage, EffectError>;
}

impl<R: EffectRegistry + ?Sized> EffectRegistry for std::sync::Arc<R> {
    fn names(&self) -> Vec<FilterName> {
        (**self).names()
    }

    fn has(&self, name: &FilterName) -> bool {
        (**self).has(name)
    }

    fn apply(&self, name: &FilterName, bitmap: RgbaImage) -> Result<RgbaImage, EffectError> {
        (**self).apply(name, bitmap)
    }
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Mock registry that records calls and runs trivial transforms.
    ///
    /// - `"red"` paints every pixel red
    /// - `"shift"` adds 10 to the red channel (compounds if re-applied)
    /// - `"broken"` always fails
    /// - `"shrink"` returns a 1x1 bitmap (violates size preservation)
    ///
    /// Uses Mutex (not RefCell) so it is Sync and can sit behind the worker.
    pub struct MockEffects {
        pub names: Vec<FilterName>,
        pub calls: Mutex<Vec<String>>,
    }

    impl Default for MockEffects {
        fn default() -> Self {
            Self {
                names: ["red", "shift", "broken", "shrink"]
                    .into_iter()
                    .map(FilterName::new)
                    .collect(),
                calls: Mutex::new(Vec::new()),
            }
        }
    }

    impl MockEffects {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn get_calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    impl EffectRegistry for MockEffects {
        fn names(&self) -> Vec<FilterName> {
            self.names.clone()
        }

        fn has(&self, name: &FilterName) -> bool {
            self.names.contains(name)
        }

        fn apply(&self, name: &FilterName, mut bitmap: RgbaImage) -> Result<RgbaImage, EffectError> {
            self.calls.lock().unwrap().push(name.to_string());
            match name.as_str() {
                "red" => {
                    for px in bitmap.pixels_mut() {
                        px.0 = [255, 0, 0, px.0[3]];
                    }
                    Ok(bitmap)
                }
                "shift" => {
                    for px in bitmap.pixels_mut() {
                        px.0[0] = px.0[0].saturating_add(10);
                    }
                    Ok(bitmap)
                }
                "broken" => Err(EffectError::Execution("boom".into())),
                "shrink" => Ok(RgbaImage::new(1, 1)),
                _ => Err(EffectError::NotFound(name.clone())),
            }
        }
    }

    #[test]
    fn mock_records_apply() {
        let registry = MockEffects::new();
        let out = registry
            .apply(&FilterName::new("red"), RgbaImage::new(2, 1))
            .unwrap();
        assert_eq!(out.get_pixel(1, 0).0, [255, 0, 0, 0]);
        assert_eq!(registry.get_calls(), vec!["red".to_string()]);
    }

    #[test]
    fn mock_reports_membership() {
        let registry = MockEffects::new();
        assert!(registry.has(&FilterName::new("shift")));
        assert!(!registry.has(&FilterName::normal()));
    }

    #[test]
    fn arc_registry_delegates() {
        let registry = std::sync::Arc::new(MockEffects::new());
        assert_eq!(registry.names().len(), 4);
        assert!(
            registry
                .apply(&FilterName::new("broken"), RgbaImage::new(1, 1))
                .is_err()
        );
    }
}
