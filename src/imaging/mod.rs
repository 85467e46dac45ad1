//! Image processing: pure Rust, no system libraries.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Fit** | [`fit`], pure dimension math |
//! | **Ingest** | `image::load_from_memory` + Lanczos3 resample |
//! | **Effects** | [`EffectRegistry`] trait + [`BuiltinEffects`] |
//! | **Export** | [`ExportEncoder`] trait + [`RustEncoder`] (PNG, JPEG, WebP) |
//!
//! The module is split into:
//! - **Calculations**: Pure functions for dimension math (unit testable)
//! - **Ingest**: Decoding and normalization into an original canvas
//! - **Registry**: [`EffectRegistry`] trait, the seam to pixel transforms
//! - **Effects**: The built-in registry
//! - **Encoder**: [`ExportEncoder`] trait + [`RustEncoder`]

mod calculations;
pub mod effects;
pub mod encoder;
pub mod ingest;
pub mod registry;

pub use calculations::{FitError, center_offsets, fit};
pub use effects::{BuiltinEffects, Effect};
pub use encoder::{EncodeError, ExportEncoder, ExportFormat, RustEncoder, to_data_url};
pub use ingest::{IngestError, ingest_bytes, mime_for_path};
pub use registry::{EffectError, EffectRegistry};
