//! Configuration module.
//!
//! Handles loading and validating `filterbooth.toml`. Every key has a
//! default, so a user file only needs the keys it wants to change, and
//! command-line flags override both.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [canvas]
//! max_width = 500           # Bounding box for the working canvas
//! max_height = 500
//!
//! [filters]
//! # order = ["normal", "sepia", "grayscale"]   # Omit to offer every built-in
//!
//! [export]
//! format = "png"            # png, jpeg, or webp
//! quality = 90              # JPEG quality (1-100)
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use crate::catalog::FilterCatalog;
use crate::imaging::{EffectRegistry, ExportFormat};
use crate::types::BoundingBox;
use serde::Deserialize;
use std::fs;
use std::path::Path;
use thiserror::Error;

/// File name looked up inside the config directory.
pub const CONFIG_FILE: &str = "filterbooth.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Configuration loaded from `filterbooth.toml`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BoothConfig {
    /// Working canvas bounds.
    pub canvas: CanvasConfig,
    /// Which filters are offered, and in what order.
    pub filters: FiltersConfig,
    /// Export encoding.
    pub export: ExportConfig,
}

impl BoothConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.canvas.max_width == 0 || self.canvas.max_height == 0 {
            return Err(ConfigError::Validation(
                "canvas.max_width and canvas.max_height must be non-zero".into(),
            ));
        }
        if !(1..=100).contains(&self.export.quality) {
            return Err(ConfigError::Validation(
                "export.quality must be 1-100".into(),
            ));
        }
        self.export.format()?;
        if self.filters.order.as_ref().is_some_and(Vec::is_empty) {
            return Err(ConfigError::Validation(
                "filters.order must not be empty (omit it to offer every filter)".into(),
            ));
        }
        Ok(())
    }

    /// The catalog to offer: the configured order, or every registry effect.
    pub fn catalog(&self, registry: &impl EffectRegistry) -> FilterCatalog {
        match &self.filters.order {
            Some(order) => FilterCatalog::from_names(order.iter().map(String::as_str)),
            None => FilterCatalog::from_registry(registry),
        }
    }
}

/// Working canvas bounds.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CanvasConfig {
    pub max_width: u32,
    pub max_height: u32,
}

impl CanvasConfig {
    pub fn bounds(&self) -> BoundingBox {
        BoundingBox::new(self.max_width, self.max_height)
    }
}

impl Default for CanvasConfig {
    fn default() -> Self {
        let bounds = BoundingBox::default();
        Self {
            max_width: bounds.max_width,
            max_height: bounds.max_height,
        }
    }
}

/// Filter catalog settings.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FiltersConfig {
    /// Filter names in presentation order. `None` offers every built-in.
    /// Names without a matching effect render the original unchanged.
    pub order: Option<Vec<String>>,
}

/// Export settings.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ExportConfig {
    /// `png`, `jpeg`/`jpg`, or `webp`.
    pub format: String,
    /// JPEG quality (1 = worst, 100 = best). Ignored by lossless formats.
    pub quality: u32,
}

impl ExportConfig {
    pub fn format(&self) -> Result<ExportFormat, ConfigError> {
        let quality = self.quality.clamp(1, 100) as u8;
        ExportFormat::parse_with_quality(&self.format, quality)
            .map_err(|e| ConfigError::Validation(format!("export.format: {e}")))
    }
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            format: "png".to_string(),
            quality: 90,
        }
    }
}

// =============================================================================
// Config loading
// =============================================================================

/// Parse and validate the contents of a `filterbooth.toml`.
///
/// Sections and keys the text leaves out keep their defaults.
pub fn parse_config(content: &str) -> Result<BoothConfig, ConfigError> {
    let config: BoothConfig = toml::from_str(content)?;
    config.validate()?;
    Ok(config)
}

/// Load config from `filterbooth.toml` in the given directory.
///
/// A missing file yields the defaults.
pub fn load_config(dir: &Path) -> Result<BoothConfig, ConfigError> {
    let config_path = dir.join(CONFIG_FILE);
    if !config_path.exists() {
        return Ok(BoothConfig::default());
    }
    let content = fs::read_to_string(&config_path)?;
    parse_config(&content)
}

/// Returns a fully-commented stock `filterbooth.toml`.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# filterbooth configuration
# =========================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults.
# Unknown keys will cause an error.

# ---------------------------------------------------------------------------
# Working canvas
# ---------------------------------------------------------------------------
[canvas]
# Images are scaled down (never up) to fit this box, keeping aspect ratio.
# Anything that reaches the box on either axis is resized.
max_width = 500
max_height = 500

# ---------------------------------------------------------------------------
# Filters
# ---------------------------------------------------------------------------
[filters]
# Names offered to the user, in order. "normal" (no effect) is always first.
# Names with no matching effect show the original and cannot be exported.
# Omit to offer every built-in effect.
# order = ["normal", "grayscale", "sepia", "vintage", "blur"]

# ---------------------------------------------------------------------------
# Export
# ---------------------------------------------------------------------------
[export]
# png, jpeg, or webp (lossless).
format = "png"

# JPEG quality (1 = worst, 100 = best).
quality = 90
"##
}
