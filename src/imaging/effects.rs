//! Built-in effect registry on top of the `image` crate.
//!
//! ## Effect mapping
//!
//! | Name | Implementation |
//! |---|---|
//! | `grayscale` | Rec. 601 luma, per pixel (rayon) |
//! | `sepia` | Classic sepia tone matrix, per pixel (rayon) |
//! | `invert` | Channel inversion, alpha kept (rayon) |
//! | `vintage` | Half-strength sepia, faded contrast, radial vignette (rayon) |
//! | `brighten` / `darken` | `image::imageops::brighten` |
//! | `contrast` | `image::imageops::contrast` |
//! | `blur` | `image::imageops::blur` |
//! | `sharpen` | `image::imageops::unsharpen` |
//! | `edge-detect` | Laplacian via `image::imageops::filter3x3` on luma |
//! | `emboss` | `image::imageops::filter3x3` with an emboss kernel |
//! | `hue-rotate` | `image::imageops::huerotate` |

use super::registry::{EffectError, EffectRegistry};
use crate::types::FilterName;
use image::imageops;
use image::{GrayImage, Luma, RgbaImage};
use rayon::prelude::*;

/// A single built-in effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    Grayscale,
    Sepia,
    Invert,
    Vintage,
    Brighten,
    Darken,
    Contrast,
    Blur,
    Sharpen,
    EdgeDetect,
    Emboss,
    HueRotate,
}

impl Effect {
    pub const ALL: [Effect; 12] = [
        Effect::Grayscale,
        Effect::Sepia,
        Effect::Invert,
        Effect::Vintage,
        Effect::Brighten,
        Effect::Darken,
        Effect::Contrast,
        Effect::Blur,
        Effect::Sharpen,
        Effect::EdgeDetect,
        Effect::Emboss,
        Effect::HueRotate,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Effect::Grayscale => "grayscale",
            Effect::Sepia => "sepia",
            Effect::Invert => "invert",
            Effect::Vintage => "vintage",
            Effect::Brighten => "brighten",
            Effect::Darken => "darken",
            Effect::Contrast => "contrast",
            Effect::Blur => "blur",
            Effect::Sharpen => "sharpen",
            Effect::EdgeDetect => "edge-detect",
            Effect::Emboss => "emboss",
            Effect::HueRotate => "hue-rotate",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|e| e.name() == name)
    }

    fn run(self, bitmap: RgbaImage) -> RgbaImage {
        match self {
            Effect::Grayscale => map_pixels(bitmap, grayscale_px),
            Effect::Sepia => map_pixels(bitmap, |px| sepia_px(px, 1.0)),
            Effect::Invert => map_pixels(bitmap, |[r, g, b, a]| [255 - r, 255 - g, 255 - b, a]),
            Effect::Vintage => vintage(bitmap),
            Effect::Brighten => imageops::brighten(&bitmap, 30),
            Effect::Darken => imageops::brighten(&bitmap, -30),
            Effect::Contrast => imageops::contrast(&bitmap, 25.0),
            Effect::Blur => imageops::blur(&bitmap, 2.0),
            Effect::Sharpen => imageops::unsharpen(&bitmap, 1.0, 2),
            Effect::EdgeDetect => edge_detect(&bitmap),
            Effect::Emboss => {
                imageops::filter3x3(&bitmap, &[-2.0, -1.0, 0.0, -1.0, 1.0, 1.0, 0.0, 1.0, 2.0])
            }
            Effect::HueRotate => imageops::huerotate(&bitmap, 90),
        }
    }
}

/// Registry of the built-in effects, in a fixed presentation order.
#[derive(Debug, Clone)]
pub struct BuiltinEffects {
    effects: Vec<Effect>,
}

impl BuiltinEffects {
    /// All built-in effects.
    pub fn new() -> Self {
        Self {
            effects: Effect::ALL.to_vec(),
        }
    }

    /// Only the given effects, in the given order.
    pub fn with_effects(effects: impl IntoIterator<Item = Effect>) -> Self {
        Self {
            effects: effects.into_iter().collect(),
        }
    }

    fn lookup(&self, name: &FilterName) -> Option<Effect> {
        Effect::from_name(name.as_str()).filter(|e| self.effects.contains(e))
    }
}

impl Default for BuiltinEffects {
    fn default() -> Self {
        Self::new()
    }
}

impl EffectRegistry for BuiltinEffects {
    fn names(&self) -> Vec<FilterName> {
        self.effects.iter().map(|e| FilterName::new(e.name())).collect()
    }

    fn has(&self, name: &FilterName) -> bool {
        self.lookup(name).is_some()
    }

    fn apply(&self, name: &FilterName, bitmap: RgbaImage) -> Result<RgbaImage, EffectError> {
        let effect = self
            .lookup(name)
            .ok_or_else(|| EffectError::NotFound(name.clone()))?;
        if bitmap.width() == 0 || bitmap.height() == 0 {
            return Err(EffectError::Execution(format!(
                "{} needs a non-empty bitmap",
                effect.name()
            )));
        }
        tracing::debug!(
            effect = effect.name(),
            width = bitmap.width(),
            height = bitmap.height(),
            "applying effect"
        );
        Ok(effect.run(bitmap))
    }
}

// =============================================================================
// Pixel kernels
// =============================================================================

/// Apply a per-pixel function in parallel, row by row.
fn map_pixels(mut bitmap: RgbaImage, f: impl Fn([u8; 4]) -> [u8; 4] + Sync) -> RgbaImage {
    let buf: &mut [u8] = &mut bitmap;
    buf.par_chunks_exact_mut(4).for_each(|px| {
        let out = f([px[0], px[1], px[2], px[3]]);
        px.copy_from_slice(&out);
    });
    bitmap
}

fn luma(r: u8, g: u8, b: u8) -> f32 {
    0.299 * r as f32 + 0.587 * g as f32 + 0.114 * b as f32
}

fn clamp_u8(v: f32) -> u8 {
    v.round().clamp(0.0, 255.0) as u8
}

fn grayscale_px([r, g, b, a]: [u8; 4]) -> [u8; 4] {
    let y = clamp_u8(luma(r, g, b));
    [y, y, y, a]
}

/// Sepia tone blended with the source by `strength` (0 = none, 1 = full).
fn sepia_px([r, g, b, a]: [u8; 4], strength: f32) -> [u8; 4] {
    let (rf, gf, bf) = (r as f32, g as f32, b as f32);
    let sr = 0.393 * rf + 0.769 * gf + 0.189 * bf;
    let sg = 0.349 * rf + 0.686 * gf + 0.168 * bf;
    let sb = 0.272 * rf + 0.534 * gf + 0.131 * bf;
    let mix = |src: f32, tone: f32| clamp_u8(src + (tone - src) * strength);
    [mix(rf, sr), mix(gf, sg), mix(bf, sb), a]
}

fn vintage(mut bitmap: RgbaImage) -> RgbaImage {
    let (w, h) = bitmap.dimensions();
    let (cx, cy) = (w as f32 / 2.0, h as f32 / 2.0);
    let max_dist = (cx * cx + cy * cy).sqrt().max(1.0);
    let row_len = w as usize * 4;

    let buf: &mut [u8] = &mut bitmap;
    buf.par_chunks_exact_mut(row_len)
        .enumerate()
        .for_each(|(y, row)| {
            for (x, px) in row.chunks_exact_mut(4).enumerate() {
                let [r, g, b, a] = sepia_px([px[0], px[1], px[2], px[3]], 0.5);
                let dx = x as f32 - cx;
                let dy = y as f32 - cy;
                let falloff = 1.0 - 0.4 * ((dx * dx + dy * dy).sqrt() / max_dist).powi(2);
                // Fade: pull towards mid-grey before the vignette
                let fade = |c: u8| clamp_u8((c as f32 * 0.85 + 20.0) * falloff);
                px.copy_from_slice(&[fade(r), fade(g), fade(b), a]);
            }
        });
    bitmap
}

fn edge_detect(bitmap: &RgbaImage) -> RgbaImage {
    let gray = GrayImage::from_fn(bitmap.width(), bitmap.height(), |x, y| {
        let [r, g, b, _] = bitmap.get_pixel(x, y).0;
        Luma([clamp_u8(luma(r, g, b))])
    });
    let edges = imageops::filter3x3(&gray, &[-1.0, -1.0, -1.0, -1.0, 8.0, -1.0, -1.0, -1.0, -1.0]);
    RgbaImage::from_fn(bitmap.width(), bitmap.height(), |x, y| {
        let e = edges.get_pixel(x, y).0[0];
        image::Rgba([e, e, e, bitmap.get_pixel(x, y).0[3]])
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    fn gradient(width: u32, height: u32) -> RgbaImage {
        RgbaImage::from_fn(width, height, |x, y| {
            Rgba([(x * 20 % 256) as u8, (y * 30 % 256) as u8, 128, 255])
        })
    }

    #[test]
    fn names_follow_presentation_order() {
        let names = BuiltinEffects::new().names();
        assert_eq!(names.len(), Effect::ALL.len());
        assert_eq!(names[0].as_str(), "grayscale");
        assert_eq!(names[1].as_str(), "sepia");
    }

    #[test]
    fn normal_is_not_a_registry_effect() {
        assert!(!BuiltinEffects::new().has(&FilterName::normal()));
    }

    #[test]
    fn restricted_registry_hides_other_effects() {
        let registry = BuiltinEffects::with_effects([Effect::Sepia]);
        assert!(registry.has(&FilterName::new("sepia")));
        assert!(!registry.has(&FilterName::new("blur")));
        assert_eq!(
            registry.apply(&FilterName::new("blur"), gradient(2, 2)),
            Err(EffectError::NotFound(FilterName::new("blur")))
        );
    }

    #[test]
    fn every_effect_preserves_dimensions() {
        let registry = BuiltinEffects::new();
        for name in registry.names() {
            let out = registry.apply(&name, gradient(17, 9)).unwrap();
            assert_eq!(out.dimensions(), (17, 9), "{name} changed dimensions");
        }
    }

    #[test]
    fn grayscale_equalizes_channels_and_keeps_alpha() {
        let img = RgbaImage::from_pixel(3, 3, Rgba([200, 100, 50, 77]));
        let out = BuiltinEffects::new()
            .apply(&FilterName::new("grayscale"), img)
            .unwrap();
        let [r, g, b, a] = out.get_pixel(1, 1).0;
        assert_eq!((r, r), (g, b));
        assert_eq!(a, 77);
    }

    #[test]
    fn invert_twice_is_identity() {
        let registry = BuiltinEffects::new();
        let name = FilterName::new("invert");
        let src = gradient(5, 4);
        let once = registry.apply(&name, src.clone()).unwrap();
        assert_ne!(once, src);
        let twice = registry.apply(&name, once).unwrap();
        assert_eq!(twice, src);
    }

    #[test]
    fn sepia_warms_a_grey_pixel() {
        let img = RgbaImage::from_pixel(1, 1, Rgba([100, 100, 100, 255]));
        let out = BuiltinEffects::new()
            .apply(&FilterName::new("sepia"), img)
            .unwrap();
        let [r, g, b, _] = out.get_pixel(0, 0).0;
        assert!(r > g && g > b);
    }

    #[test]
    fn edge_detect_flat_image_is_black_and_opaque() {
        let img = RgbaImage::from_pixel(4, 4, Rgba([90, 90, 90, 255]));
        let out = BuiltinEffects::new()
            .apply(&FilterName::new("edge-detect"), img)
            .unwrap();
        assert_eq!(out.get_pixel(2, 2).0, [0, 0, 0, 255]);
    }

    #[test]
    fn vintage_darkens_corners_more_than_center() {
        let img = RgbaImage::from_pixel(21, 21, Rgba([180, 180, 180, 255]));
        let out = BuiltinEffects::new()
            .apply(&FilterName::new("vintage"), img)
            .unwrap();
        assert!(out.get_pixel(0, 0).0[0] < out.get_pixel(10, 10).0[0]);
    }

    #[test]
    fn empty_bitmap_is_an_execution_error() {
        let result = BuiltinEffects::new().apply(&FilterName::new("blur"), RgbaImage::new(0, 0));
        assert!(matches!(result, Err(EffectError::Execution(_))));
    }

    #[test]
    fn effect_name_roundtrip() {
        for effect in Effect::ALL {
            assert_eq!(Effect::from_name(effect.name()), Some(effect));
        }
        assert_eq!(Effect::from_name("normal"), None);
    }
}
