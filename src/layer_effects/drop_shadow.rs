//! Drop shadow layer effect.
//!
//! Separates *spread* (growth before blur) from *size* (blur amount), the
//! way layer-style dialogs in image editors do:
//! 1. If `spread > 0` and `size > 0`, expand the mask by
//!    `max(1, round(size * spread / 100))` pixels
//! 2. Fill with the shadow color at the boosted alpha (see [`shadow_alpha`])
//! 3. Blur with radius `size / 2`
//!
//! Anti-aliasing is preserved through all operations.

use ndarray::ArrayView2;
use serde::{Deserialize, Serialize};

use super::LayerEffect;
use crate::error::{Error, Result};
use crate::filters::core::{fill_mask, kernel_half_width, scale_mask, Mask, Rgb, Rgba};
use crate::filters::{blur_mask, expand, Acceleration};

/// Multiplier applied to the shadow alpha to offset the dimming of the blur.
pub const SHADOW_OPACITY_BOOST: f64 = 2.2;

/// Pre-blur fill alpha for a shadow of `opacity` percent.
///
/// `min(255, round(opacity * 255 / 100 * 2.2))`. Anything above ~45%
/// saturates at 255.
pub fn shadow_alpha(opacity: u8) -> u8 {
    (opacity as f64 * 255.0 / 100.0 * SHADOW_OPACITY_BOOST)
        .round()
        .min(255.0) as u8
}

/// Descriptor parameters for a drop shadow.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ShadowParams {
    pub size: i32,
    pub spread: i64,
    pub opacity: i64,
    pub color: Rgb,
}

/// Soft drop shadow beneath the glyph.
#[derive(Clone, Debug, PartialEq)]
pub struct ShadowEffect {
    size: i32,
    spread: u8,
    opacity: u8,
    color: Rgb,
    accel: Acceleration,
}

impl ShadowEffect {
    pub const NAME: &'static str = "shadow";

    /// Build a shadow, validating `spread` and `opacity` against [0, 100].
    pub fn new(size: i32, spread: i64, opacity: i64, color: Rgb, accel: Acceleration) -> Result<Self> {
        let spread = Error::check_percent(Self::NAME, "spread", spread)?;
        let opacity = Error::check_percent(Self::NAME, "opacity", opacity)?;
        Ok(Self {
            size,
            spread,
            opacity,
            color,
            accel,
        })
    }

    pub fn from_params(params: ShadowParams, accel: Acceleration) -> Result<Self> {
        Self::new(params.size, params.spread, params.opacity, params.color, accel)
    }

    /// Pixels of pre-blur expansion.
    pub fn spread_pixels(&self) -> i32 {
        if self.spread == 0 || self.size <= 0 {
            return 0;
        }
        ((self.size as f64 * self.spread as f64 / 100.0).round() as i32).max(1)
    }

    /// Gaussian radius of the blur step.
    pub fn blur_radius(&self) -> f32 {
        self.size as f32 / 2.0
    }

    /// Alpha of the shadow fill before blurring.
    pub fn fill_alpha(&self) -> u8 {
        shadow_alpha(self.opacity)
    }

    pub fn color(&self) -> Rgb {
        self.color
    }
}

impl LayerEffect for ShadowEffect {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    /// Alpha coverage of the shadow: the boosted fill, blurred.
    ///
    /// Blurring the alpha alone is equivalent to blurring the filled layer,
    /// since the color is constant across it.
    fn effect_mask(&self, mask: ArrayView2<u8>) -> Mask {
        let grown = expand(mask, self.spread_pixels(), self.accel);
        let filled = scale_mask(grown.view(), self.fill_alpha());
        blur_mask(filled.view(), self.blur_radius(), self.accel)
    }

    fn layer(&self, mask: ArrayView2<u8>) -> Rgba {
        let coverage = self.effect_mask(mask);
        fill_mask(coverage.view(), self.color, 255)
    }

    fn reach(&self) -> usize {
        self.spread_pixels().max(0) as usize + kernel_half_width(self.blur_radius())
    }
}
