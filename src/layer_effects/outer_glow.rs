//! Outer Glow layer effect.
//!
//! Creates a halo around the glyph whose hard/soft balance is set by
//! `spread`:
//! - `spread == 100` - expand by `size`, no blur (fully hard)
//! - `spread == 0` - expand by `size`, then blur with radius `size` (fully soft)
//! - otherwise - a hard core expanded by `round(size * spread / 100)`,
//!   merged by per-pixel maximum with the `size`-expanded mask blurred by
//!   the remaining `size - hard` pixels
//!
//! The maximum keeps the hard core at full strength while the outer ring
//! still fades out.

use ndarray::ArrayView2;
use serde::{Deserialize, Serialize};

use super::LayerEffect;
use crate::error::{Error, Result};
use crate::filters::core::{fill_mask, kernel_half_width, max_masks, opacity_to_alpha, Mask, Rgb, Rgba};
use crate::filters::{blur_mask, expand, Acceleration};

/// Descriptor parameters for an outer glow.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GlowParams {
    pub size: i32,
    pub spread: i64,
    pub opacity: i64,
    pub color: Rgb,
    #[serde(default)]
    pub range: Option<i64>,
}

/// Halo effect around the glyph.
#[derive(Clone, Debug, PartialEq)]
pub struct OuterGlowEffect {
    size: i32,
    spread: u8,
    opacity: u8,
    color: Rgb,
    range: Option<u8>,
    accel: Acceleration,
}

impl OuterGlowEffect {
    pub const NAME: &'static str = "glow";

    /// Build a glow, validating `spread`, `opacity` and `range` against [0, 100].
    ///
    /// `range` is reserved: it is validated and stored but has no effect.
    pub fn new(
        size: i32,
        spread: i64,
        opacity: i64,
        color: Rgb,
        range: Option<i64>,
        accel: Acceleration,
    ) -> Result<Self> {
        let spread = Error::check_percent(Self::NAME, "spread", spread)?;
        let opacity = Error::check_percent(Self::NAME, "opacity", opacity)?;
        let range = range
            .map(|r| Error::check_percent(Self::NAME, "range", r))
            .transpose()?;
        Ok(Self {
            size,
            spread,
            opacity,
            color,
            range,
            accel,
        })
    }

    pub fn from_params(params: GlowParams, accel: Acceleration) -> Result<Self> {
        Self::new(
            params.size,
            params.spread,
            params.opacity,
            params.color,
            params.range,
            accel,
        )
    }

    /// Pixels of the glow that stay hard-edged.
    pub fn hard_pixels(&self) -> i32 {
        (self.size as f64 * self.spread as f64 / 100.0).round() as i32
    }

    pub fn range(&self) -> Option<u8> {
        self.range
    }

    pub fn color(&self) -> Rgb {
        self.color
    }
}

impl LayerEffect for OuterGlowEffect {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn effect_mask(&self, mask: ArrayView2<u8>) -> Mask {
        let full = expand(mask, self.size, self.accel);

        match self.spread {
            100 => full,
            0 => blur_mask(full.view(), self.size as f32, self.accel),
            _ => {
                let hard_px = self.hard_pixels();
                let hard = expand(mask, hard_px, self.accel);
                let soft_radius = self.size - hard_px;
                if soft_radius <= 0 {
                    max_masks(hard.view(), full.view())
                } else {
                    let soft = blur_mask(full.view(), soft_radius as f32, self.accel);
                    max_masks(hard.view(), soft.view())
                }
            }
        }
    }

    fn layer(&self, mask: ArrayView2<u8>) -> Rgba {
        let merged = self.effect_mask(mask);
        fill_mask(merged.view(), self.color, opacity_to_alpha(self.opacity))
    }

    fn reach(&self) -> usize {
        let size = self.size.max(0) as usize;
        let blur = if self.spread == 100 {
            0
        } else {
            kernel_half_width(self.size as f32)
        };
        size + blur
    }
}
