//! Stroke/outline layer effect.
//!
//! Creates a hard-edged outline by:
//! 1. Expanding the glyph mask by `size` pixels (no blur)
//! 2. Flooding the expanded region with the stroke color at one constant
//!    alpha, so anti-aliased glyph edges still get a solid outline
//!
//! The glyph layer is drawn on top, so only the ring outside the glyph
//! stays visible. With `size <= 0` the stroke covers exactly the glyph
//! footprint and only tints it.

use ndarray::ArrayView2;
use serde::{Deserialize, Serialize};

use super::LayerEffect;
use crate::error::{Error, Result};
use crate::filters::core::{fill_mask, opacity_to_alpha, Mask, Rgb, Rgba};
use crate::filters::{expand, Acceleration};

/// Descriptor parameters for a stroke.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StrokeParams {
    pub size: i32,
    pub opacity: i64,
    pub color: Rgb,
}

/// Hard outline effect.
#[derive(Clone, Debug, PartialEq)]
pub struct StrokeEffect {
    size: i32,
    opacity: u8,
    color: Rgb,
    accel: Acceleration,
}

impl StrokeEffect {
    pub const NAME: &'static str = "stroke";

    /// Build a stroke, validating `opacity` against [0, 100].
    pub fn new(size: i32, opacity: i64, color: Rgb, accel: Acceleration) -> Result<Self> {
        let opacity = Error::check_percent(Self::NAME, "opacity", opacity)?;
        Ok(Self {
            size,
            opacity,
            color,
            accel,
        })
    }

    pub fn from_params(params: StrokeParams, accel: Acceleration) -> Result<Self> {
        Self::new(params.size, params.opacity, params.color, accel)
    }

    pub fn size(&self) -> i32 {
        self.size
    }

    pub fn opacity(&self) -> u8 {
        self.opacity
    }

    pub fn color(&self) -> Rgb {
        self.color
    }
}

impl LayerEffect for StrokeEffect {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn effect_mask(&self, mask: ArrayView2<u8>) -> Mask {
        expand(mask, self.size, self.accel)
    }

    /// Every covered pixel gets the same alpha, however faint its coverage.
    fn layer(&self, mask: ArrayView2<u8>) -> Rgba {
        let region = self.effect_mask(mask).mapv_into(|v| if v > 0 { 255 } else { 0 });
        fill_mask(region.view(), self.color, opacity_to_alpha(self.opacity))
    }

    fn reach(&self) -> usize {
        self.size.max(0) as usize
    }
}
