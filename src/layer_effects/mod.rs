//! Layer effects for styled text (Photoshop-style layer styles).
//!
//! Every effect consumes a glyph mask and produces an RGBA effect layer:
//!
//! - **Stroke** - hard outline, the mask expanded by `size` (`stroke.rs`)
//! - **Drop Shadow** - spread-expanded, blurred silhouette (`drop_shadow.rs`)
//! - **Outer Glow** - halo mixing a hard core and a soft falloff (`outer_glow.rs`)
//!
//! The set is closed: [`Effect`] is a tagged union of the three variants and
//! [`factory::create`] maps a declarative [`EffectDescriptor`] to one of
//! them. Instances are cheap and are built fresh for every draw call.
//!
//! ## Layer Effects vs Filters
//!
//! Layer effects differ from filters in that they:
//! - Work only from the glyph mask, never from the color of the glyph
//! - Produce a separate layer that sits beneath the glyph
//! - Validate their parameters once, at construction

use ndarray::{ArrayView2, ArrayView3};

use crate::error::Result;
use crate::filters::core::{check_mask_matches, composite_over, Mask, Rgba};

pub mod drop_shadow;
pub mod factory;
pub mod outer_glow;
pub mod stroke;

pub use drop_shadow::{ShadowEffect, ShadowParams};
pub use factory::{create, EffectDescriptor, EFFECT_KINDS};
pub use outer_glow::{GlowParams, OuterGlowEffect};
pub use stroke::{StrokeEffect, StrokeParams};

/// Common behaviour of the effect variants.
pub trait LayerEffect {
    /// Registered name of the variant.
    fn name(&self) -> &'static str;

    /// Effect coverage derived from the glyph mask, before coloring.
    fn effect_mask(&self, mask: ArrayView2<u8>) -> Mask;

    /// The colored effect layer for `mask`.
    fn layer(&self, mask: ArrayView2<u8>) -> Rgba;

    /// How far, in pixels, the layer can reach beyond the mask's nonzero region.
    fn reach(&self) -> usize;

    /// Composite this effect for `mask` onto `image`, returning the result.
    fn apply(&self, image: ArrayView3<u8>, mask: ArrayView2<u8>) -> Result<Rgba> {
        check_mask_matches(image.shape(), mask.shape())?;
        let layer = self.layer(mask);
        let mut out = image.to_owned();
        composite_over(out.view_mut(), layer.view())?;
        Ok(out)
    }
}

/// Kind tag of an [`Effect`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EffectKind {
    Stroke,
    Shadow,
    Glow,
}

impl EffectKind {
    pub fn as_str(self) -> &'static str {
        match self {
            EffectKind::Stroke => "stroke",
            EffectKind::Shadow => "shadow",
            EffectKind::Glow => "glow",
        }
    }
}

/// One constructed effect.
#[derive(Clone, Debug, PartialEq)]
pub enum Effect {
    Stroke(StrokeEffect),
    Shadow(ShadowEffect),
    Glow(OuterGlowEffect),
}

impl Effect {
    pub fn kind(&self) -> EffectKind {
        match self {
            Effect::Stroke(_) => EffectKind::Stroke,
            Effect::Shadow(_) => EffectKind::Shadow,
            Effect::Glow(_) => EffectKind::Glow,
        }
    }
}

/// Forward a call to whichever variant `$effect` holds.
macro_rules! dispatch {
    ($effect:expr, $e:ident => $call:expr) => {
        match $effect {
            Effect::Stroke($e) => $call,
            Effect::Shadow($e) => $call,
            Effect::Glow($e) => $call,
        }
    };
}

impl LayerEffect for Effect {
    fn name(&self) -> &'static str {
        self.kind().as_str()
    }

    fn effect_mask(&self, mask: ArrayView2<u8>) -> Mask {
        dispatch!(self, e => e.effect_mask(mask))
    }

    fn layer(&self, mask: ArrayView2<u8>) -> Rgba {
        dispatch!(self, e => e.layer(mask))
    }

    fn reach(&self) -> usize {
        dispatch!(self, e => e.reach())
    }
}

impl From<StrokeEffect> for Effect {
    fn from(e: StrokeEffect) -> Self {
        Effect::Stroke(e)
    }
}

impl From<ShadowEffect> for Effect {
    fn from(e: ShadowEffect) -> Self {
        Effect::Shadow(e)
    }
}

impl From<OuterGlowEffect> for Effect {
    fn from(e: OuterGlowEffect) -> Self {
        Effect::Glow(e)
    }
}
