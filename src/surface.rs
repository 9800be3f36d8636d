//! Deferred compositing surface for styled text.
//!
//! A [`TextSurface`] owns a background image plus two accumulation layers
//! of the same size: one for effects (stroke, shadow, glow) and one for
//! glyphs. [`TextSurface::draw`] only writes into the layers; the
//! background is touched once, by [`TextSurface::flatten`].
//!
//! ```text
//! draw*  : effects = max(effects, effect layers)   glyphs = glyph over glyphs
//! flatten: background = background over effects over glyphs; layers cleared
//! reset  : layers cleared, background untouched
//! ```
//!
//! Effect layers are merged with a channel-wise maximum so that overlapping
//! glows and shadows from consecutive glyphs never build up opacity.
//!
//! Work is restricted to the glyph's bounding box padded by the furthest
//! reach of its effects. The surface tracks the union of those boxes as a
//! dirty region, and `flatten`/`reset` only visit that region.

use ndarray::{s, ArrayView2, ArrayViewMut3};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::filters::core::{
    blend_over_u8, check_rgba, composite_over, lighten, mul_u8, Mask, Region, Rgb, Rgba,
};
use crate::filters::Acceleration;
use crate::layer_effects::{Effect, EffectDescriptor, LayerEffect};
use crate::text::Font;

/// Name reported in range errors for the draw call's own opacity.
const TEXT: &str = "text";

/// Surface construction options.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SurfaceOptions {
    /// Request the parallel primitives. Silently ignored when unavailable.
    pub accelerate: bool,
}

impl Default for SurfaceOptions {
    fn default() -> Self {
        Self { accelerate: true }
    }
}

/// Glyph fill: a color with an optional alpha of its own.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fill {
    pub color: Rgb,
    #[serde(default)]
    pub alpha: Option<u8>,
}

impl Fill {
    pub fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self {
            color: Rgb(r, g, b),
            alpha: Some(a),
        }
    }

    /// Glyph alpha once the draw opacity (0-100) is applied.
    pub fn alpha_at(&self, opacity: u8) -> u8 {
        let base = self.alpha.unwrap_or(255) as u32;
        ((base * opacity.min(100) as u32 + 50) / 100) as u8
    }
}

impl From<Rgb> for Fill {
    fn from(color: Rgb) -> Self {
        Self { color, alpha: None }
    }
}

/// Background image plus pending effect and glyph layers.
pub struct TextSurface {
    background: Rgba,
    effects: Rgba,
    glyphs: Rgba,
    acceleration: Acceleration,
    dirty: Option<Region>,
}

impl TextSurface {
    /// Wrap an RGBA background of shape (height, width, 4).
    pub fn new(background: Rgba, options: SurfaceOptions) -> Result<Self> {
        check_rgba(background.shape())?;
        let dim = background.raw_dim();
        Ok(Self {
            effects: Rgba::zeros(dim.clone()),
            glyphs: Rgba::zeros(dim),
            background,
            acceleration: Acceleration::resolve(options.accelerate),
            dirty: None,
        })
    }

    /// A fully transparent surface.
    pub fn blank(width: usize, height: usize, options: SurfaceOptions) -> Self {
        let dim = (height, width, 4);
        Self {
            background: Rgba::zeros(dim),
            effects: Rgba::zeros(dim),
            glyphs: Rgba::zeros(dim),
            acceleration: Acceleration::resolve(options.accelerate),
            dirty: None,
        }
    }

    /// (width, height) in pixels.
    pub fn dimensions(&self) -> (usize, usize) {
        let (height, width, _) = self.background.dim();
        (width, height)
    }

    /// True when draws are waiting to be flattened.
    pub fn is_pending(&self) -> bool {
        self.dirty.is_some()
    }

    pub fn acceleration(&self) -> Acceleration {
        self.acceleration
    }

    /// Copy of the committed background, without pending draws.
    pub fn background(&self) -> Rgba {
        self.background.clone()
    }

    /// Render `text` and its effects into the pending layers.
    ///
    /// `position` is the top-left of the text's line box. Every descriptor
    /// is built before any layer is touched, so a failing call leaves the
    /// surface exactly as it was.
    #[tracing::instrument(level = "debug", skip(self, font, fill, effects), fields(effects = effects.len()))]
    pub fn draw(
        &mut self,
        position: (i32, i32),
        text: &str,
        font: &dyn Font,
        fill: impl Into<Fill>,
        opacity: i64,
        effects: &[EffectDescriptor],
    ) -> Result<()> {
        let fill = fill.into();
        let built = Error::check_percent(TEXT, "opacity", opacity).and_then(|opacity| {
            let effects = effects
                .iter()
                .map(|d| d.build(self.acceleration))
                .collect::<Result<Vec<Effect>>>()?;
            Ok((opacity, effects))
        });
        let (opacity, effects) = match built {
            Ok(v) => v,
            Err(e) => {
                tracing::debug!(error = %e, "draw rejected");
                return Err(e);
            }
        };

        let (width, height) = self.dimensions();
        let mut mask = Mask::zeros((height, width));
        font.rasterize(position, text, &mut mask);

        let Some(bounds) = Region::of_nonzero(mask.view()) else {
            tracing::trace!("empty glyph mask");
            return Ok(());
        };

        let reach = effects.iter().map(|e| e.reach()).max().unwrap_or(0);
        let region = bounds.padded(reach + 1, width, height);
        let mask = mask.slice(s![region.y0..region.y1, region.x0..region.x1]);

        let blank = Rgba::zeros((region.height(), region.width(), 4));
        for effect in &effects {
            tracing::trace!(effect = effect.name(), ?region, "applying effect");
            let layer = effect.apply(blank.view(), mask)?;
            lighten(slice_region(&mut self.effects, &region), layer.view())?;
        }

        draw_glyph(
            slice_region(&mut self.glyphs, &region),
            mask,
            fill.color,
            fill.alpha_at(opacity),
        );

        self.dirty = Some(match self.dirty {
            Some(d) => d.union(&region),
            None => region,
        });
        Ok(())
    }

    /// Composite the pending layers onto the background and return a copy.
    ///
    /// Order is background, then effects, then glyphs. Both layers are
    /// cleared afterwards. With nothing pending this returns the background
    /// unchanged.
    #[tracing::instrument(level = "debug", skip(self))]
    pub fn flatten(&mut self) -> Rgba {
        if let Some(region) = self.dirty.take() {
            tracing::debug!(?region, "flattening pending layers");
            for layer in [&self.effects, &self.glyphs] {
                let src = layer.slice(s![region.y0..region.y1, region.x0..region.x1, ..]);
                // All three rasters share one shape, so this cannot fail.
                if let Err(e) = composite_over(slice_region(&mut self.background, &region), src) {
                    tracing::error!(error = %e, "layer composite failed");
                }
            }
            self.clear_layers(&region);
        }
        self.background.clone()
    }

    /// Discard pending draws without touching the background.
    #[tracing::instrument(level = "debug", skip(self))]
    pub fn reset(&mut self) {
        if let Some(region) = self.dirty.take() {
            self.clear_layers(&region);
        }
    }

    fn clear_layers(&mut self, region: &Region) {
        slice_region(&mut self.effects, region).fill(0);
        slice_region(&mut self.glyphs, region).fill(0);
    }
}

fn slice_region<'a>(layer: &'a mut Rgba, region: &Region) -> ArrayViewMut3<'a, u8> {
    layer.slice_mut(s![region.y0..region.y1, region.x0..region.x1, ..])
}

/// Draw `color` over `target` wherever `mask` has coverage.
fn draw_glyph(mut target: ArrayViewMut3<u8>, mask: ArrayView2<u8>, color: Rgb, alpha: u8) {
    if alpha == 0 {
        return;
    }
    for ((y, x), &m) in mask.indexed_iter() {
        let a = mul_u8(m, alpha);
        if a == 0 {
            continue;
        }
        let mut px = [
            target[[y, x, 0]],
            target[[y, x, 1]],
            target[[y, x, 2]],
            target[[y, x, 3]],
        ];
        blend_over_u8(&mut px, color.0, color.1, color.2, a);
        for (c, v) in px.into_iter().enumerate() {
            target[[y, x, c]] = v;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::text::testing::BlockFont;
    use serde_json::json;

    const REFERENCE: SurfaceOptions = SurfaceOptions { accelerate: false };

    fn red_stroke() -> EffectDescriptor {
        EffectDescriptor::stroke(2, 100, Rgb(255, 0, 0))
    }

    fn px(image: &Rgba, x: usize, y: usize) -> [u8; 4] {
        [
            image[[y, x, 0]],
            image[[y, x, 1]],
            image[[y, x, 2]],
            image[[y, x, 3]],
        ]
    }

    fn checkerboard(width: usize, height: usize) -> Rgba {
        let mut bg = Rgba::zeros((height, width, 4));
        for ((y, x, c), v) in bg.indexed_iter_mut() {
            *v = match c {
                3 => 255,
                _ if (x / 4 + y / 4) % 2 == 0 => 230,
                _ => (40 + c * 30) as u8,
            };
        }
        bg
    }

    #[test]
    fn test_stroke_scenario() {
        let font = BlockFont::new(20, 30);
        for options in [REFERENCE, SurfaceOptions::default()] {
            let mut surface = TextSurface::blank(100, 100, options);
            surface
                .draw((10, 10), "A", &font, Rgb::BLACK, 100, &[red_stroke()])
                .unwrap();
            let out = surface.flatten();

            // Glyph footprint is x 10..30, y 10..40.
            assert_eq!(px(&out, 10, 10), [0, 0, 0, 255]);
            assert_eq!(px(&out, 29, 39), [0, 0, 0, 255]);
            for (x, y) in [(8, 20), (9, 20), (30, 20), (31, 20), (20, 8), (20, 41)] {
                assert_eq!(px(&out, x, y), [255, 0, 0, 255], "({x}, {y})");
            }
            assert_eq!(px(&out, 7, 20), [0, 0, 0, 0]);
            assert_eq!(px(&out, 20, 42), [0, 0, 0, 0]);
            assert_eq!(px(&out, 60, 60), [0, 0, 0, 0]);
        }
    }

    #[test]
    fn test_stroke_scenario_with_antialiased_glyph() {
        let font = BlockFont::antialiased(20, 30);
        for options in [REFERENCE, SurfaceOptions::default()] {
            let mut surface = TextSurface::blank(100, 100, options);
            surface
                .draw((10, 10), "A", &font, Rgb::BLACK, 100, &[red_stroke()])
                .unwrap();
            let out = surface.flatten();

            // The ring beyond the half-covered border is still solid red.
            for (x, y) in [(8, 20), (9, 20), (30, 20), (31, 20), (20, 8), (20, 9), (20, 40), (20, 41)] {
                assert_eq!(px(&out, x, y), [255, 0, 0, 255], "({x}, {y})");
            }
            assert_eq!(px(&out, 7, 20), [0, 0, 0, 0]);

            // Half-covered glyph border blends black over the opaque stroke.
            let edge = px(&out, 10, 20);
            assert_eq!(edge[3], 255);
            assert!((126..=128).contains(&edge[0]), "{edge:?}");
            assert_eq!(&edge[1..3], &[0, 0]);
            assert_eq!(px(&out, 20, 20), [0, 0, 0, 255]);
        }
    }

    #[test]
    fn test_draw_defers_compositing() {
        let font = BlockFont::new(4, 4);
        let bg = checkerboard(20, 20);
        let mut surface = TextSurface::new(bg.clone(), REFERENCE).unwrap();

        assert!(!surface.is_pending());
        surface
            .draw((5, 5), "x", &font, Rgb::WHITE, 100, &[red_stroke()])
            .unwrap();
        assert!(surface.is_pending());
        assert_eq!(surface.background(), bg);

        let out = surface.flatten();
        assert!(!surface.is_pending());
        assert_ne!(out, bg);
        assert_eq!(surface.background(), out);
    }

    #[test]
    fn test_reset_discards_pending() {
        let font = BlockFont::new(6, 8);
        let bg = checkerboard(32, 24);

        let mut drawn = TextSurface::new(bg.clone(), REFERENCE).unwrap();
        drawn
            .draw((3, 4), "ab", &font, Rgb(0, 0, 255), 80, &[red_stroke()])
            .unwrap();
        drawn.reset();
        assert!(!drawn.is_pending());

        let mut untouched = TextSurface::new(bg.clone(), REFERENCE).unwrap();
        assert_eq!(drawn.flatten(), untouched.flatten());
        assert_eq!(drawn.flatten(), bg);
    }

    #[test]
    fn test_flatten_is_idempotent() {
        let font = BlockFont::new(5, 5);
        let mut surface = TextSurface::new(checkerboard(20, 20), REFERENCE).unwrap();
        surface
            .draw((2, 2), "ab", &font, Rgb(10, 200, 10), 100, &[EffectDescriptor::glow(3, 0, 60, Rgb::WHITE)])
            .unwrap();

        let first = surface.flatten();
        let second = surface.flatten();
        assert_eq!(first, second);
    }

    #[test]
    fn test_failed_draw_leaves_layers_untouched() {
        let font = BlockFont::new(5, 5);
        let bg = checkerboard(24, 24);
        let mut surface = TextSurface::new(bg, REFERENCE).unwrap();
        surface
            .draw((2, 2), "a", &font, Rgb::BLACK, 100, &[red_stroke()])
            .unwrap();
        let mut expected = TextSurface::new(checkerboard(24, 24), REFERENCE).unwrap();
        expected
            .draw((2, 2), "a", &font, Rgb::BLACK, 100, &[red_stroke()])
            .unwrap();

        // The valid stroke listed first must not leak into the layers.
        let err = surface
            .draw(
                (12, 12),
                "b",
                &font,
                Rgb::BLACK,
                100,
                &[red_stroke(), EffectDescriptor::new("sparkle", json!({}))],
            )
            .unwrap_err();
        assert!(matches!(err, Error::UnknownEffect { ref kind, .. } if kind == "sparkle"));

        let err = surface
            .draw((12, 12), "b", &font, Rgb::BLACK, 120, &[red_stroke()])
            .unwrap_err();
        assert!(matches!(err, Error::Range { effect: "text", param: "opacity", .. }));

        assert_eq!(surface.flatten(), expected.flatten());
    }

    #[test]
    fn test_empty_mask_is_a_validated_no_op() {
        let font = BlockFont::new(5, 5);
        let mut surface = TextSurface::blank(10, 10, REFERENCE);

        surface.draw((1, 1), "  ", &font, Rgb::BLACK, 100, &[red_stroke()]).unwrap();
        assert!(!surface.is_pending());

        let bad = EffectDescriptor::stroke(2, 100, Rgb::BLACK).with_param("opacity", 300);
        assert!(surface.draw((1, 1), " ", &font, Rgb::BLACK, 100, &[bad]).is_err());

        // Entirely off-surface text rasterizes to nothing.
        surface.draw((50, 50), "a", &font, Rgb::BLACK, 100, &[]).unwrap();
        assert!(!surface.is_pending());
    }

    #[test]
    fn test_regional_processing_matches_full_frame() {
        let font = BlockFont::new(6, 9);
        let (width, height) = (48, 40);
        let bg = checkerboard(width, height);
        let descriptors = [
            EffectDescriptor::shadow(6, 30, 40, Rgb(20, 20, 60)),
            EffectDescriptor::glow(5, 50, 70, Rgb(255, 220, 0)),
        ];
        // Near the left edge so the padded region clamps.
        let position = (1, 12);

        let mut surface = TextSurface::new(bg.clone(), REFERENCE).unwrap();
        surface
            .draw(position, "ab", &font, Fill::rgba(0, 0, 0, 200), 90, &descriptors)
            .unwrap();
        let regional = surface.flatten();

        let mut mask = Mask::zeros((height, width));
        font.rasterize(position, "ab", &mut mask);
        let blank = Rgba::zeros((height, width, 4));
        let mut effects = Rgba::zeros((height, width, 4));
        for d in &descriptors {
            let layer = d
                .build(Acceleration::Reference)
                .unwrap()
                .apply(blank.view(), mask.view())
                .unwrap();
            lighten(effects.view_mut(), layer.view()).unwrap();
        }
        let mut glyphs = Rgba::zeros((height, width, 4));
        draw_glyph(glyphs.view_mut(), mask.view(), Rgb::BLACK, Fill::rgba(0, 0, 0, 200).alpha_at(90));

        let mut full = bg;
        composite_over(full.view_mut(), effects.view()).unwrap();
        composite_over(full.view_mut(), glyphs.view()).unwrap();

        assert_eq!(regional, full);
    }

    #[test]
    fn test_overlapping_effects_do_not_compound() {
        let font = BlockFont::new(4, 4);
        let glow = [EffectDescriptor::glow(3, 0, 50, Rgb::WHITE)];

        let mut once = TextSurface::blank(30, 20, REFERENCE);
        once.draw((8, 8), "a", &font, Rgb::BLACK, 0, &glow).unwrap();

        let mut twice = TextSurface::blank(30, 20, REFERENCE);
        twice.draw((8, 8), "a", &font, Rgb::BLACK, 0, &glow).unwrap();
        twice.draw((8, 8), "a", &font, Rgb::BLACK, 0, &glow).unwrap();

        assert_eq!(once.flatten(), twice.flatten());
    }

    #[test]
    fn test_fill_alpha_scales_with_opacity() {
        assert_eq!(Fill::from(Rgb::BLACK).alpha_at(100), 255);
        assert_eq!(Fill::from(Rgb::BLACK).alpha_at(50), 128);
        assert_eq!(Fill::rgba(0, 0, 0, 200).alpha_at(50), 100);
        assert_eq!(Fill::rgba(0, 0, 0, 128).alpha_at(0), 0);

        let font = BlockFont::new(3, 3);
        let mut surface = TextSurface::blank(8, 8, REFERENCE);
        surface
            .draw((2, 2), "a", &font, Fill::rgba(10, 20, 30, 200), 50, &[])
            .unwrap();
        assert_eq!(px(&surface.flatten(), 3, 3), [10, 20, 30, 100]);
    }

    #[test]
    fn test_later_glyphs_draw_over_earlier_ones() {
        let font = BlockFont::new(4, 4);
        let mut surface = TextSurface::blank(12, 12, REFERENCE);
        surface.draw((2, 2), "a", &font, Rgb(255, 0, 0), 100, &[]).unwrap();
        surface.draw((4, 4), "a", &font, Rgb(0, 0, 255), 100, &[]).unwrap();

        let out = surface.flatten();
        assert_eq!(px(&out, 2, 2), [255, 0, 0, 255]);
        assert_eq!(px(&out, 5, 5), [0, 0, 255, 255]);
    }

    #[test]
    fn test_constructors() {
        let surface = TextSurface::blank(7, 3, SurfaceOptions::default());
        assert_eq!(surface.dimensions(), (7, 3));
        assert_eq!(surface.acceleration(), Acceleration::resolve(true));
        assert_eq!(TextSurface::blank(7, 3, REFERENCE).acceleration(), Acceleration::Reference);

        let err = TextSurface::new(ndarray::Array3::zeros((4, 4, 3)), REFERENCE).err();
        assert!(matches!(err, Some(Error::Shape { .. })));
    }

    #[test]
    fn test_options_deserialize_with_defaults() {
        let options: SurfaceOptions = serde_json::from_str("{}").unwrap();
        assert!(options.accelerate);
        let options: SurfaceOptions = serde_json::from_str(r#"{"accelerate": false}"#).unwrap();
        assert_eq!(options, REFERENCE);
    }
}
