//! Glyph rasterization interface.
//!
//! The compositing surface only needs two capabilities from a font:
//! measuring a string and writing its coverage into a mask. Font loading
//! and shaping belong to the implementor. A `fontdue`-backed
//! implementation is provided behind the `fontdue` feature.

use crate::filters::core::Mask;

/// Pixel bounding box of rendered text, relative to the draw position.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TextBounds {
    pub left: i32,
    pub top: i32,
    pub width: u32,
    pub height: u32,
}

/// A font able to rasterize text into a coverage mask.
pub trait Font {
    /// Bounding box `text` would cover when drawn at (0, 0).
    fn measure(&self, text: &str) -> TextBounds;

    /// Write the coverage of `text` drawn with its line box's top-left at
    /// `position` (x, y) into `target`.
    ///
    /// Coverage is max-combined with existing values and clipped at the
    /// target's edges.
    fn rasterize(&self, position: (i32, i32), text: &str, target: &mut Mask);
}

/// Max-combine a `width` x `height` coverage bitmap into `target` at (x, y).
pub fn blit_coverage(target: &mut Mask, x: i32, y: i32, width: usize, height: usize, coverage: &[u8]) {
    let (th, tw) = target.dim();
    for gy in 0..height {
        let ty = y + gy as i32;
        if ty < 0 || ty >= th as i32 {
            continue;
        }
        for gx in 0..width {
            let tx = x + gx as i32;
            if tx < 0 || tx >= tw as i32 {
                continue;
            }
            let v = coverage[gy * width + gx];
            let dst = &mut target[[ty as usize, tx as usize]];
            *dst = (*dst).max(v);
        }
    }
}

#[cfg(feature = "fontdue")]
pub use self::fontdue_font::FontdueFont;

#[cfg(feature = "fontdue")]
mod fontdue_font {
    use fontdue::layout::{CoordinateSystem, GlyphPosition, Layout, LayoutSettings, TextStyle};

    use super::{blit_coverage, Font, TextBounds};
    use crate::error::{Error, Result};
    use crate::filters::core::Mask;

    /// A TrueType/OpenType font rendered at a fixed pixel size.
    pub struct FontdueFont {
        font: fontdue::Font,
        px: f32,
    }

    impl FontdueFont {
        /// Parse a font from raw bytes.
        pub fn from_bytes(bytes: &[u8], px: f32) -> Result<Self> {
            let font = fontdue::Font::from_bytes(bytes, fontdue::FontSettings::default())
                .map_err(|e| Error::Font(e.to_string()))?;
            Ok(Self { font, px })
        }

        pub fn px(&self) -> f32 {
            self.px
        }

        fn layout(&self, x: f32, y: f32, text: &str) -> Vec<GlyphPosition> {
            let mut layout: Layout<()> = Layout::new(CoordinateSystem::PositiveYDown);
            layout.reset(&LayoutSettings {
                x,
                y,
                ..LayoutSettings::default()
            });
            layout.append(&[&self.font], &TextStyle::new(text, self.px, 0));
            layout
                .glyphs()
                .iter()
                .filter(|g| g.char_data.rasterize() && g.width > 0 && g.height > 0)
                .copied()
                .collect()
        }
    }

    impl Font for FontdueFont {
        fn measure(&self, text: &str) -> TextBounds {
            let glyphs = self.layout(0.0, 0.0, text);
            if glyphs.is_empty() {
                return TextBounds::default();
            }

            let left = glyphs.iter().map(|g| g.x.round() as i32).min().unwrap_or(0);
            let top = glyphs.iter().map(|g| g.y.round() as i32).min().unwrap_or(0);
            let right = glyphs
                .iter()
                .map(|g| g.x.round() as i32 + g.width as i32)
                .max()
                .unwrap_or(left);
            let bottom = glyphs
                .iter()
                .map(|g| g.y.round() as i32 + g.height as i32)
                .max()
                .unwrap_or(top);

            TextBounds {
                left,
                top,
                width: (right - left) as u32,
                height: (bottom - top) as u32,
            }
        }

        fn rasterize(&self, position: (i32, i32), text: &str, target: &mut Mask) {
            for g in self.layout(position.0 as f32, position.1 as f32, text) {
                let (metrics, bitmap) = self.font.rasterize_config(g.key);
                if metrics.width == 0 || metrics.height == 0 {
                    continue;
                }
                blit_coverage(
                    target,
                    g.x.round() as i32,
                    g.y.round() as i32,
                    metrics.width,
                    metrics.height,
                    &bitmap,
                );
            }
        }
    }

}

/// Deterministic block font used by tests: every non-space character is a
/// `cell_w` x `cell_h` rectangle followed by `gap` pixels of spacing. The
/// outermost ring of each cell has coverage `edge`, the rest is solid.
#[cfg(test)]
pub(crate) mod testing {
    use super::{blit_coverage, Font, TextBounds};
    use crate::filters::core::Mask;

    pub(crate) struct BlockFont {
        pub cell_w: usize,
        pub cell_h: usize,
        pub gap: usize,
        pub edge: u8,
    }

    impl BlockFont {
        pub(crate) fn new(cell_w: usize, cell_h: usize) -> Self {
            Self { cell_w, cell_h, gap: 1, edge: 255 }
        }

        /// Cells with a half-covered border, like an anti-aliased glyph.
        pub(crate) fn antialiased(cell_w: usize, cell_h: usize) -> Self {
            Self { edge: 128, ..Self::new(cell_w, cell_h) }
        }

        fn cell(&self) -> Vec<u8> {
            let (w, h) = (self.cell_w, self.cell_h);
            (0..w * h)
                .map(|i| {
                    let (x, y) = (i % w, i / w);
                    if x == 0 || y == 0 || x + 1 == w || y + 1 == h {
                        self.edge
                    } else {
                        255
                    }
                })
                .collect()
        }
    }

    impl Font for BlockFont {
        fn measure(&self, text: &str) -> TextBounds {
            let n = text.chars().count();
            if n == 0 {
                return TextBounds::default();
            }
            TextBounds {
                left: 0,
                top: 0,
                width: (n * self.cell_w + (n - 1) * self.gap) as u32,
                height: self.cell_h as u32,
            }
        }

        fn rasterize(&self, position: (i32, i32), text: &str, target: &mut Mask) {
            let cell = self.cell();
            for (i, ch) in text.chars().enumerate() {
                if ch.is_whitespace() {
                    continue;
                }
                let x = position.0 + (i * (self.cell_w + self.gap)) as i32;
                blit_coverage(target, x, position.1, self.cell_w, self.cell_h, &cell);
            }
        }
    }
}
