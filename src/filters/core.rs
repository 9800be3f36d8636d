//! Core raster utilities shared by the primitives, effects and surface.
//!
//! This module provides:
//! - The `Mask` / `Rgba` raster aliases
//! - Gaussian kernel generation
//! - Mask fill/scale/merge helpers
//! - Porter-Duff "over" and brighten-merge compositing
//! - Rectangular regions used for cropped processing

use ndarray::{Array2, Array3, ArrayView2, ArrayView3, ArrayViewMut3, Zip};
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{Error, Result};

/// Single-channel 8-bit intensity mask, shape (height, width).
pub type Mask = Array2<u8>;

/// Four-channel straight-alpha raster, shape (height, width, 4).
pub type Rgba = Array3<u8>;

/// An RGB color triple.
///
/// Deserializes from `[r, g, b]` or `"#rrggbb"`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    pub const BLACK: Rgb = Rgb(0, 0, 0);
    pub const WHITE: Rgb = Rgb(255, 255, 255);

    /// Parse `#rrggbb` (the leading `#` is optional).
    pub fn from_hex(s: &str) -> Option<Rgb> {
        let hex = s.strip_prefix('#').unwrap_or(s);
        if hex.len() != 6 || !hex.is_ascii() {
            return None;
        }
        let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
        Some(Rgb(channel(0)?, channel(2)?, channel(4)?))
    }
}

impl From<(u8, u8, u8)> for Rgb {
    fn from((r, g, b): (u8, u8, u8)) -> Self {
        Rgb(r, g, b)
    }
}

impl<'de> Deserialize<'de> for Rgb {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Triple(u8, u8, u8),
            Hex(String),
        }

        match Repr::deserialize(deserializer) {
            Ok(Repr::Triple(r, g, b)) => Ok(Rgb(r, g, b)),
            Ok(Repr::Hex(s)) => Rgb::from_hex(&s)
                .ok_or_else(|| serde::de::Error::custom(format!("invalid hex color `{s}`"))),
            Err(_) => Err(serde::de::Error::custom(
                "color must be an [r, g, b] triple of 0-255 integers or a \"#rrggbb\" string",
            )),
        }
    }
}

/// Convert a 0-100 opacity percentage to an 8-bit alpha, rounding half up.
#[inline]
pub fn opacity_to_alpha(opacity: u8) -> u8 {
    ((opacity.min(100) as u32 * 255 + 50) / 100) as u8
}

/// Scale an 8-bit value by an 8-bit factor (`v * f / 255`, rounded).
#[inline]
pub fn mul_u8(v: u8, f: u8) -> u8 {
    ((v as u32 * f as u32 + 127) / 255) as u8
}

/// Generate a normalized 1D Gaussian kernel.
///
/// The blur radius is used as sigma. The kernel extends `ceil(3 * radius)`
/// pixels either side of the centre, so its length is always odd.
pub fn gaussian_kernel_1d(radius: f32) -> Vec<f32> {
    if !(radius > 0.0) || !radius.is_finite() {
        return vec![1.0];
    }

    let half = kernel_half_width(radius);
    let sigma = radius;

    let mut kernel: Vec<f32> = (0..2 * half + 1)
        .map(|i| {
            let x = i as f32 - half as f32;
            (-x * x / (2.0 * sigma * sigma)).exp()
        })
        .collect();

    let sum: f32 = kernel.iter().sum();
    for v in kernel.iter_mut() {
        *v /= sum;
    }

    kernel
}

/// Number of pixels a Gaussian of `radius` reaches either side of a pixel.
#[inline]
pub fn kernel_half_width(radius: f32) -> usize {
    if !(radius > 0.0) || !radius.is_finite() {
        0
    } else {
        (radius * 3.0).ceil() as usize
    }
}

/// Scale every mask value by `alpha / 255`.
pub fn scale_mask(mask: ArrayView2<u8>, alpha: u8) -> Mask {
    match alpha {
        255 => mask.to_owned(),
        0 => Mask::zeros(mask.raw_dim()),
        a => mask.mapv(|v| mul_u8(v, a)),
    }
}

/// Per-pixel maximum of two masks of equal shape.
pub fn max_masks(a: ArrayView2<u8>, b: ArrayView2<u8>) -> Mask {
    Zip::from(a).and(b).map_collect(|&x, &y| x.max(y))
}

/// Fill a mask with `color`, using `mask * alpha / 255` as the alpha channel.
pub fn fill_mask(mask: ArrayView2<u8>, color: Rgb, alpha: u8) -> Rgba {
    let (height, width) = mask.dim();
    let mut layer = Rgba::zeros((height, width, 4));

    for ((y, x), &m) in mask.indexed_iter() {
        let a = mul_u8(m, alpha);
        if a == 0 {
            continue;
        }
        layer[[y, x, 0]] = color.0;
        layer[[y, x, 1]] = color.1;
        layer[[y, x, 2]] = color.2;
        layer[[y, x, 3]] = a;
    }

    layer
}

/// Blend a straight-alpha color onto an existing pixel.
///
/// Uses Porter-Duff "over" compositing.
#[inline]
pub fn blend_over_u8(dst: &mut [u8], src_r: u8, src_g: u8, src_b: u8, src_a: u8) {
    if src_a == 0 {
        return;
    }
    if src_a == 255 {
        dst[0] = src_r;
        dst[1] = src_g;
        dst[2] = src_b;
        dst[3] = 255;
        return;
    }

    let src_af = src_a as f32 / 255.0;
    let dst_af = dst[3] as f32 / 255.0;
    let out_a = src_af + dst_af * (1.0 - src_af);

    if out_a > 0.0 {
        let mix = |s: u8, d: u8| {
            ((s as f32 * src_af + d as f32 * dst_af * (1.0 - src_af)) / out_a)
                .round()
                .clamp(0.0, 255.0) as u8
        };
        dst[0] = mix(src_r, dst[0]);
        dst[1] = mix(src_g, dst[1]);
        dst[2] = mix(src_b, dst[2]);
        dst[3] = (out_a * 255.0).round().clamp(0.0, 255.0) as u8;
    }
}

/// Composite `src` over `dst` in place (straight alpha).
pub fn composite_over(mut dst: ArrayViewMut3<u8>, src: ArrayView3<u8>) -> Result<()> {
    check_same_shape(dst.shape(), src.shape())?;
    check_rgba(src.shape())?;

    Zip::from(dst.rows_mut()).and(src.rows()).for_each(|mut d, s| {
        if s[3] == 0 {
            return;
        }
        let mut px = [d[0], d[1], d[2], d[3]];
        blend_over_u8(&mut px, s[0], s[1], s[2], s[3]);
        for c in 0..4 {
            d[c] = px[c];
        }
    });

    Ok(())
}

/// Brighten-merge `src` into `dst`: channel-wise maximum.
///
/// Unlike "over", repeated merges of overlapping contributions never
/// accumulate opacity beyond the strongest single contribution.
pub fn lighten(mut dst: ArrayViewMut3<u8>, src: ArrayView3<u8>) -> Result<()> {
    check_same_shape(dst.shape(), src.shape())?;
    Zip::from(&mut dst).and(&src).for_each(|d, &s| *d = (*d).max(s));
    Ok(())
}

fn check_same_shape(expected: &[usize], actual: &[usize]) -> Result<()> {
    if expected != actual {
        return Err(Error::shape(expected, actual));
    }
    Ok(())
}

/// Require a (height, width, 4) shape.
pub(crate) fn check_rgba(shape: &[usize]) -> Result<()> {
    if shape.len() != 3 || shape[2] != 4 {
        let expected = [shape.first().copied().unwrap_or(0), shape.get(1).copied().unwrap_or(0), 4];
        return Err(Error::shape(&expected, shape));
    }
    Ok(())
}

/// Require a mask whose (height, width) matches an RGBA image.
pub(crate) fn check_mask_matches(image: &[usize], mask: &[usize]) -> Result<()> {
    check_rgba(image)?;
    check_same_shape(&image[..2], mask)
}

/// Build a mask from a row-major buffer produced with the mask's own shape.
///
/// Callers allocate `data` as `height * width` and only write through
/// `height` row chunks of `width`, so the shape always matches.
pub(crate) fn mask_from_vec(height: usize, width: usize, data: Vec<u8>) -> Mask {
    Mask::from_shape_vec((height, width), data).expect("Shape mismatch in mask buffer")
}

/// Half-open pixel rectangle `[x0, x1) x [y0, y1)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Region {
    pub x0: usize,
    pub y0: usize,
    pub x1: usize,
    pub y1: usize,
}

impl Region {
    /// The whole of a `width` x `height` raster.
    pub fn full(width: usize, height: usize) -> Self {
        Region { x0: 0, y0: 0, x1: width, y1: height }
    }

    pub fn width(&self) -> usize {
        self.x1 - self.x0
    }

    pub fn height(&self) -> usize {
        self.y1 - self.y0
    }

    pub fn is_empty(&self) -> bool {
        self.x1 <= self.x0 || self.y1 <= self.y0
    }

    /// Bounding box of the nonzero pixels of `mask`, if any.
    pub fn of_nonzero(mask: ArrayView2<u8>) -> Option<Self> {
        let mut bounds: Option<Region> = None;
        for ((y, x), &v) in mask.indexed_iter() {
            if v == 0 {
                continue;
            }
            let px = Region { x0: x, y0: y, x1: x + 1, y1: y + 1 };
            bounds = Some(match bounds {
                Some(b) => b.union(&px),
                None => px,
            });
        }
        bounds
    }

    /// Smallest region covering both.
    pub fn union(&self, other: &Region) -> Region {
        Region {
            x0: self.x0.min(other.x0),
            y0: self.y0.min(other.y0),
            x1: self.x1.max(other.x1),
            y1: self.y1.max(other.y1),
        }
    }

    /// Grow by `margin` on every side, clamped to a `width` x `height` raster.
    pub fn padded(&self, margin: usize, width: usize, height: usize) -> Region {
        Region {
            x0: self.x0.saturating_sub(margin),
            y0: self.y0.saturating_sub(margin),
            x1: self.x1.saturating_add(margin).min(width),
            y1: self.y1.saturating_add(margin).min(height),
        }
    }
}
