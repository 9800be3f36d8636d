//! WebAssembly exports for glyphfx.
//!
//! These functions are exposed to JavaScript via wasm-bindgen and work on
//! flat row-major buffers. WASM builds run the single-threaded reference
//! path unless the `parallel` feature is enabled as well.

use ndarray::{Array2, Array3};
use wasm_bindgen::prelude::*;

use crate::error::Error;
use crate::filters::{expand, Acceleration};
use crate::layer_effects::{EffectDescriptor, LayerEffect};

fn to_js(err: Error) -> JsValue {
    JsValue::from_str(&err.to_string())
}

fn mask_from_flat(data: &[u8], width: usize, height: usize) -> Result<Array2<u8>, JsValue> {
    Array2::from_shape_vec((height, width), data.to_vec())
        .map_err(|_| to_js(Error::shape(&[height * width], &[data.len()])))
}

// ============================================================================
// Primitives
// ============================================================================

/// Grow the nonzero region of a mask by `n` pixels.
///
/// # Arguments
/// * `data` - Flat mask bytes (length = width * height)
/// * `width` - Mask width in pixels
/// * `height` - Mask height in pixels
/// * `n` - Expansion radius; `n <= 0` returns the mask unchanged
#[wasm_bindgen]
pub fn expand_mask_wasm(data: &[u8], width: usize, height: usize, n: i32) -> Result<Vec<u8>, JsValue> {
    let mask = mask_from_flat(data, width, height)?;
    let result = expand(mask.view(), n, Acceleration::resolve(true));
    Ok(result.into_raw_vec_and_offset().0)
}

// ============================================================================
// Layer Effects
// ============================================================================

/// Apply one effect, given as a JSON descriptor, to an RGBA image.
///
/// # Arguments
/// * `image` - Flat RGBA bytes (length = width * height * 4)
/// * `mask` - Flat glyph mask bytes (length = width * height)
/// * `descriptor` - e.g. `{"kind": "glow", "size": 6, "spread": 40, "opacity": 80, "color": "#ffcc00"}`
///
/// # Returns
/// Flat RGBA bytes of `image` with the effect layer composited over it
#[wasm_bindgen]
pub fn apply_effect_wasm(
    image: &[u8],
    mask: &[u8],
    width: usize,
    height: usize,
    descriptor: &str,
) -> Result<Vec<u8>, JsValue> {
    let input = Array3::from_shape_vec((height, width, 4), image.to_vec())
        .map_err(|_| to_js(Error::shape(&[height * width * 4], &[image.len()])))?;
    let mask = mask_from_flat(mask, width, height)?;

    let descriptor: EffectDescriptor = serde_json::from_str(descriptor)
        .map_err(|e| to_js(Error::Descriptor(e.to_string())))?;
    let effect = descriptor.build(Acceleration::resolve(true)).map_err(to_js)?;
    let result = effect.apply(input.view(), mask.view()).map_err(to_js)?;
    Ok(result.into_raw_vec_and_offset().0)
}
