//! glyphfx: styled text rendering with layer effects
//!
//! Renders text onto raster images beneath stroke, drop shadow and outer
//! glow effects, in the manner of the layer-style dialogs of image editors.
//! Draw calls accumulate into pending layers and are composited onto the
//! background in one deferred [`TextSurface::flatten`].
//!
//! ## Image Format
//! - **Mask**: (height, width) `u8`, 0-255 coverage
//! - **RGBA**: (height, width, 4) `u8`, straight alpha
//!
//! ## Architecture
//! - [`filters`]: the two mask-transform primitives (expand, blur) with a
//!   reference and a row-parallel implementation
//! - [`layer_effects`]: the closed set of effect variants and the
//!   descriptor factory
//! - [`surface`]: the deferred compositing surface
//! - [`text`]: the font interface the surface rasterizes through
//! - [`detect`]: detector interface and overlap filtering
//!
//! Python bindings (pyo3 + numpy) and WASM bindings are available behind
//! the `python` and `wasm` features.

pub mod detect;
pub mod error;
pub mod filters;
pub mod layer_effects;
pub mod surface;
pub mod text;

#[cfg(feature = "wasm")]
pub mod wasm;

pub use error::{Error, Result};
pub use filters::{acceleration_status, Acceleration, AccelerationStatus, Mask, Rgb, Rgba};
pub use layer_effects::{create, Effect, EffectDescriptor, LayerEffect};
pub use surface::{Fill, SurfaceOptions, TextSurface};
pub use text::{Font, TextBounds};

#[cfg(feature = "fontdue")]
pub use text::FontdueFont;

// Python bindings (only when python feature is enabled)
#[cfg(feature = "python")]
mod python {
    use numpy::{IntoPyArray, PyArray2, PyArray3, PyReadonlyArray2, PyReadonlyArray3};
    use pyo3::prelude::*;

    use crate::error::Error;
    use crate::filters::{self, Acceleration};
    use crate::layer_effects::{EffectDescriptor, LayerEffect};

    /// Grow the nonzero region of a (H, W) u8 mask by `n` pixels.
    #[pyfunction]
    #[pyo3(signature = (mask, n, accelerate=true))]
    pub fn expand_mask<'py>(
        py: Python<'py>,
        mask: PyReadonlyArray2<'py, u8>,
        n: i32,
        accelerate: bool,
    ) -> Bound<'py, PyArray2<u8>> {
        let result = filters::expand(mask.as_array(), n, Acceleration::resolve(accelerate));
        result.into_pyarray(py)
    }

    /// Gaussian blur of a (H, W, C) u8 image, C in {1, 3, 4}.
    #[pyfunction]
    #[pyo3(signature = (image, radius, accelerate=true))]
    pub fn gaussian_blur<'py>(
        py: Python<'py>,
        image: PyReadonlyArray3<'py, u8>,
        radius: f32,
        accelerate: bool,
    ) -> Bound<'py, PyArray3<u8>> {
        let result = filters::gaussian_blur(image.as_array(), radius, Acceleration::resolve(accelerate));
        result.into_pyarray(py)
    }

    /// Apply one effect, given as a JSON descriptor, to an RGBA image.
    ///
    /// Example descriptor: `{"kind": "stroke", "size": 2, "opacity": 100, "color": [255, 0, 0]}`
    #[pyfunction]
    #[pyo3(signature = (image, mask, descriptor, accelerate=true))]
    pub fn apply_effect<'py>(
        py: Python<'py>,
        image: PyReadonlyArray3<'py, u8>,
        mask: PyReadonlyArray2<'py, u8>,
        descriptor: &str,
        accelerate: bool,
    ) -> PyResult<Bound<'py, PyArray3<u8>>> {
        let descriptor: EffectDescriptor =
            serde_json::from_str(descriptor).map_err(|e| Error::Descriptor(e.to_string()))?;
        let effect = descriptor.build(Acceleration::resolve(accelerate))?;
        let result = effect.apply(image.as_array(), mask.as_array())?;
        Ok(result.into_pyarray(py))
    }

    /// (available, version, expected_speedup) of the parallel path.
    #[pyfunction]
    pub fn acceleration_status() -> (bool, Option<String>, String) {
        let status = filters::acceleration_status();
        (status.available, status.version, status.expected_speedup)
    }

    /// glyphfx extension module
    #[pymodule]
    pub fn glyphfx(m: &Bound<'_, PyModule>) -> PyResult<()> {
        // Primitives
        m.add_function(wrap_pyfunction!(expand_mask, m)?)?;
        m.add_function(wrap_pyfunction!(gaussian_blur, m)?)?;

        // Layer effects
        m.add_function(wrap_pyfunction!(apply_effect, m)?)?;

        m.add_function(wrap_pyfunction!(acceleration_status, m)?)?;
        Ok(())
    }
}

#[cfg(feature = "python")]
pub use python::glyphfx;
