//! Error taxonomy shared by effects, the factory and the compositing surface.

/// Convenience result type used across glyphfx.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while building effects or drawing text.
///
/// Every variant is raised at construction time. Nothing in the raster
/// pipeline itself can fail once an effect has been built.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// Descriptor named an effect kind that is not registered.
    #[error("unknown effect kind `{kind}` (valid kinds: {})", .valid.join(", "))]
    UnknownEffect {
        kind: String,
        valid: Vec<&'static str>,
    },

    /// A required parameter is missing or has the wrong type.
    #[error("invalid parameters for `{effect}` effect: {cause}")]
    Parameter { effect: &'static str, cause: String },

    /// A percentage parameter is outside its allowed range.
    #[error("`{effect}` parameter `{param}` = {value} is outside [{min}, {max}]")]
    Range {
        effect: &'static str,
        param: &'static str,
        value: i64,
        min: i64,
        max: i64,
    },

    /// Raster dimensions disagree.
    #[error("shape mismatch: expected {expected}, got {actual}")]
    Shape { expected: String, actual: String },

    /// A font could not be loaded.
    #[error("font error: {0}")]
    Font(String),

    /// An effect list could not be parsed as JSON.
    #[error("descriptor error: {0}")]
    Descriptor(String),
}

impl Error {
    /// Build an [`Error::Parameter`] value.
    pub fn parameter(effect: &'static str, cause: impl ToString) -> Self {
        Self::Parameter {
            effect,
            cause: cause.to_string(),
        }
    }

    /// Build an [`Error::Shape`] value from two shapes.
    pub fn shape(expected: &[usize], actual: &[usize]) -> Self {
        Self::Shape {
            expected: format!("{expected:?}"),
            actual: format!("{actual:?}"),
        }
    }

    /// Check that `value` lies in `[min, max]`.
    pub(crate) fn check_range(
        effect: &'static str,
        param: &'static str,
        value: i64,
        min: i64,
        max: i64,
    ) -> Result<()> {
        if value < min || value > max {
            return Err(Self::Range {
                effect,
                param,
                value,
                min,
                max,
            });
        }
        Ok(())
    }

    /// Check a 0-100 percentage.
    pub(crate) fn check_percent(effect: &'static str, param: &'static str, value: i64) -> Result<u8> {
        Self::check_range(effect, param, value, 0, 100)?;
        Ok(value as u8)
    }
}

#[cfg(feature = "python")]
impl From<Error> for pyo3::PyErr {
    fn from(err: Error) -> Self {
        pyo3::exceptions::PyValueError::new_err(err.to_string())
    }
}
