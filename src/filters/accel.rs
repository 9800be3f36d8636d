//! Acceleration strategy for the mask-transform primitives.
//!
//! The accelerated path spreads image rows over the rayon thread pool and is
//! only compiled in with the `parallel` feature. Requesting acceleration when
//! the feature is absent silently resolves to the single-threaded reference
//! path; it is never an error.

use serde::{Deserialize, Serialize};

/// Which implementation of a primitive to run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Acceleration {
    /// Single-threaded reference implementation.
    #[default]
    Reference,
    /// Row-parallel implementation backed by rayon.
    Parallel,
}

impl Acceleration {
    /// Resolve a caller's request against what this build supports.
    pub fn resolve(requested: bool) -> Self {
        if requested && is_available() {
            Acceleration::Parallel
        } else {
            if requested {
                tracing::debug!("acceleration requested but unavailable, using reference path");
            }
            Acceleration::Reference
        }
    }

    /// True when this strategy runs the parallel path in this build.
    #[inline]
    pub fn is_parallel(self) -> bool {
        self == Acceleration::Parallel && is_available()
    }
}

/// Whether the parallel path is compiled in.
#[inline]
pub fn is_available() -> bool {
    cfg!(feature = "parallel")
}

/// Diagnostic snapshot of the acceleration capability.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct AccelerationStatus {
    pub available: bool,
    pub version: Option<String>,
    pub expected_speedup: String,
}

/// Report whether acceleration is available and what it is expected to buy.
pub fn acceleration_status() -> AccelerationStatus {
    #[cfg(feature = "parallel")]
    {
        let threads = rayon::current_num_threads();
        AccelerationStatus {
            available: true,
            version: Some(format!("rayon 1.x ({threads} threads)")),
            expected_speedup: format!("up to ~{threads}x on large masks, roughly linear in cores"),
        }
    }
    #[cfg(not(feature = "parallel"))]
    {
        AccelerationStatus {
            available: false,
            version: None,
            expected_speedup: "none (reference path only)".to_string(),
        }
    }
}

/// Run `f(y, row)` over every `row_len`-sized row of `buf`.
///
/// Rows are processed on the rayon pool when `accel` is parallel and
/// sequentially otherwise. `f` must only depend on `y` and shared inputs.
#[cfg(feature = "parallel")]
pub(crate) fn for_each_row<T, F>(buf: &mut [T], row_len: usize, accel: Acceleration, f: F)
where
    T: Send,
    F: Fn(usize, &mut [T]) + Send + Sync,
{
    use rayon::prelude::*;

    if row_len == 0 {
        return;
    }
    if accel.is_parallel() {
        buf.par_chunks_mut(row_len)
            .enumerate()
            .for_each(|(y, row)| f(y, row));
    } else {
        buf.chunks_mut(row_len)
            .enumerate()
            .for_each(|(y, row)| f(y, row));
    }
}

#[cfg(not(feature = "parallel"))]
pub(crate) fn for_each_row<T, F>(buf: &mut [T], row_len: usize, _accel: Acceleration, f: F)
where
    T: Send,
    F: Fn(usize, &mut [T]) + Send + Sync,
{
    if row_len == 0 {
        return;
    }
    buf.chunks_mut(row_len)
        .enumerate()
        .for_each(|(y, row)| f(y, row));
}
