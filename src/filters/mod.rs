//! Mask-transform primitives.
//!
//! ## Supported Formats
//!
//! | Format | Shape | Type | Description |
//! |--------|-------|------|-------------|
//! | Mask | (H, W) | u8 | Single intensity channel, 0-255 |
//! | RGBA8 | (H, W, 4) | u8 | Straight-alpha color, 0-255 |
//!
//! `gaussian_blur` also accepts (H, W, 1) and (H, W, 3) images.
//!
//! ## Architecture
//!
//! Each primitive has two interchangeable implementations selected by an
//! [`Acceleration`] value that the caller resolves once:
//! - **Reference** - single-threaded
//! - **Parallel** - rows spread over the rayon pool (`parallel` feature)
//!
//! Primitives are pure functions of views and return owned arrays, so
//! they are safe to call concurrently.

pub mod accel;
pub mod blur;
pub mod core;
pub mod morphology;

pub use accel::{acceleration_status, Acceleration, AccelerationStatus};
pub use blur::{blur_mask, gaussian_blur};
pub use self::core::{Mask, Region, Rgb, Rgba};
pub use morphology::expand;
