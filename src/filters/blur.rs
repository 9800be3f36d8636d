//! Gaussian blur for masks and RGBA images.
//!
//! Uses separable 2-pass convolution with clamped edges. The reference and
//! parallel paths share the kernel and the per-row routines, and differ
//! only in how rows are scheduled, so their results are identical.
//!
//! ## Alpha Handling
//!
//! For RGBA images the blur uses **premultiplied alpha** processing:
//! 1. Convert to premultiplied: RGB *= alpha
//! 2. Blur premultiplied RGB and alpha
//! 3. Convert back to straight alpha: RGB /= alpha
//!
//! This prevents transparent pixels from bleeding into the result.

use ndarray::{Array3, ArrayView2, ArrayView3, Axis};

use super::accel::{for_each_row, Acceleration};
use super::core::{gaussian_kernel_1d, Mask};

/// Apply Gaussian blur to an image with 1, 3 or 4 channels.
///
/// `radius` is used as the Gaussian sigma. For `radius <= 0` the input is
/// returned unchanged.
pub fn gaussian_blur(input: ArrayView3<u8>, radius: f32, accel: Acceleration) -> Array3<u8> {
    let (height, width, channels) = input.dim();
    if !(radius > 0.0) || !radius.is_finite() || height == 0 || width == 0 || channels == 0 {
        return input.to_owned();
    }

    let kernel = gaussian_kernel_1d(radius);
    let has_alpha = channels == 4;
    let row_len = width * channels;

    // Premultiply into f32 so both passes work on linear sums
    let mut src = vec![0.0f32; height * row_len];
    for_each_row(&mut src, row_len, accel, |y, row| {
        for x in 0..width {
            let px = &mut row[x * channels..(x + 1) * channels];
            if has_alpha {
                let a = input[[y, x, 3]] as f32 / 255.0;
                for c in 0..3 {
                    px[c] = input[[y, x, c]] as f32 * a;
                }
                px[3] = a;
            } else {
                for c in 0..channels {
                    px[c] = input[[y, x, c]] as f32;
                }
            }
        }
    });

    // Pass 1: Horizontal
    let mut temp = vec![0.0f32; height * row_len];
    for_each_row(&mut temp, row_len, accel, |y, row| {
        let line = &src[y * row_len..(y + 1) * row_len];
        convolve_row(line, row, width, channels, &kernel);
    });

    // Pass 2: Vertical
    let mut blurred = vec![0.0f32; height * row_len];
    for_each_row(&mut blurred, row_len, accel, |y, row| {
        convolve_column(&temp, row, y, height, row_len, &kernel);
    });

    // Unpremultiply and round back to u8
    let mut output = vec![0u8; height * row_len];
    for_each_row(&mut output, row_len, accel, |y, row| {
        let line = &blurred[y * row_len..(y + 1) * row_len];
        for x in 0..width {
            let px = &line[x * channels..(x + 1) * channels];
            let out = &mut row[x * channels..(x + 1) * channels];
            if has_alpha {
                let a = px[3].clamp(0.0, 1.0);
                if a > 0.001 {
                    for c in 0..3 {
                        out[c] = to_u8(px[c] / a);
                    }
                }
                out[3] = to_u8(a * 255.0);
            } else {
                for c in 0..channels {
                    out[c] = to_u8(px[c]);
                }
            }
        }
    });

    // `output` was allocated as height * row_len above.
    Array3::from_shape_vec((height, width, channels), output)
        .expect("Shape mismatch in gaussian_blur")
}

/// Apply Gaussian blur to a single-channel mask.
pub fn blur_mask(mask: ArrayView2<u8>, radius: f32, accel: Acceleration) -> Mask {
    if !(radius > 0.0) || !radius.is_finite() {
        return mask.to_owned();
    }
    gaussian_blur(mask.insert_axis(Axis(2)), radius, accel).index_axis_move(Axis(2), 0)
}

#[inline]
fn to_u8(v: f32) -> u8 {
    v.round().clamp(0.0, 255.0) as u8
}

fn convolve_row(line: &[f32], out: &mut [f32], width: usize, channels: usize, kernel: &[f32]) {
    let half = kernel.len() / 2;
    for x in 0..width {
        for c in 0..channels {
            let mut sum = 0.0f32;
            for (ki, &kv) in kernel.iter().enumerate() {
                let sx = (x as isize + ki as isize - half as isize).clamp(0, width as isize - 1) as usize;
                sum += line[sx * channels + c] * kv;
            }
            out[x * channels + c] = sum;
        }
    }
}

fn convolve_column(
    temp: &[f32],
    out: &mut [f32],
    y: usize,
    height: usize,
    row_len: usize,
    kernel: &[f32],
) {
    let half = kernel.len() / 2;
    for (ki, &kv) in kernel.iter().enumerate() {
        let sy = (y as isize + ki as isize - half as isize).clamp(0, height as isize - 1) as usize;
        let line = &temp[sy * row_len..(sy + 1) * row_len];
        for (o, &v) in out.iter_mut().zip(line) {
            *o += v * kv;
        }
    }
}
