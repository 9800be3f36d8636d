//! Morphology: growing the nonzero region of a mask.
//!
//! `expand` has two interchangeable implementations:
//! - **Reference** - `n` iterations of a 3x3 max filter, each done as a
//!   horizontal then vertical 1-pixel pass.
//! - **Parallel** - a single dilation with a disc of radius `n`
//!   (offsets with `dx² + dy² ≤ n²`), rows distributed over rayon.
//!
//! Both are deterministic and grow monotonically with `n`. The reference
//! disc is approximated by a square, so it reaches slightly further on the
//! diagonals than the parallel path.

use ndarray::ArrayView2;

use super::accel::{for_each_row, Acceleration};
use super::core::{mask_from_vec, Mask};

/// Grow the nonzero region of `mask` outward by `n` pixels.
///
/// For `n <= 0` the input is returned unchanged.
pub fn expand(mask: ArrayView2<u8>, n: i32, accel: Acceleration) -> Mask {
    let (height, width) = mask.dim();
    if n <= 0 || height == 0 || width == 0 {
        return mask.to_owned();
    }

    if accel.is_parallel() {
        dilate_disc(mask, n as usize, accel)
    } else {
        let mut current = mask.to_owned();
        for _ in 0..n {
            current = max_filter_3x3(current.view());
        }
        current
    }
}

/// One pass of a 3x3 max filter (separable).
fn max_filter_3x3(input: ArrayView2<u8>) -> Mask {
    let (height, width) = input.dim();

    // Pass 1: Horizontal
    let mut temp = vec![0u8; height * width];
    for (y, row) in temp.chunks_mut(width).enumerate() {
        for x in 0..width {
            let x_start = x.saturating_sub(1);
            let x_end = (x + 2).min(width);
            let mut max_val = 0u8;
            for sx in x_start..x_end {
                max_val = max_val.max(input[[y, sx]]);
            }
            row[x] = max_val;
        }
    }

    // Pass 2: Vertical
    let mut output = vec![0u8; height * width];
    for (y, row) in output.chunks_mut(width).enumerate() {
        let y_start = y.saturating_sub(1);
        let y_end = (y + 2).min(height);
        for x in 0..width {
            let mut max_val = 0u8;
            for sy in y_start..y_end {
                max_val = max_val.max(temp[sy * width + x]);
            }
            row[x] = max_val;
        }
    }

    mask_from_vec(height, width, output)
}

/// Half-width of the disc of radius `r` at each vertical offset `0..=r`.
fn disc_spans(r: usize) -> Vec<usize> {
    let r_sq = r * r;
    (0..=r)
        .map(|dy| {
            let mut w = 0usize;
            while (w + 1) * (w + 1) + dy * dy <= r_sq {
                w += 1;
            }
            w
        })
        .collect()
}

/// Single-pass dilation with a disc-shaped structuring element.
fn dilate_disc(input: ArrayView2<u8>, r: usize, accel: Acceleration) -> Mask {
    let (height, width) = input.dim();
    let spans = disc_spans(r);

    let mut output = vec![0u8; height * width];
    for_each_row(&mut output, width, accel, |y, row| {
        let y_start = y.saturating_sub(r);
        let y_end = (y + r + 1).min(height);

        for x in 0..width {
            let mut max_val = 0u8;
            for sy in y_start..y_end {
                let half = spans[sy.abs_diff(y)];
                let x_start = x.saturating_sub(half);
                let x_end = (x + half + 1).min(width);
                for sx in x_start..x_end {
                    max_val = max_val.max(input[[sy, sx]]);
                }
                if max_val == 255 {
                    break;
                }
            }
            row[x] = max_val;
        }
    });

    mask_from_vec(height, width, output)
}

#[cfg(test)]
mod tests {
    use super::*;

    const PATHS: [Acceleration; 2] = [Acceleration::Reference, Acceleration::Parallel];

    fn dot(size: usize, y: usize, x: usize) -> Mask {
        let mut mask = Mask::zeros((size, size));
        mask[[y, x]] = 255;
        mask
    }

    fn nonzero_subset(a: &Mask, b: &Mask) -> bool {
        a.iter().zip(b.iter()).all(|(&x, &y)| x == 0 || y != 0)
    }

    #[test]
    fn test_expand_non_positive_is_identity() {
        let mask = dot(7, 3, 3);
        for accel in PATHS {
            assert_eq!(expand(mask.view(), 0, accel), mask);
            assert_eq!(expand(mask.view(), -4, accel), mask);
        }
    }

    #[test]
    fn test_expand_grows_by_n_along_axes() {
        let mask = dot(11, 5, 5);
        for accel in PATHS {
            let grown = expand(mask.view(), 2, accel);
            assert_eq!(grown[[5, 3]], 255);
            assert_eq!(grown[[5, 7]], 255);
            assert_eq!(grown[[3, 5]], 255);
            assert_eq!(grown[[7, 5]], 255);
            assert_eq!(grown[[5, 2]], 0);
            assert_eq!(grown[[8, 5]], 0);
        }
    }

    #[test]
    fn test_parallel_expand_is_disc_shaped() {
        let mask = dot(11, 5, 5);
        let grown = expand(mask.view(), 3, Acceleration::Parallel);
        if Acceleration::Parallel.is_parallel() {
            // Corner of the bounding square lies outside the disc.
            assert_eq!(grown[[2, 2]], 0);
            // (dy, dx) = (2, 2): 8 <= 9, inside.
            assert_eq!(grown[[3, 3]], 255);
        }
        assert_eq!(grown[[5, 8]], 255);
    }

    #[test]
    fn test_expand_is_monotonic() {
        let mut mask = Mask::zeros((20, 20));
        mask[[8, 8]] = 255;
        mask[[9, 12]] = 40;
        mask[[12, 9]] = 255;

        for accel in PATHS {
            let mut prev = expand(mask.view(), 0, accel);
            for n in 1..5 {
                let next = expand(mask.view(), n, accel);
                assert!(nonzero_subset(&prev, &next), "n={n} accel={accel:?}");
                prev = next;
            }
        }
    }

    #[test]
    fn test_expand_preserves_grayscale_values() {
        let mut mask = Mask::zeros((5, 5));
        mask[[2, 2]] = 90;
        for accel in PATHS {
            let grown = expand(mask.view(), 1, accel);
            assert_eq!(grown[[2, 1]], 90);
            assert_eq!(grown[[1, 2]], 90);
        }
    }

    #[test]
    fn test_expand_clips_at_edges() {
        let mask = dot(4, 0, 0);
        for accel in PATHS {
            let grown = expand(mask.view(), 2, accel);
            assert_eq!(grown.dim(), (4, 4));
            assert_eq!(grown[[0, 2]], 255);
            assert_eq!(grown[[2, 0]], 255);
        }
    }

    #[test]
    fn test_disc_spans() {
        assert_eq!(disc_spans(0), vec![0]);
        assert_eq!(disc_spans(1), vec![1, 0]);
        assert_eq!(disc_spans(3), vec![3, 2, 2, 0]);
    }

    #[test]
    fn test_empty_mask_passes_through() {
        let mask = Mask::zeros((0, 5));
        for accel in PATHS {
            assert_eq!(expand(mask.view(), 3, accel).dim(), (0, 5));
        }
    }
}
