//! Box-filter smoothing of the Si intensity image.
//!
//! The filter is a normalized box convolution in "same" mode: the output
//! keeps the input shape and pixels outside the image count as zero, so
//! borders darken the way a zero-padded convolution does. Window sums come
//! from a summed-area table, so the cost does not grow with the kernel size.

use ndarray::{Array2, ArrayView2};

use super::error::{PipelineError, PipelineResult};
use super::ingest::IntensityImage;

/// Smoothed intensity, same shape as the source image.
pub type SmoothedImage = Array2<f64>;

/// Inclusive range of accepted kernel sizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KernelLimits {
    pub min: usize,
    pub max: usize,
}

impl Default for KernelLimits {
    fn default() -> Self {
        Self { min: 3, max: 100 }
    }
}

impl KernelLimits {
    /// Reject sizes outside the range. Odd and even sizes are both valid.
    pub fn check(&self, size: usize) -> PipelineResult<usize> {
        if (self.min..=self.max).contains(&size) {
            Ok(size)
        } else {
            Err(PipelineError::KernelSizeOutOfRange {
                size,
                min: self.min,
                max: self.max,
            })
        }
    }
}

/// Summed-area table with a zero first row and column.
///
/// `sat[[r, c]]` is the sum of `image[..r, ..c]`, so the table has shape
/// (H + 1, W + 1). Sums are exact for 8-bit input.
pub fn summed_area_table(image: &ArrayView2<u8>) -> Array2<u64> {
    let (rows, cols) = image.dim();
    let mut sat = Array2::<u64>::zeros((rows + 1, cols + 1));
    for r in 0..rows {
        let mut row_sum = 0u64;
        for c in 0..cols {
            row_sum += u64::from(image[[r, c]]);
            sat[[r + 1, c + 1]] = row_sum + sat[[r, c + 1]];
        }
    }
    sat
}

/// Sum of `image[r0..r1, c0..c1]` read from its summed-area table.
fn window_sum(sat: &Array2<u64>, r0: usize, c0: usize, r1: usize, c1: usize) -> u64 {
    sat[[r1, c1]] + sat[[r0, c0]] - sat[[r0, c1]] - sat[[r1, c0]]
}

/// `size`×`size` box convolution with implicit zero padding, output shaped
/// like `image`.
///
/// The kernel origin sits at `size / 2`: odd kernels are centred, and even
/// kernels cover `[i - size/2, i + (size-1)/2]`, one extra row/column before
/// the pixel. Every tap weighs `1/size²`, including the ones that fall
/// outside the image.
pub fn box_filter_same(image: &ArrayView2<u8>, size: usize) -> Array2<f64> {
    let (rows, cols) = image.dim();
    if rows == 0 || cols == 0 || size == 0 {
        return Array2::zeros((rows, cols));
    }

    let sat = summed_area_table(image);
    let offset = size / 2;
    let taps = (size * size) as f64;

    Array2::from_shape_fn((rows, cols), |(i, j)| {
        let r0 = i.saturating_sub(offset);
        let r1 = (i + size - offset).min(rows);
        let c0 = j.saturating_sub(offset);
        let c1 = (j + size - offset).min(cols);
        window_sum(&sat, r0, c0, r1, c1) as f64 / taps
    })
}

/// Smooth `image` with a `kernel_size` box filter.
///
/// Same result as scaling the intensities to [0, 1], convolving, and
/// scaling back to [0, 255].
pub fn smooth(
    image: &IntensityImage,
    kernel_size: usize,
    limits: KernelLimits,
) -> PipelineResult<SmoothedImage> {
    let size = limits.check(kernel_size)?;
    let smoothed = box_filter_same(&image.data().view(), size);
    log::debug!(
        "Smoothed {}x{} image with {size}x{size} box kernel",
        image.width(),
        image.height()
    );
    Ok(smoothed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::array;

    /// Reference: scale to [0, 1], full convolution with a `1/K²` box,
    /// crop the centred "same" window, scale back to [0, 255].
    fn same_via_full(image: &Array2<u8>, size: usize) -> Array2<f64> {
        let (n, m) = image.dim();
        let kernel = Array2::from_elem((size, size), 1.0 / (size * size) as f64);
        let mut full = Array2::<f64>::zeros((n + size - 1, m + size - 1));
        for ((i, j), &v) in image.indexed_iter() {
            for ((a, b), &w) in kernel.indexed_iter() {
                full[[i + a, j + b]] += f64::from(v) / 255.0 * w;
            }
        }
        let start = (size - 1) / 2;
        full.slice(ndarray::s![start..start + n, start..start + m])
            .mapv(|v| v * 255.0)
    }

    #[test]
    fn table_holds_prefix_sums() {
        let image = array![[1u8, 2, 3], [4, 5, 6]];
        let sat = summed_area_table(&image.view());
        assert_eq!(
            sat,
            array![[0u64, 0, 0, 0], [0, 1, 3, 6], [0, 5, 12, 21]]
        );
        assert_eq!(window_sum(&sat, 0, 1, 2, 3), 2 + 3 + 5 + 6);
    }

    #[test]
    fn same_mode_zero_pads_edges() {
        let image = array![[1u8, 2, 3], [4, 5, 6], [7, 8, 9]];
        let result = box_filter_same(&image.view(), 3);

        let expected = array![[12.0, 21.0, 16.0], [27.0, 45.0, 33.0], [24.0, 39.0, 28.0]] / 9.0;
        for (a, b) in result.iter().zip(expected.iter()) {
            assert_relative_eq!(*a, *b, epsilon = 1e-12);
        }
    }

    #[test]
    fn matches_cropped_full_convolution_for_even_and_odd_kernels() {
        let image = Array2::from_shape_fn((5, 7), |(r, c)| ((r * 37 + c * 11) % 256) as u8);
        for size in [2, 3, 4, 5, 6, 9] {
            let ours = box_filter_same(&image.view(), size);
            let reference = same_via_full(&image, size);
            assert_eq!(ours.dim(), reference.dim());
            for (a, b) in ours.iter().zip(reference.iter()) {
                assert_relative_eq!(*a, *b, epsilon = 1e-9);
            }
        }
    }

    #[test]
    fn kernel_larger_than_image() {
        let image = IntensityImage::filled(2, 2, 255);
        let out = smooth(&image, 5, KernelLimits::default()).unwrap();
        // every output pixel sees all 4 input pixels out of 25 taps
        for &v in out.iter() {
            assert_relative_eq!(v, 255.0 * 4.0 / 25.0, epsilon = 1e-9);
        }
    }

    #[test]
    fn shape_is_preserved_over_the_whole_range() {
        let image = IntensityImage::filled(9, 6, 80);
        for k in 3..=100 {
            let out = smooth(&image, k, KernelLimits::default()).unwrap();
            assert_eq!(out.dim(), (6, 9), "kernel {k}");
        }
    }

    #[test]
    fn largest_kernel_on_a_large_image_matches_reference() {
        let image = Array2::from_shape_fn((60, 80), |(r, c)| ((r * 7 + c * 3) % 256) as u8);
        let out = box_filter_same(&image.view(), 100);
        let reference = same_via_full(&image, 100);
        for (a, b) in out.iter().zip(reference.iter()) {
            assert_relative_eq!(*a, *b, epsilon = 1e-6);
        }
    }

    #[test]
    fn boundary_sizes_accepted_and_outside_rejected() {
        let image = IntensityImage::filled(4, 4, 10);
        let limits = KernelLimits::default();
        assert!(smooth(&image, 3, limits).is_ok());
        assert!(smooth(&image, 100, limits).is_ok());

        for bad in [0, 1, 2, 101] {
            assert_eq!(
                smooth(&image, bad, limits),
                Err(PipelineError::KernelSizeOutOfRange {
                    size: bad,
                    min: 3,
                    max: 100
                })
            );
        }
    }

    #[test]
    fn uniform_interior_is_unchanged() {
        let image = IntensityImage::filled(10, 10, 120);
        let out = smooth(&image, 3, KernelLimits::default()).unwrap();
        assert_relative_eq!(out[[5, 5]], 120.0, epsilon = 1e-9);
        // corner sees 4 of 9 taps
        assert_relative_eq!(out[[0, 0]], 120.0 * 4.0 / 9.0, epsilon = 1e-9);
    }

    #[test]
    fn even_kernel_window_leans_before_the_pixel() {
        // Single bright column at c = 2 in a 1x6 row; 4x4 kernel covers
        // columns [j - 2, j + 1] for output j.
        let mut data = Array2::<u8>::zeros((1, 6));
        data[[0, 2]] = 255;
        let image = IntensityImage::from_array(data).unwrap();
        let out = smooth(&image, 4, KernelLimits::default()).unwrap();

        let hit = 255.0 / 16.0;
        let expected = [0.0, hit, hit, hit, hit, 0.0];
        for (c, &e) in expected.iter().enumerate() {
            assert_relative_eq!(out[[0, c]], e, epsilon = 1e-9);
        }
    }
}
