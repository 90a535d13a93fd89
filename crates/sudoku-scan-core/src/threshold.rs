//! Adaptive mean thresholding.
//!
//! Each pixel is compared against the mean of a square window centred on
//! it, minus a bias constant. Windows are clipped at the image border, so
//! edge pixels use the mean of the in-bounds part of their window.

use serde::{Deserialize, Serialize};

use crate::{GrayImage, GrayImageView};

/// Output value for foreground pixels.
pub const FOREGROUND: u8 = 255;
/// Output value for background pixels.
pub const BACKGROUND: u8 = 0;

/// Which side of the local threshold becomes foreground.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Polarity {
    /// `src > mean - bias` is foreground (light paper, dark ink becomes 0).
    Normal,
    /// `src <= mean - bias` is foreground (dark lines become 255).
    Inverted,
}

/// Missing fields in a config file take the [`Self::grid_detection`] values.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdaptiveThresholdParams {
    /// Side of the square averaging window in pixels. Even sizes round up to
    /// the next odd size and anything below 3 uses 3.
    pub block_size: usize,
    /// Constant subtracted from the local mean.
    pub bias: i32,
    pub polarity: Polarity,
}

impl AdaptiveThresholdParams {
    /// Parameters for locating the puzzle outline: wide window, strong bias,
    /// grid lines as foreground.
    pub fn grid_detection() -> Self {
        Self {
            block_size: 69,
            bias: 20,
            polarity: Polarity::Inverted,
        }
    }

    /// Parameters for a rectified grid: tighter window that separates digit
    /// ink from the now axis-aligned lines.
    pub fn cell_extraction() -> Self {
        Self {
            block_size: 63,
            bias: 10,
            polarity: Polarity::Normal,
        }
    }

    fn radius(&self) -> usize {
        self.block_size.max(3) / 2
    }
}

impl Default for AdaptiveThresholdParams {
    fn default() -> Self {
        Self::grid_detection()
    }
}

/// Summed-area table with one row/column of zero padding.
struct IntegralImage {
    stride: usize,
    sums: Vec<u64>,
}

impl IntegralImage {
    fn new(src: &GrayImageView<'_>) -> Self {
        let stride = src.width + 1;
        let mut sums = vec![0u64; stride * (src.height + 1)];
        for y in 0..src.height {
            let mut row_sum = 0u64;
            for x in 0..src.width {
                row_sum += src.get(x, y) as u64;
                sums[(y + 1) * stride + x + 1] = sums[y * stride + x + 1] + row_sum;
            }
        }
        Self { stride, sums }
    }

    /// Sum over the half-open rectangle `[x0, x1) × [y0, y1)`.
    #[inline]
    fn sum(&self, x0: usize, y0: usize, x1: usize, y1: usize) -> u64 {
        let s = self.stride;
        self.sums[y1 * s + x1] + self.sums[y0 * s + x0]
            - self.sums[y0 * s + x1]
            - self.sums[y1 * s + x0]
    }
}

/// Binarize `src` into a 0/255 image.
#[cfg_attr(
    feature = "tracing",
    tracing::instrument(level = "debug", skip(src, params), fields(width = src.width, height = src.height))
)]
pub fn adaptive_threshold(src: &GrayImageView<'_>, params: &AdaptiveThresholdParams) -> GrayImage {
    let mut out = GrayImage::new(src.width, src.height);
    if src.is_empty() {
        return out;
    }

    let integral = IntegralImage::new(src);
    let r = params.radius();
    let bias = params.bias as i64;

    for y in 0..src.height {
        let y0 = y.saturating_sub(r);
        let y1 = (y + r + 1).min(src.height);
        for x in 0..src.width {
            let x0 = x.saturating_sub(r);
            let x1 = (x + r + 1).min(src.width);

            let n = ((x1 - x0) * (y1 - y0)) as i64;
            let sum = integral.sum(x0, y0, x1, y1) as i64;
            // src > mean - bias, scaled by n to stay in integers.
            let above = (src.get(x, y) as i64) * n > sum - bias * n;

            let fg = match params.polarity {
                Polarity::Normal => above,
                Polarity::Inverted => !above,
            };
            out.data[y * src.width + x] = if fg { FOREGROUND } else { BACKGROUND };
        }
    }

    out
}
