//! Region-of-interest resolution.
//!
//! A [`RoiSpec`] describes a square window around the image centre, either
//! in pixels or as fractions of an aspect-ratio-fitted frame. [`RoiSpec::resolve`]
//! turns it into a pixel rectangle that lies inside the image.

use serde::{Deserialize, Serialize};

/// Pixel rectangle, `x`/`y` is the top-left corner.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoiRect {
    pub x: usize,
    pub y: usize,
    pub width: usize,
    pub height: usize,
}

impl RoiRect {
    pub fn full(width: usize, height: usize) -> Self {
        Self {
            x: 0,
            y: 0,
            width,
            height,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum RoiSpec {
    /// Square of `size_px`, centred horizontally, moved up by `offset_px`
    /// from the vertical centre (negative values move it down).
    Fixed { size_px: u32, offset_px: i32 },
    /// Square whose side is `size_pct` of the fitted width, moved up by
    /// `offset_pct` of the fitted height. The fitted frame is the largest
    /// `aspect_ratio` (height / width) frame that shares the image width or
    /// height.
    Relative {
        size_pct: f64,
        offset_pct: f64,
        aspect_ratio: f64,
    },
}

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum RoiError {
    #[error("ROI size must be positive")]
    ZeroSize,
    #[error("ROI size {size}px exceeds image width {width}px")]
    WiderThanImage { size: u32, width: usize },
    #[error("ROI offset {offset}px leaves the image (height {height}px, size {size}px)")]
    OffsetOutOfBounds { offset: i32, size: u32, height: usize },
    #[error("invalid relative ROI parameter {name} = {value}")]
    InvalidParameter { name: &'static str, value: f64 },
    #[error("ROI is empty after clamping to the image")]
    Empty,
}

impl RoiSpec {
    /// Resolve against an image of `width × height` pixels.
    ///
    /// Fixed-size ROIs that do not fit are rejected; relative ROIs are
    /// clamped and may come out smaller than requested.
    pub fn resolve(&self, width: usize, height: usize) -> Result<RoiRect, RoiError> {
        match *self {
            RoiSpec::Fixed { size_px, offset_px } => {
                resolve_fixed(size_px, offset_px, width, height)
            }
            RoiSpec::Relative {
                size_pct,
                offset_pct,
                aspect_ratio,
            } => resolve_relative(size_pct, offset_pct, aspect_ratio, width, height),
        }
    }
}

fn resolve_fixed(
    size_px: u32,
    offset_px: i32,
    width: usize,
    height: usize,
) -> Result<RoiRect, RoiError> {
    if size_px == 0 {
        return Err(RoiError::ZeroSize);
    }
    let size = size_px as usize;
    if size > width {
        return Err(RoiError::WiderThanImage {
            size: size_px,
            width,
        });
    }

    let out_of_bounds = RoiError::OffsetOutOfBounds {
        offset: offset_px,
        size: size_px,
        height,
    };
    // |offset| <= (height - size) / 2, compared in doubled integers.
    let slack = height as i64 - size as i64;
    if slack < 0 || 2 * (offset_px as i64).abs() > slack {
        return Err(out_of_bounds);
    }

    let y = slack / 2 - offset_px as i64;
    if y < 0 || y as usize + size > height {
        return Err(out_of_bounds);
    }

    Ok(RoiRect {
        x: (width - size) / 2,
        y: y as usize,
        width: size,
        height: size,
    })
}

fn resolve_relative(
    size_pct: f64,
    offset_pct: f64,
    aspect_ratio: f64,
    width: usize,
    height: usize,
) -> Result<RoiRect, RoiError> {
    for (name, value) in [("size_pct", size_pct), ("aspect_ratio", aspect_ratio)] {
        if !(value.is_finite() && value > 0.0) {
            return Err(RoiError::InvalidParameter { name, value });
        }
    }
    if !offset_pct.is_finite() {
        return Err(RoiError::InvalidParameter {
            name: "offset_pct",
            value: offset_pct,
        });
    }
    if width == 0 || height == 0 {
        return Err(RoiError::Empty);
    }

    let (w, h) = (width as f64, height as f64);
    let fit_height = aspect_ratio > h / w;
    let fitted_h = if fit_height { h } else { w * aspect_ratio };
    let fitted_w = if fit_height { h / aspect_ratio } else { w };

    let roi = size_pct * fitted_w;
    let offset = offset_pct * fitted_h;

    let x0 = (w / 2.0 - roi / 2.0).max(0.0) as usize;
    let x1 = (x0 as f64 + roi).min(w - 1.0) as usize;
    let y0 = (h / 2.0 - roi / 2.0 - offset).max(0.0) as usize;
    let y1 = (y0 as f64 + roi).min(h - 1.0) as usize;

    if x1 <= x0 || y1 <= y0 {
        return Err(RoiError::Empty);
    }
    Ok(RoiRect {
        x: x0,
        y: y0,
        width: x1 - x0,
        height: y1 - y0,
    })
}
