//! Core types and utilities for sudoku grid scanning.
//!
//! This crate is purely geometric and pixel-level: grayscale rasters,
//! adaptive thresholding, region-of-interest math, the four-corner puzzle
//! boundary and the projective transform used to rectify it. It does not
//! decode image files and does not know about contours.

mod homography;
mod image;
mod logger;
mod quad;
mod roi;
mod threshold;

pub use homography::{homography_from_4pt, warp_perspective_gray, Homography};
pub use image::{sample_bilinear, sample_bilinear_u8, GrayImage, GrayImageView};
pub use quad::{Coordinate, CornerRole, DetectionResult, GridQuad, QuadError};
pub use roi::{RoiError, RoiRect, RoiSpec};
pub use threshold::{
    adaptive_threshold, AdaptiveThresholdParams, Polarity, BACKGROUND, FOREGROUND,
};

#[cfg(feature = "tracing")]
pub use logger::init_tracing;

pub use logger::init_with_level;
