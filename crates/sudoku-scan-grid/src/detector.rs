use crate::params::GridDetectorParams;
use crate::polygon::{
    approximate_polygon, extreme_corners, is_convex, outer_contours, perimeter, polygon_area,
};
use nalgebra::Point2;
use sudoku_scan_core::{adaptive_threshold, GrayImage, GrayImageView, GridQuad};

#[cfg(feature = "tracing")]
use tracing::instrument;

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum DetectError {
    #[error("image is empty")]
    EmptyImage,
    #[error("image buffer does not match its {width}x{height} size")]
    RasterMismatch { width: usize, height: usize },
    #[error("no contour large enough to be a puzzle ({contours} traced)")]
    NoCandidates { contours: usize },
}

/// How the reported corners were obtained.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CornerSource {
    /// Vertices of a convex four-sided polygon approximation.
    Polygon,
    /// Diagonal extreme points of the largest contour.
    Extremes,
}

/// Puzzle outline in pixel coordinates of the searched image.
#[derive(Clone, Debug)]
pub struct GridDetection {
    pub quad: GridQuad,
    /// Area enclosed by the winning contour.
    pub area: f32,
    pub source: CornerSource,
    /// Contours that passed the area filter.
    pub candidates: usize,
}

/// Finds the outer border of the puzzle in a grayscale image.
#[derive(Clone, Debug, Default)]
pub struct GridDetector {
    params: GridDetectorParams,
}

struct Candidate {
    area: f32,
    quad: Option<GridQuad>,
    contour: Vec<Point2<f32>>,
}

impl GridDetector {
    pub fn new(params: GridDetectorParams) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &GridDetectorParams {
        &self.params
    }

    /// Threshold used for contour tracing; grid lines become foreground.
    pub fn binarize(&self, img: &GrayImageView<'_>) -> GrayImage {
        adaptive_threshold(img, &self.params.threshold)
    }

    #[cfg_attr(
        feature = "tracing",
        instrument(level = "info", skip(self, img), fields(width = img.width, height = img.height))
    )]
    pub fn detect(&self, img: &GrayImageView<'_>) -> Result<GridDetection, DetectError> {
        if img.is_empty() {
            return Err(DetectError::EmptyImage);
        }
        if img.data.len() != img.width * img.height {
            return Err(DetectError::RasterMismatch {
                width: img.width,
                height: img.height,
            });
        }

        let binary = self.binarize(img);
        let contours = outer_contours(&binary).ok_or(DetectError::RasterMismatch {
            width: img.width,
            height: img.height,
        })?;
        let traced = contours.len();

        let min_area = self.params.min_area_frac * (img.width * img.height) as f32;
        let candidates: Vec<Candidate> = contours
            .into_iter()
            .filter(|c| c.len() >= 4)
            .filter_map(|contour| {
                let area = polygon_area(&contour);
                (area >= min_area).then(|| self.candidate(contour, area))
            })
            .collect();
        log::debug!(
            "traced {} outer contours, {} above {:.0} px²",
            traced,
            candidates.len(),
            min_area
        );

        let best_quad = candidates
            .iter()
            .filter_map(|c| c.quad.map(|q| (c.area, q)))
            .max_by(|a, b| a.0.total_cmp(&b.0));
        if let Some((area, quad)) = best_quad {
            log::debug!("four-sided outline with area {area:.0}");
            return Ok(GridDetection {
                quad,
                area,
                source: CornerSource::Polygon,
                candidates: candidates.len(),
            });
        }

        let largest = candidates
            .iter()
            .max_by(|a, b| a.area.total_cmp(&b.area))
            .ok_or(DetectError::NoCandidates { contours: traced })?;
        let quad = extreme_corners(&largest.contour)
            .ok_or(DetectError::NoCandidates { contours: traced })?;
        log::warn!(
            "no four-sided outline among {} candidates, using contour extremes",
            candidates.len()
        );
        Ok(GridDetection {
            quad,
            area: largest.area,
            source: CornerSource::Extremes,
            candidates: candidates.len(),
        })
    }

    fn candidate(&self, contour: Vec<Point2<f32>>, area: f32) -> Candidate {
        let eps = self.params.approx_epsilon_frac * perimeter(&contour);
        let poly = approximate_polygon(&contour, eps);
        let quad = match poly.as_slice() {
            &[a, b, c, d] if is_convex(&poly) => Some(GridQuad::from_unordered([a, b, c, d])),
            _ => None,
        };
        Candidate {
            area,
            quad,
            contour,
        }
    }
}
