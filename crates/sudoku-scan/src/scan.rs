//! Path-based scanning entry points.
//!
//! Every operation decodes the image at `path` into 8-bit grayscale, runs
//! the detector and/or extractor from `sudoku-scan-grid`, and reports corners
//! normalized to the image (or region of interest) size.

use crate::core::{DetectionResult, GrayImage, GrayImageView, RoiError, RoiRect, RoiSpec};
use crate::grid::{
    stitch_cells, CellLayer, CornerSource, DetectError, ExtractError, Grid, GridDetector,
    GridDetectorParams, GridExtractor, GridExtractorParams,
};
use image::ImageReader;
use std::path::{Path, PathBuf};

#[cfg(feature = "tracing")]
use tracing::instrument;

/// Errors produced by the path-based scanning helpers.
#[derive(thiserror::Error, Debug)]
pub enum ScanError {
    #[error("failed to decode {}: {source}", path.display())]
    Image {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    #[error("failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    #[error(transparent)]
    Roi(#[from] RoiError),
    #[error(transparent)]
    Detect(#[from] DetectError),
    #[error(transparent)]
    Extract(#[from] ExtractError),
}

/// Outcome of scanning a region of interest.
#[derive(Clone, Debug)]
pub struct RoiScan {
    /// Crop rectangle in full-image pixels.
    pub rect: RoiRect,
    /// Corners normalized to the crop.
    pub detection: DetectionResult,
    pub source: CornerSource,
    pub grid: Grid,
}

/// Decode an image file into 8-bit grayscale.
#[cfg_attr(feature = "tracing", instrument(level = "info", skip(path)))]
pub fn load_gray(path: &Path) -> Result<image::GrayImage, ScanError> {
    let image_err = |source| ScanError::Image {
        path: path.to_path_buf(),
        source,
    };
    let reader = ImageReader::open(path)
        .map_err(|e| image_err(image::ImageError::IoError(e)))?
        .with_guessed_format()
        .map_err(|e| image_err(image::ImageError::IoError(e)))?;
    Ok(reader.decode().map_err(image_err)?.to_luma8())
}

/// Borrow an `image::GrayImage` as a core view.
pub fn gray_view(img: &image::GrayImage) -> GrayImageView<'_> {
    GrayImageView {
        width: img.width() as usize,
        height: img.height() as usize,
        data: img.as_raw(),
    }
}

fn save_gray(path: &Path, img: GrayImage) -> Result<(), ScanError> {
    let write_err = |source| ScanError::Write {
        path: path.to_path_buf(),
        source,
    };
    let raster = image::GrayImage::from_raw(img.width as u32, img.height as u32, img.data)
        .ok_or_else(|| {
            write_err(image::ImageError::Parameter(
                image::error::ParameterError::from_kind(
                    image::error::ParameterErrorKind::DimensionMismatch,
                ),
            ))
        })?;
    raster.save(path).map_err(write_err)
}

/// Detector and extractor pair configured once and reused across images.
#[derive(Clone, Debug, Default)]
pub struct SudokuScanner {
    detector: GridDetector,
    extractor: GridExtractor,
}

impl SudokuScanner {
    pub fn new(detector: GridDetectorParams, extractor: GridExtractorParams) -> Self {
        Self {
            detector: GridDetector::new(detector),
            extractor: GridExtractor::new(extractor),
        }
    }

    pub fn detector(&self) -> &GridDetector {
        &self.detector
    }

    pub fn extractor(&self) -> &GridExtractor {
        &self.extractor
    }

    /// Locate the puzzle and return its corners normalized to the image size.
    ///
    /// An undecodable file yields [`DetectionResult::full_frame`] rather than
    /// an error; a decodable image without a puzzle outline is an error.
    #[cfg_attr(feature = "tracing", instrument(level = "info", skip(self, path)))]
    pub fn detect_grid(&self, path: &Path) -> Result<DetectionResult, ScanError> {
        let img = match load_gray(path) {
            Ok(img) => img,
            Err(err) => {
                log::warn!("{err}; reporting the full frame");
                return Ok(DetectionResult::full_frame());
            }
        };
        let view = gray_view(&img);
        let found = self.detector.detect(&view)?;
        Ok(DetectionResult::from_quad(
            &found.quad,
            view.width,
            view.height,
        ))
    }

    /// Rectify the puzzle bounded by `corners` and cut it into 81 cells.
    #[cfg_attr(
        feature = "tracing",
        instrument(level = "info", skip(self, path, corners))
    )]
    pub fn extract_grid(&self, path: &Path, corners: &DetectionResult) -> Result<Grid, ScanError> {
        let img = load_gray(path)?;
        let view = gray_view(&img);
        let quad = corners.to_quad(view.width, view.height);
        Ok(self.extractor.extract(&view, &quad)?)
    }

    /// Crop `roi`, then detect and extract inside the crop.
    pub fn extract_grid_from_roi(&self, path: &Path, roi: &RoiSpec) -> Result<Grid, ScanError> {
        Ok(self.scan_roi(path, roi)?.grid)
    }

    /// Like [`Self::extract_grid_from_roi`] but also reports the crop and corners.
    #[cfg_attr(feature = "tracing", instrument(level = "info", skip(self, path)))]
    pub fn scan_roi(&self, path: &Path, roi: &RoiSpec) -> Result<RoiScan, ScanError> {
        let img = load_gray(path)?;
        let full = gray_view(&img);
        let rect = roi.resolve(full.width, full.height)?;
        log::debug!(
            "roi {}x{} at ({}, {})",
            rect.width,
            rect.height,
            rect.x,
            rect.y
        );

        let crop = full.crop(rect);
        let view = crop.view();
        let found = self.detector.detect(&view)?;
        let grid = self.extractor.extract(&view, &found.quad)?;
        Ok(RoiScan {
            rect,
            detection: DetectionResult::from_quad(&found.quad, view.width, view.height),
            source: found.source,
            grid,
        })
    }

    /// Overwrite `path` with the detection threshold of its own content.
    ///
    /// Returns whether the image could be read and written back.
    pub fn debug_grid_detection(&self, path: &Path) -> bool {
        let result = load_gray(path).and_then(|img| {
            let binary = self.detector.binarize(&gray_view(&img));
            save_gray(path, binary)
        });
        report_debug(result)
    }

    /// Overwrite `path` with the 81 thresholded cells stitched into a square.
    ///
    /// Corner ordering is not enforced here; a violation is only logged.
    /// Corners that admit no homography stitch a black square. Returns
    /// whether the image could be read and written back.
    pub fn debug_grid_extraction(&self, path: &Path, corners: &DetectionResult) -> bool {
        let result = load_gray(path).and_then(|img| {
            let view = gray_view(&img);
            let quad = corners.to_quad(view.width, view.height);
            if let Err(err) = quad.validate() {
                log::warn!("debug extraction with invalid corners: {err}");
            }
            let rectified = match self.extractor.warp(&view, &quad) {
                Err(ExtractError::HomographyFailed) => {
                    log::warn!("degenerate corners, stitching a blank grid");
                    self.extractor.blank()?
                }
                other => other?,
            };
            let grid = self.extractor.segment(&rectified)?;
            save_gray(path, stitch_cells(&grid, CellLayer::Binary))
        });
        report_debug(result)
    }
}

fn report_debug(result: Result<(), ScanError>) -> bool {
    match result {
        Ok(()) => true,
        Err(err) => {
            log::warn!("debug output not written: {err}");
            false
        }
    }
}

/// [`SudokuScanner::detect_grid`] with default parameters.
pub fn detect_grid(path: impl AsRef<Path>) -> Result<DetectionResult, ScanError> {
    SudokuScanner::default().detect_grid(path.as_ref())
}

/// [`SudokuScanner::extract_grid`] with default parameters.
pub fn extract_grid(path: impl AsRef<Path>, corners: &DetectionResult) -> Result<Grid, ScanError> {
    SudokuScanner::default().extract_grid(path.as_ref(), corners)
}

/// [`SudokuScanner::extract_grid_from_roi`] with default parameters.
pub fn extract_grid_from_roi(path: impl AsRef<Path>, roi: &RoiSpec) -> Result<Grid, ScanError> {
    SudokuScanner::default().extract_grid_from_roi(path.as_ref(), roi)
}

/// [`SudokuScanner::debug_grid_detection`] with default parameters.
pub fn debug_grid_detection(path: impl AsRef<Path>) -> bool {
    SudokuScanner::default().debug_grid_detection(path.as_ref())
}

/// [`SudokuScanner::debug_grid_extraction`] with default parameters.
pub fn debug_grid_extraction(path: impl AsRef<Path>, corners: &DetectionResult) -> bool {
    SudokuScanner::default().debug_grid_extraction(path.as_ref(), corners)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_reports_full_frame() {
        let res = detect_grid("/definitely/not/here.png").expect("full frame");
        assert_eq!(res, DetectionResult::full_frame());
    }

    #[test]
    fn missing_file_fails_extraction() {
        let err = extract_grid("/definitely/not/here.png", &DetectionResult::full_frame())
            .unwrap_err();
        assert!(matches!(err, ScanError::Image { .. }));
    }

    #[test]
    fn gray_view_borrows_pixels() {
        let img = image::GrayImage::from_raw(2, 1, vec![3, 7]).expect("raw");
        let view = gray_view(&img);
        assert_eq!((view.width, view.height), (2, 1));
        assert_eq!(view.get(1, 0), 7);
    }
}
