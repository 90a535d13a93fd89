use serde::{Deserialize, Serialize};
use sudoku_scan_core::AdaptiveThresholdParams;

/// Parameters for locating the puzzle outline.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct GridDetectorParams {
    /// Binarization applied before contour tracing. Grid lines must end up
    /// as foreground.
    pub threshold: AdaptiveThresholdParams,
    /// Contours enclosing less than this fraction of the image are ignored.
    pub min_area_frac: f32,
    /// Polygon simplification tolerance relative to the contour perimeter.
    pub approx_epsilon_frac: f32,
}

impl Default for GridDetectorParams {
    fn default() -> Self {
        Self {
            threshold: AdaptiveThresholdParams::grid_detection(),
            min_area_frac: 0.02,
            approx_epsilon_frac: 0.02,
        }
    }
}

/// Parameters for rectifying the puzzle and cutting it into cells.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct GridExtractorParams {
    /// Side of the rectified square in pixels.
    pub rectified_size: usize,
    /// Pixels removed from every side of each cell to drop grid-line bleed.
    pub cell_inset_px: usize,
    /// Binarization of the rectified square.
    pub threshold: AdaptiveThresholdParams,
}

impl Default for GridExtractorParams {
    fn default() -> Self {
        Self {
            rectified_size: 450,
            cell_inset_px: 5,
            threshold: AdaptiveThresholdParams::cell_extraction(),
        }
    }
}

impl GridExtractorParams {
    /// Side of one lattice cell before the inset is removed.
    pub fn lattice_cell_px(&self) -> usize {
        self.rectified_size / crate::GRID_SIZE
    }

    /// Side of the emitted cell images.
    pub fn cell_size(&self) -> usize {
        self.lattice_cell_px()
            .saturating_sub(2 * self.cell_inset_px)
    }
}
