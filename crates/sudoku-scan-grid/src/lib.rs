//! Sudoku grid detector and cell extractor built on top of `sudoku-scan-core`.
//!
//! ## Quickstart
//!
//! ```
//! use sudoku_scan_core::GrayImage;
//! use sudoku_scan_grid::{GridDetector, GridExtractor};
//!
//! let img = GrayImage::new(64, 64);
//! let detector = GridDetector::default();
//! if let Ok(found) = detector.detect(&img.view()) {
//!     let grid = GridExtractor::default().extract(&img.view(), &found.quad);
//!     println!("cells: {:?}", grid.map(|g| g.cells().len()));
//! }
//! ```
//!
//! Pipeline:
//! 1. Inverted adaptive mean threshold so grid lines become foreground.
//! 2. Trace outer contours and drop the small ones.
//! 3. Simplify each contour; keep convex four-sided polygons and pick the
//!    largest, falling back to the diagonal extremes of the largest contour.
//! 4. Warp the outline onto a square, re-threshold with normal polarity and
//!    cut a 9x9 lattice with a fixed inset per cell.

mod compositor;
mod detector;
mod extractor;
mod grid;
mod params;
mod polygon;

pub use compositor::{stitch_cells, CellLayer};
pub use detector::{CornerSource, DetectError, GridDetection, GridDetector};
pub use extractor::{ExtractError, GridExtractor, RectifiedGrid};
pub use grid::{Cell, Grid, CELL_COUNT, GRID_SIZE};
pub use params::{GridDetectorParams, GridExtractorParams};
