//! High-level facade crate for the `sudoku-scan-*` workspace.
//!
//! This crate provides:
//! - re-exports of the core geometry and the grid detector/extractor
//! - path-based helpers that decode an image file and run the full pipeline
//! - JSON config/report types and a digit recognizer seam
//!
//! ## Quickstart
//!
//! ```no_run
//! use sudoku_scan::scan;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let corners = scan::detect_grid("puzzle.jpg")?;
//! let grid = scan::extract_grid("puzzle.jpg", &corners)?;
//! println!("{} cells of {} px", grid.cells().len(), grid.cell_size());
//! # Ok(())
//! # }
//! ```
//!
//! ## API map
//! - `sudoku_scan::core`: rasters, thresholding, ROI math, corner types, homographies.
//! - `sudoku_scan::grid`: outline detection, rectification, cell segmentation.
//! - `sudoku_scan::scan`: path-based entry points and [`scan::SudokuScanner`].
//! - `sudoku_scan::io`: [`io::ScanConfig`] and [`io::ScanReport`].
//! - `sudoku_scan::recognizer`: [`recognizer::DigitRecognizer`].
//!
//! The C ABI lives in the `sudoku-scan-ffi` crate.

pub use sudoku_scan_core as core;
pub use sudoku_scan_grid as grid;

pub use sudoku_scan_core::{Coordinate, DetectionResult, RoiRect, RoiSpec};
pub use sudoku_scan_grid::{Cell, Grid, CELL_COUNT, GRID_SIZE};

pub mod io;
pub mod recognizer;
pub mod scan;

pub use scan::{RoiScan, ScanError, SudokuScanner};
