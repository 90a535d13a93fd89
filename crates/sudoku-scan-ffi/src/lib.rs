//! C ABI over the `sudoku-scan` path-based API.
//!
//! Paths are NUL-terminated UTF-8 strings. Corners cross the boundary
//! normalized to the image size. Cell buffers are allocated here and must be
//! released with [`sudoku_scan_grid_buffer_free`] exactly once.
//!
//! Errors never unwind into the caller: detection falls back to the full
//! frame, extraction returns an empty buffer and debug calls return `false`.
//! The reason is logged through `log`.

use std::ffi::{c_char, CStr};
use std::path::Path;
use std::ptr;
use std::sync::RwLock;

use sudoku_scan::recognizer::RecognizerConfig;
use sudoku_scan::scan::{self, ScanError};
use sudoku_scan::{Coordinate, DetectionResult, Grid, RoiSpec};

#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SudokuCoordinate {
    pub x: f64,
    pub y: f64,
}

/// Puzzle corners normalized to `[0, 1]` of the image width and height.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SudokuDetectionResult {
    pub top_left: SudokuCoordinate,
    pub top_right: SudokuCoordinate,
    pub bottom_left: SudokuCoordinate,
    pub bottom_right: SudokuCoordinate,
}

/// Thresholded cell pixels, cell after cell in row-major order.
///
/// `data` is null (and the counts zero) when extraction failed.
#[repr(C)]
#[derive(Debug)]
pub struct SudokuGridBuffer {
    pub data: *mut i32,
    pub len: usize,
    pub cell_size: usize,
    pub cell_count: usize,
}

impl From<Coordinate> for SudokuCoordinate {
    fn from(c: Coordinate) -> Self {
        Self { x: c.x, y: c.y }
    }
}

impl From<SudokuCoordinate> for Coordinate {
    fn from(c: SudokuCoordinate) -> Self {
        Coordinate::new(c.x, c.y)
    }
}

impl From<DetectionResult> for SudokuDetectionResult {
    fn from(d: DetectionResult) -> Self {
        Self {
            top_left: d.top_left.into(),
            top_right: d.top_right.into(),
            bottom_left: d.bottom_left.into(),
            bottom_right: d.bottom_right.into(),
        }
    }
}

impl From<SudokuDetectionResult> for DetectionResult {
    fn from(d: SudokuDetectionResult) -> Self {
        Self {
            top_left: d.top_left.into(),
            top_right: d.top_right.into(),
            bottom_left: d.bottom_left.into(),
            bottom_right: d.bottom_right.into(),
        }
    }
}

impl SudokuGridBuffer {
    fn empty() -> Self {
        Self {
            data: ptr::null_mut(),
            len: 0,
            cell_size: 0,
            cell_count: 0,
        }
    }

    fn from_grid(grid: &Grid) -> Self {
        let values: Box<[i32]> = grid.to_flat_buffer().into_boxed_slice();
        let len = values.len();
        Self {
            data: Box::into_raw(values).cast::<i32>(),
            len,
            cell_size: grid.cell_size(),
            cell_count: grid.cells().len(),
        }
    }

    fn from_result(result: Result<Grid, ScanError>) -> Self {
        match result {
            Ok(grid) => Self::from_grid(&grid),
            Err(err) => {
                log::warn!("grid extraction failed: {err}");
                Self::empty()
            }
        }
    }
}

static MODEL: RwLock<Option<RecognizerConfig>> = RwLock::new(None);

/// Model configuration last set through [`sudoku_scan_set_model_path`].
pub fn model_config() -> Option<RecognizerConfig> {
    MODEL
        .read()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
        .clone()
}

/// Borrow a C path. `None` for null or non-UTF-8 input.
///
/// # Safety
/// `path` must be null or point to a NUL-terminated string valid for `'a`.
unsafe fn path_arg<'a>(path: *const c_char) -> Option<&'a Path> {
    if path.is_null() {
        log::warn!("null path");
        return None;
    }
    match CStr::from_ptr(path).to_str() {
        Ok(s) => Some(Path::new(s)),
        Err(err) => {
            log::warn!("path is not UTF-8: {err}");
            None
        }
    }
}

/// Locate the puzzle in the image at `path`.
///
/// Returns the full frame `{(0,0), (1,0), (0,1), (1,1)}` when the image
/// cannot be read or no outline is found.
///
/// # Safety
/// `path` must be null or a valid NUL-terminated string.
#[no_mangle]
pub unsafe extern "C" fn sudoku_scan_detect_grid(path: *const c_char) -> SudokuDetectionResult {
    let Some(path) = path_arg(path) else {
        return DetectionResult::full_frame().into();
    };
    match scan::detect_grid(path) {
        Ok(d) => d.into(),
        Err(err) => {
            log::warn!("grid detection failed: {err}");
            DetectionResult::full_frame().into()
        }
    }
}

/// Rectify the puzzle bounded by `corners` and return its 81 cells.
///
/// # Safety
/// `path` must be null or a valid NUL-terminated string.
#[no_mangle]
pub unsafe extern "C" fn sudoku_scan_extract_grid(
    path: *const c_char,
    corners: SudokuDetectionResult,
) -> SudokuGridBuffer {
    let Some(path) = path_arg(path) else {
        return SudokuGridBuffer::empty();
    };
    SudokuGridBuffer::from_result(scan::extract_grid(path, &corners.into()))
}

/// Detect and extract inside a `size_px` square centred horizontally and
/// moved up by `offset_px` from the vertical centre.
///
/// # Safety
/// `path` must be null or a valid NUL-terminated string.
#[no_mangle]
pub unsafe extern "C" fn sudoku_scan_extract_grid_from_roi_px(
    path: *const c_char,
    size_px: u32,
    offset_px: i32,
) -> SudokuGridBuffer {
    let Some(path) = path_arg(path) else {
        return SudokuGridBuffer::empty();
    };
    let roi = RoiSpec::Fixed { size_px, offset_px };
    SudokuGridBuffer::from_result(scan::extract_grid_from_roi(path, &roi))
}

/// Detect and extract inside a square sized relative to an
/// `aspect_ratio` (height / width) frame fitted to the image.
///
/// # Safety
/// `path` must be null or a valid NUL-terminated string.
#[no_mangle]
pub unsafe extern "C" fn sudoku_scan_extract_grid_from_roi_pct(
    path: *const c_char,
    size_pct: f64,
    offset_pct: f64,
    aspect_ratio: f64,
) -> SudokuGridBuffer {
    let Some(path) = path_arg(path) else {
        return SudokuGridBuffer::empty();
    };
    let roi = RoiSpec::Relative {
        size_pct,
        offset_pct,
        aspect_ratio,
    };
    SudokuGridBuffer::from_result(scan::extract_grid_from_roi(path, &roi))
}

/// Overwrite the image at `path` with its detection threshold.
///
/// # Safety
/// `path` must be null or a valid NUL-terminated string.
#[no_mangle]
pub unsafe extern "C" fn sudoku_scan_debug_grid_detection(path: *const c_char) -> bool {
    path_arg(path).is_some_and(|p| scan::debug_grid_detection(p))
}

/// Overwrite the image at `path` with its stitched thresholded cells.
///
/// # Safety
/// `path` must be null or a valid NUL-terminated string.
#[no_mangle]
pub unsafe extern "C" fn sudoku_scan_debug_grid_extraction(
    path: *const c_char,
    corners: SudokuDetectionResult,
) -> bool {
    path_arg(path).is_some_and(|p| scan::debug_grid_extraction(p, &corners.into()))
}

/// Remember the digit model location for the host's recognizer.
///
/// # Safety
/// `path` must be null or a valid NUL-terminated string.
#[no_mangle]
pub unsafe extern "C" fn sudoku_scan_set_model_path(path: *const c_char) {
    let Some(path) = path_arg(path) else {
        return;
    };
    let mut model = MODEL
        .write()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    *model = Some(RecognizerConfig::new(path));
}

/// Release a buffer returned by one of the extraction calls.
///
/// # Safety
/// `buffer` must come from this library and must not have been released.
/// Empty buffers are ignored.
#[no_mangle]
pub unsafe extern "C" fn sudoku_scan_grid_buffer_free(buffer: SudokuGridBuffer) {
    if buffer.data.is_null() {
        return;
    }
    let slice = ptr::slice_from_raw_parts_mut(buffer.data, buffer.len);
    drop(Box::from_raw(slice));
}
