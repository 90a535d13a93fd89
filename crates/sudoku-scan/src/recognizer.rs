//! Digit recognition seam.
//!
//! No model ships with this crate. Hosts implement [`DigitRecognizer`] on
//! top of whatever inference runtime they use and pass the model location
//! through [`RecognizerConfig`].

use crate::grid::{Cell, Grid, GRID_SIZE};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Where a recognizer finds its model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecognizerConfig {
    pub model_path: PathBuf,
}

impl RecognizerConfig {
    pub fn new(model_path: impl Into<PathBuf>) -> Self {
        Self {
            model_path: model_path.into(),
        }
    }

    pub fn model_path(&self) -> &Path {
        &self.model_path
    }
}

/// Classifies a single cell.
pub trait DigitRecognizer {
    /// Digit 1..=9 printed in `cell`, or `None` for an empty cell.
    fn recognize_cell(&self, cell: &Cell) -> Option<u8>;
}

impl<R: DigitRecognizer + ?Sized> DigitRecognizer for &R {
    fn recognize_cell(&self, cell: &Cell) -> Option<u8> {
        (**self).recognize_cell(cell)
    }
}

/// Run `recognizer` over every cell; empty cells and out-of-range answers are 0.
pub fn recognize_grid<R: DigitRecognizer + ?Sized>(recognizer: &R, grid: &Grid) -> [[u8; 9]; 9] {
    let mut board = [[0u8; GRID_SIZE]; GRID_SIZE];
    for cell in grid.cells() {
        let digit = recognizer
            .recognize_cell(cell)
            .filter(|d| (1..=9).contains(d))
            .unwrap_or(0);
        board[cell.row][cell.col] = digit;
    }
    board
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::GrayImage;
    use crate::grid::CELL_COUNT;

    /// Reports `row + 1` on the diagonal, 12 on one off-diagonal cell.
    struct Diagonal;

    impl DigitRecognizer for Diagonal {
        fn recognize_cell(&self, cell: &Cell) -> Option<u8> {
            match (cell.row, cell.col) {
                (r, c) if r == c => Some(r as u8 + 1),
                (0, 1) => Some(12),
                _ => None,
            }
        }
    }

    fn blank_grid() -> Grid {
        let cells = (0..CELL_COUNT)
            .map(|i| Cell {
                row: i / GRID_SIZE,
                col: i % GRID_SIZE,
                binary: GrayImage::new(2, 2),
                gray: GrayImage::new(2, 2),
            })
            .collect();
        Grid::from_cells(2, cells).expect("grid")
    }

    #[test]
    fn board_follows_cell_positions() {
        let board = recognize_grid(&Diagonal, &blank_grid());
        for (r, row) in board.iter().enumerate() {
            assert_eq!(row[r], r as u8 + 1);
        }
        assert_eq!(board[0][1], 0, "out-of-range digit is dropped");
        assert_eq!(board[8][0], 0);
    }

    #[test]
    fn config_keeps_model_path() {
        let cfg = RecognizerConfig::new("/models/digits.tflite");
        assert_eq!(cfg.model_path(), Path::new("/models/digits.tflite"));
    }
}
