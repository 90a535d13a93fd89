//! Debug stitching of cells back into a single image.

use sudoku_scan_core::GrayImage;

use crate::{Grid, GRID_SIZE};

/// Which raster of each cell to stitch.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum CellLayer {
    #[default]
    Binary,
    Gray,
}

/// Place every cell at its row/column in a `9c × 9c` image with no gaps.
pub fn stitch_cells(grid: &Grid, layer: CellLayer) -> GrayImage {
    let c = grid.cell_size();
    let side = c * GRID_SIZE;
    let mut out = GrayImage::new(side, side);

    for cell in grid.cells() {
        let src = match layer {
            CellLayer::Binary => &cell.binary,
            CellLayer::Gray => &cell.gray,
        };
        let x0 = cell.col * c;
        let y0 = cell.row * c;
        for y in 0..c {
            let dst = (y0 + y) * side + x0;
            out.data[dst..dst + c].copy_from_slice(&src.data[y * c..(y + 1) * c]);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::uniform_cells;
    use crate::CELL_COUNT;

    #[test]
    fn stitched_image_keeps_row_major_layout() {
        let grid = Grid::from_cells(3, uniform_cells(3)).expect("grid");
        let out = stitch_cells(&grid, CellLayer::Binary);

        assert_eq!((out.width, out.height), (27, 27));
        assert_eq!(out.data.len(), CELL_COUNT * 9);
        // Cell (row 2, col 4) has value 22 and starts at (12, 6).
        assert_eq!(out.get(12, 6), 22);
        assert_eq!(out.get(14, 8), 22);
        assert_eq!(out.get(26, 26), 80);
    }

    #[test]
    fn gray_layer_is_selectable() {
        let mut cells = uniform_cells(2);
        cells[0].gray.data.fill(200);
        let grid = Grid::from_cells(2, cells).expect("grid");
        assert_eq!(stitch_cells(&grid, CellLayer::Gray).get(0, 0), 200);
        assert_eq!(stitch_cells(&grid, CellLayer::Binary).get(0, 0), 0);
    }
}
