use sudoku_scan_core::GrayImage;

/// Cells per grid side.
pub const GRID_SIZE: usize = 9;
/// Cells per grid.
pub const CELL_COUNT: usize = GRID_SIZE * GRID_SIZE;

/// One square cell cut from the rectified grid.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Cell {
    pub row: usize,
    pub col: usize,
    /// Thresholded pixels (0 = ink, 255 = paper).
    pub binary: GrayImage,
    /// Rectified grayscale pixels of the same window.
    pub gray: GrayImage,
}

impl Cell {
    /// Row-major index of this cell within the grid.
    pub fn index(&self) -> usize {
        self.row * GRID_SIZE + self.col
    }
}

/// The 81 cells of a puzzle, row-major, row 0 at the top.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Grid {
    cell_size: usize,
    cells: Vec<Cell>,
}

impl Grid {
    /// Assemble a grid, checking the cell count, placement and size.
    pub fn from_cells(cell_size: usize, cells: Vec<Cell>) -> Option<Self> {
        if cells.len() != CELL_COUNT {
            return None;
        }
        let consistent = cells.iter().enumerate().all(|(i, c)| {
            c.index() == i
                && c.binary.width == cell_size
                && c.binary.height == cell_size
                && c.gray.width == cell_size
                && c.gray.height == cell_size
        });
        consistent.then_some(Self { cell_size, cells })
    }

    pub fn cell_size(&self) -> usize {
        self.cell_size
    }

    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    pub fn cell(&self, row: usize, col: usize) -> Option<&Cell> {
        if row >= GRID_SIZE || col >= GRID_SIZE {
            return None;
        }
        self.cells.get(row * GRID_SIZE + col)
    }

    pub fn into_cells(self) -> Vec<Cell> {
        self.cells
    }

    /// Thresholded pixels of all cells as one buffer: cell after cell in
    /// row-major order, each cell's pixels row-major.
    pub fn to_flat_buffer(&self) -> Vec<i32> {
        let mut out = Vec::with_capacity(CELL_COUNT * self.cell_size * self.cell_size);
        for cell in &self.cells {
            out.extend(cell.binary.data.iter().map(|&v| v as i32));
        }
        out
    }
}

#[cfg(test)]
pub(crate) fn uniform_cells(cell_size: usize) -> Vec<Cell> {
    (0..CELL_COUNT)
        .map(|i| {
            let mut binary = GrayImage::new(cell_size, cell_size);
            binary.data.fill(i as u8);
            Cell {
                row: i / GRID_SIZE,
                col: i % GRID_SIZE,
                gray: binary.clone(),
                binary,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_wrong_cell_count() {
        let mut cells = uniform_cells(4);
        cells.pop();
        assert!(Grid::from_cells(4, cells).is_none());
    }

    #[test]
    fn rejects_cells_out_of_order() {
        let mut cells = uniform_cells(4);
        cells.swap(0, 1);
        assert!(Grid::from_cells(4, cells).is_none());
    }

    #[test]
    fn flat_buffer_is_cell_major() {
        let grid = Grid::from_cells(2, uniform_cells(2)).expect("grid");
        let flat = grid.to_flat_buffer();
        assert_eq!(flat.len(), CELL_COUNT * 4);
        assert_eq!(&flat[..4], &[0, 0, 0, 0]);
        assert_eq!(&flat[4 * 10..4 * 11], &[10, 10, 10, 10]);
        assert_eq!(grid.cell(1, 1).map(Cell::index), Some(10));
        assert!(grid.cell(9, 0).is_none());
    }
}
