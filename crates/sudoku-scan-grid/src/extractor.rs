use crate::grid::{Cell, Grid, GRID_SIZE};
use crate::params::GridExtractorParams;
use nalgebra::Matrix3;
use sudoku_scan_core::{
    adaptive_threshold, warp_perspective_gray, GrayImage, GrayImageView, GridQuad, Homography,
    QuadError, RoiRect,
};

#[cfg(feature = "tracing")]
use tracing::instrument;

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum ExtractError {
    #[error("invalid grid corners: {0}")]
    InvalidCorners(#[from] QuadError),
    #[error("image is empty")]
    EmptyImage,
    #[error("homography estimation failed")]
    HomographyFailed,
    #[error("rectified size {rectified_size} leaves no pixels with a {cell_inset_px} px inset")]
    InvalidParams {
        rectified_size: usize,
        cell_inset_px: usize,
    },
}

/// The puzzle warped onto an axis-aligned square.
#[derive(Clone, Debug)]
pub struct RectifiedGrid {
    pub gray: GrayImage,
    pub binary: GrayImage,
    /// Maps rectified pixel coordinates back into the source image.
    pub h_img_from_rect: Homography,
    pub side: usize,
}

/// Rectifies a puzzle outline and cuts it into 81 cells.
#[derive(Clone, Debug, Default)]
pub struct GridExtractor {
    params: GridExtractorParams,
}

impl GridExtractor {
    pub fn new(params: GridExtractorParams) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &GridExtractorParams {
        &self.params
    }

    /// Validate the corners, rectify and segment.
    #[cfg_attr(
        feature = "tracing",
        instrument(level = "info", skip(self, img, quad), fields(width = img.width, height = img.height))
    )]
    pub fn extract(&self, img: &GrayImageView<'_>, quad: &GridQuad) -> Result<Grid, ExtractError> {
        quad.validate()?;
        let rectified = self.warp(img, quad)?;
        self.segment(&rectified)
    }

    /// Rectify `quad` without checking the corner ordering.
    pub fn warp(
        &self,
        img: &GrayImageView<'_>,
        quad: &GridQuad,
    ) -> Result<RectifiedGrid, ExtractError> {
        self.check_params()?;
        if img.is_empty() {
            return Err(ExtractError::EmptyImage);
        }

        let side = self.params.rectified_size;
        let h_img_from_rect =
            Homography::square_to_quad(side as f32, quad).ok_or(ExtractError::HomographyFailed)?;
        let gray = warp_perspective_gray(img, h_img_from_rect, side, side);
        let binary = adaptive_threshold(&gray.view(), &self.params.threshold);
        log::debug!("rectified puzzle to {side}x{side}");

        Ok(RectifiedGrid {
            gray,
            binary,
            h_img_from_rect,
            side,
        })
    }

    /// Black rectified square with a zero transform.
    ///
    /// Stands in for [`Self::warp`] when the corners admit no homography.
    pub fn blank(&self) -> Result<RectifiedGrid, ExtractError> {
        self.check_params()?;
        let side = self.params.rectified_size;
        let gray = GrayImage::new(side, side);
        let binary = adaptive_threshold(&gray.view(), &self.params.threshold);
        Ok(RectifiedGrid {
            gray,
            binary,
            h_img_from_rect: Homography::new(Matrix3::zeros()),
            side,
        })
    }

    /// Cut a rectified square into row-major cells with the configured inset.
    pub fn segment(&self, rectified: &RectifiedGrid) -> Result<Grid, ExtractError> {
        let lattice = rectified.side / GRID_SIZE;
        let inset = self.params.cell_inset_px;
        let size = lattice.saturating_sub(2 * inset);
        if size == 0 {
            return Err(self.invalid_params());
        }

        let binary = rectified.binary.view();
        let gray = rectified.gray.view();
        let mut cells = Vec::with_capacity(GRID_SIZE * GRID_SIZE);
        for row in 0..GRID_SIZE {
            for col in 0..GRID_SIZE {
                let window = RoiRect {
                    x: col * lattice + inset,
                    y: row * lattice + inset,
                    width: size,
                    height: size,
                };
                cells.push(Cell {
                    row,
                    col,
                    binary: binary.crop(window),
                    gray: gray.crop(window),
                });
            }
        }

        Grid::from_cells(size, cells).ok_or_else(|| self.invalid_params())
    }

    fn check_params(&self) -> Result<(), ExtractError> {
        if self.params.cell_size() == 0 {
            return Err(self.invalid_params());
        }
        Ok(())
    }

    fn invalid_params(&self) -> ExtractError {
        ExtractError::InvalidParams {
            rectified_size: self.params.rectified_size,
            cell_inset_px: self.params.cell_inset_px,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detector::tests::draw_lattice;
    use crate::CELL_COUNT;
    use nalgebra::Point2;
    use sudoku_scan_core::CornerRole;

    fn lattice_quad() -> GridQuad {
        GridQuad::new([
            Point2::new(40.0, 30.0),
            Point2::new(190.0, 30.0),
            Point2::new(40.0, 180.0),
            Point2::new(190.0, 180.0),
        ])
    }

    #[test]
    fn always_yields_81_cells_of_configured_size() {
        let img = draw_lattice(240, 200, 40, 30, 150);
        for (size, inset, expect) in [(450, 5, 40), (270, 3, 24), (90, 1, 8)] {
            let ext = GridExtractor::new(GridExtractorParams {
                rectified_size: size,
                cell_inset_px: inset,
                ..GridExtractorParams::default()
            });
            let grid = ext.extract(&img.view(), &lattice_quad()).expect("extract");
            assert_eq!(grid.cells().len(), CELL_COUNT);
            assert_eq!(grid.cell_size(), expect);
            assert_eq!(grid.to_flat_buffer().len(), CELL_COUNT * expect * expect);
        }
    }

    #[test]
    fn cell_interiors_are_paper() {
        let img = draw_lattice(240, 200, 40, 30, 150);
        let grid = GridExtractor::default()
            .extract(&img.view(), &lattice_quad())
            .expect("extract");
        for cell in grid.cells() {
            let c = grid.cell_size() / 2;
            assert_eq!(cell.binary.get(c, c), 255, "cell {},{}", cell.row, cell.col);
        }
    }

    #[test]
    fn misordered_corners_are_rejected() {
        let img = draw_lattice(240, 200, 40, 30, 150);
        let q = lattice_quad();
        let swapped = GridQuad::new([
            q[CornerRole::TopRight],
            q[CornerRole::TopLeft],
            q[CornerRole::BottomLeft],
            q[CornerRole::BottomRight],
        ]);
        let err = GridExtractor::default()
            .extract(&img.view(), &swapped)
            .unwrap_err();
        assert!(matches!(
            err,
            ExtractError::InvalidCorners(QuadError::Misordered { .. })
        ));
    }

    #[test]
    fn warp_skips_ordering_checks() {
        let img = draw_lattice(240, 200, 40, 30, 150);
        let q = lattice_quad();
        let swapped = GridQuad::new([
            q[CornerRole::TopRight],
            q[CornerRole::TopLeft],
            q[CornerRole::BottomRight],
            q[CornerRole::BottomLeft],
        ]);
        let ext = GridExtractor::default();
        let rect = ext.warp(&img.view(), &swapped).expect("mirrored warp");
        assert_eq!(ext.segment(&rect).expect("segment").cells().len(), CELL_COUNT);
    }

    #[test]
    fn collapsed_corners_fail_warp_but_blank_segments() {
        let img = draw_lattice(240, 200, 40, 30, 150);
        let p = Point2::new(120.0, 100.0);
        let ext = GridExtractor::default();
        assert_eq!(
            ext.warp(&img.view(), &GridQuad::new([p; 4])).unwrap_err(),
            ExtractError::HomographyFailed
        );

        let blank = ext.blank().expect("valid params");
        assert_eq!(blank.side, 450);
        assert!(blank.gray.data.iter().all(|&v| v == 0));
        assert_eq!(ext.segment(&blank).expect("segment").cells().len(), CELL_COUNT);
    }

    #[test]
    fn repeated_extraction_is_identical() {
        let img = draw_lattice(240, 200, 40, 30, 150);
        let ext = GridExtractor::default();
        let a = ext.extract(&img.view(), &lattice_quad()).expect("first");
        let b = ext.extract(&img.view(), &lattice_quad()).expect("second");
        assert_eq!(a.to_flat_buffer(), b.to_flat_buffer());
    }

    #[test]
    fn zero_cell_size_is_a_parameter_error() {
        let img = draw_lattice(240, 200, 40, 30, 150);
        let ext = GridExtractor::new(GridExtractorParams {
            rectified_size: 90,
            cell_inset_px: 5,
            ..GridExtractorParams::default()
        });
        assert!(matches!(
            ext.extract(&img.view(), &lattice_quad()),
            Err(ExtractError::InvalidParams { .. })
        ));
    }
}
