use std::{env, path::PathBuf};

use image::ImageReader;
use sudoku_scan_core::{init_with_level, GrayImageView};
use sudoku_scan_grid::{stitch_cells, CellLayer, GridDetector, GridExtractor};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_with_level(log::LevelFilter::Debug)?;

    let mut args = env::args().skip(1);
    let input = args
        .next()
        .map(PathBuf::from)
        .ok_or("usage: rectify_grid <image> [output.png]")?;
    let output = args
        .next()
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("cells.png"));

    let img = ImageReader::open(&input)?.decode()?.to_luma8();
    let view = GrayImageView {
        width: img.width() as usize,
        height: img.height() as usize,
        data: img.as_raw(),
    };

    let found = GridDetector::default().detect(&view)?;
    log::info!("corners via {:?}: {:?}", found.source, found.quad.points());

    let grid = GridExtractor::default().extract(&view, &found.quad)?;
    let stitched = stitch_cells(&grid, CellLayer::Binary);
    image::GrayImage::from_raw(stitched.width as u32, stitched.height as u32, stitched.data)
        .ok_or("stitched buffer does not match its size")?
        .save(&output)?;
    println!("wrote {} cells to {}", grid.cells().len(), output.display());
    Ok(())
}
