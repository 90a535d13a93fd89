#![allow(dead_code)]

use nalgebra::Point2;
use std::path::{Path, PathBuf};
use sudoku_scan::core::{GridQuad, Homography};

pub const PAPER: u8 = 230;
pub const INK: u8 = 25;

/// Side of the canonical puzzle used for rendering; 40 px per cell.
const CANON: f32 = 360.0;
const CELL: f32 = CANON / 9.0;

/// Cells that carry a filled ink blob.
pub const INKED: [(usize, usize); 3] = [(0, 0), (4, 4), (8, 2)];

fn canonical_is_ink(u: f32, v: f32) -> bool {
    if !(0.0..=CANON).contains(&u) || !(0.0..=CANON).contains(&v) {
        return false;
    }
    let on_line = |t: f32| {
        let k = (t / CELL).round();
        let half = if k as i32 % 3 == 0 { 3.0 } else { 1.5 };
        (t - k * CELL).abs() < half
    };
    if on_line(u) || on_line(v) {
        return true;
    }
    let (col, row) = ((u / CELL) as usize, (v / CELL) as usize);
    let (du, dv) = (u - col as f32 * CELL, v - row as f32 * CELL);
    INKED.contains(&(row, col)) && (12.0..28.0).contains(&du) && (12.0..28.0).contains(&dv)
}

/// Paper-colored `width × height` image with a puzzle whose outer corners
/// land on `corners` (top-left, top-right, bottom-left, bottom-right).
pub fn render_puzzle(width: u32, height: u32, corners: [(f32, f32); 4]) -> image::GrayImage {
    let quad = GridQuad::new(corners.map(|(x, y)| Point2::new(x, y)));
    let h_canon_from_img = Homography::square_to_quad(CANON, &quad)
        .and_then(|h| h.inverse())
        .expect("renderable quad");

    image::GrayImage::from_fn(width, height, |x, y| {
        let p = h_canon_from_img.apply(Point2::new(x as f32 + 0.5, y as f32 + 0.5));
        image::Luma([if canonical_is_ink(p.x, p.y) { INK } else { PAPER }])
    })
}

/// Axis-aligned puzzle spanning `[x0, x0 + side] × [y0, y0 + side]`.
pub fn square_corners(x0: f32, y0: f32, side: f32) -> [(f32, f32); 4] {
    [
        (x0, y0),
        (x0 + side, y0),
        (x0, y0 + side),
        (x0 + side, y0 + side),
    ]
}

pub fn write_png(dir: &Path, name: &str, img: &image::GrayImage) -> PathBuf {
    let path = dir.join(name);
    img.save(&path).expect("write png");
    path
}

/// Pixel distance between a normalized coordinate and an expected pixel position.
pub fn pixel_error(c: sudoku_scan::Coordinate, expect: (f32, f32), w: u32, h: u32) -> f64 {
    let dx = c.x * w as f64 - expect.0 as f64;
    let dy = c.y * h as f64 - expect.1 as f64;
    (dx * dx + dy * dy).sqrt()
}
