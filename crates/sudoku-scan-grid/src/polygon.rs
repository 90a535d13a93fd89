//! Closed-polygon helpers for contour analysis.

use image::GrayImage as RasterImage;
use imageproc::contours::{find_contours, BorderType};
use nalgebra::Point2;
use sudoku_scan_core::{CornerRole, GrayImage, GridQuad};

/// Outer borders of the foreground regions in a 0/255 image.
///
/// The raster is traced inside a one-pixel background frame so regions
/// touching the image border still get an outer contour. Points are
/// reported in the coordinates of `binary`.
///
/// Returns `None` when the buffer does not match its declared size.
pub(crate) fn outer_contours(binary: &GrayImage) -> Option<Vec<Vec<Point2<f32>>>> {
    let (w, h) = (binary.width, binary.height);
    if binary.data.len() != w * h {
        return None;
    }
    let stride = w + 2;
    let mut padded = vec![0u8; stride * (h + 2)];
    for (y, row) in binary.data.chunks_exact(w.max(1)).take(h).enumerate() {
        let start = (y + 1) * stride + 1;
        padded[start..start + w].copy_from_slice(row);
    }
    let raster = RasterImage::from_raw(stride as u32, (h + 2) as u32, padded)?;

    let contours = find_contours::<u32>(&raster)
        .into_iter()
        .filter(|c| c.border_type == BorderType::Outer)
        .map(|c| {
            c.points
                .into_iter()
                .map(|p| Point2::new(p.x as f32 - 1.0, p.y as f32 - 1.0))
                .collect()
        })
        .collect();
    Some(contours)
}

/// Absolute shoelace area of a closed polygon.
pub(crate) fn polygon_area(points: &[Point2<f32>]) -> f32 {
    if points.len() < 3 {
        return 0.0;
    }
    let mut acc = 0.0f64;
    for (i, a) in points.iter().enumerate() {
        let b = points[(i + 1) % points.len()];
        acc += a.x as f64 * b.y as f64 - b.x as f64 * a.y as f64;
    }
    (acc.abs() * 0.5) as f32
}

/// Length of the closed outline.
pub(crate) fn perimeter(points: &[Point2<f32>]) -> f32 {
    if points.len() < 2 {
        return 0.0;
    }
    points
        .iter()
        .enumerate()
        .map(|(i, &a)| (points[(i + 1) % points.len()] - a).norm())
        .sum()
}

fn distance_to_line(p: Point2<f32>, a: Point2<f32>, b: Point2<f32>) -> f32 {
    let ab = b - a;
    let len = ab.norm();
    if len < f32::EPSILON {
        return (p - a).norm();
    }
    let ap = p - a;
    (ab.x * ap.y - ab.y * ap.x).abs() / len
}

fn farthest_from(points: &[Point2<f32>], origin: Point2<f32>) -> usize {
    let mut best = 0;
    let mut best_d = -1.0f32;
    for (i, &p) in points.iter().enumerate() {
        let d = (p - origin).norm_squared();
        if d > best_d {
            best_d = d;
            best = i;
        }
    }
    best
}

/// Douglas–Peucker on `ring[first..=last]`, marking kept indices.
fn simplify_chain(ring: &[Point2<f32>], first: usize, last: usize, eps: f32, keep: &mut [bool]) {
    let mut stack = vec![(first, last)];
    while let Some((s, e)) = stack.pop() {
        if e <= s + 1 {
            continue;
        }
        let mut split = s;
        let mut max_d = 0.0f32;
        for i in s + 1..e {
            let d = distance_to_line(ring[i], ring[s], ring[e]);
            if d > max_d {
                max_d = d;
                split = i;
            }
        }
        if max_d > eps {
            keep[split] = true;
            stack.push((s, split));
            stack.push((split, e));
        }
    }
}

/// Simplify a closed contour to a polygon whose edges stay within `eps`.
///
/// The two anchors are the mutually farthest contour points, so the result
/// does not depend on where the tracer started the contour. A final pass
/// drops vertices that are within `eps` of the line through their
/// neighbours.
pub(crate) fn approximate_polygon(points: &[Point2<f32>], eps: f32) -> Vec<Point2<f32>> {
    let n = points.len();
    if n < 3 {
        return points.to_vec();
    }

    let a = farthest_from(points, points[0]);
    let b = farthest_from(points, points[a]);
    if a == b {
        return vec![points[a]];
    }

    // Rotate so the ring starts at `a`, and close it.
    let mut ring: Vec<Point2<f32>> = points[a..].iter().chain(&points[..a]).copied().collect();
    ring.push(points[a]);
    let mid = (b + n - a) % n;

    let mut keep = vec![false; ring.len()];
    keep[0] = true;
    keep[mid] = true;
    simplify_chain(&ring, 0, mid, eps, &mut keep);
    simplify_chain(&ring, mid, n, eps, &mut keep);

    let mut poly: Vec<Point2<f32>> = (0..n).filter(|&i| keep[i]).map(|i| ring[i]).collect();

    while poly.len() > 3 {
        let m = poly.len();
        let (idx, d) = (0..m)
            .map(|i| {
                let prev = poly[(i + m - 1) % m];
                let next = poly[(i + 1) % m];
                (i, distance_to_line(poly[i], prev, next))
            })
            .min_by(|x, y| x.1.total_cmp(&y.1))
            .unwrap_or((0, f32::INFINITY));
        if d >= eps {
            break;
        }
        poly.remove(idx);
    }
    poly
}

/// True when all turns of the closed polygon have the same, non-zero sign.
pub(crate) fn is_convex(points: &[Point2<f32>]) -> bool {
    let n = points.len();
    if n < 3 {
        return false;
    }
    let mut sign = 0.0f32;
    for i in 0..n {
        let a = points[i];
        let b = points[(i + 1) % n];
        let c = points[(i + 2) % n];
        let cross = (b.x - a.x) * (c.y - b.y) - (b.y - a.y) * (c.x - b.x);
        if cross == 0.0 {
            return false;
        }
        if sign == 0.0 {
            sign = cross.signum();
        } else if cross.signum() != sign {
            return false;
        }
    }
    true
}

/// Corner estimate from the extreme points of a contour along the diagonals.
pub(crate) fn extreme_corners(points: &[Point2<f32>]) -> Option<GridQuad> {
    let first = *points.first()?;
    let mut out = [first; 4];
    let (mut min_sum, mut max_sum) = (f32::INFINITY, f32::NEG_INFINITY);
    let (mut min_diff, mut max_diff) = (f32::INFINITY, f32::NEG_INFINITY);
    for &p in points {
        let sum = p.x + p.y;
        let diff = p.y - p.x;
        if sum < min_sum {
            min_sum = sum;
            out[CornerRole::TopLeft as usize] = p;
        }
        if sum > max_sum {
            max_sum = sum;
            out[CornerRole::BottomRight as usize] = p;
        }
        if diff < min_diff {
            min_diff = diff;
            out[CornerRole::TopRight as usize] = p;
        }
        if diff > max_diff {
            max_diff = diff;
            out[CornerRole::BottomLeft as usize] = p;
        }
    }
    Some(GridQuad::new(out))
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Every integer point along the outline of an axis-aligned rectangle,
    /// starting mid-way along the top edge.
    fn rect_outline(x0: i32, y0: i32, x1: i32, y1: i32) -> Vec<Point2<f32>> {
        let mut pts = Vec::new();
        let mid = (x0 + x1) / 2;
        for x in mid..x1 {
            pts.push((x, y0));
        }
        for y in y0..y1 {
            pts.push((x1, y));
        }
        for x in (x0 + 1..=x1).rev() {
            pts.push((x, y1));
        }
        for y in (y0 + 1..=y1).rev() {
            pts.push((x0, y));
        }
        for x in x0..mid {
            pts.push((x, y0));
        }
        pts.into_iter()
            .map(|(x, y)| Point2::new(x as f32, y as f32))
            .collect()
    }

    #[test]
    fn rectangle_outline_simplifies_to_four_corners() {
        let outline = rect_outline(10, 20, 110, 80);
        let eps = 0.02 * perimeter(&outline);
        let poly = approximate_polygon(&outline, eps);
        assert_eq!(poly.len(), 4, "got {poly:?}");
        assert!(is_convex(&poly));

        let quad = GridQuad::from_unordered([poly[0], poly[1], poly[2], poly[3]]);
        assert_eq!(quad[CornerRole::TopLeft], Point2::new(10.0, 20.0));
        assert_eq!(quad[CornerRole::BottomRight], Point2::new(110.0, 80.0));
    }

    #[test]
    fn shoelace_area_and_perimeter() {
        let square = [
            Point2::new(0.0, 0.0),
            Point2::new(4.0, 0.0),
            Point2::new(4.0, 3.0),
            Point2::new(0.0, 3.0),
        ];
        assert_eq!(polygon_area(&square), 12.0);
        assert_eq!(perimeter(&square), 14.0);
    }

    #[test]
    fn arrowhead_is_not_convex() {
        let arrow = [
            Point2::new(0.0, 0.0),
            Point2::new(10.0, 5.0),
            Point2::new(0.0, 10.0),
            Point2::new(3.0, 5.0),
        ];
        assert!(!is_convex(&arrow));
    }

    #[test]
    fn extremes_pick_diagonal_corners() {
        let outline = rect_outline(5, 5, 50, 40);
        let quad = extreme_corners(&outline).expect("non-empty");
        assert_eq!(quad[CornerRole::TopLeft], Point2::new(5.0, 5.0));
        assert_eq!(quad[CornerRole::TopRight], Point2::new(50.0, 5.0));
        assert_eq!(quad[CornerRole::BottomLeft], Point2::new(5.0, 40.0));
        assert_eq!(quad[CornerRole::BottomRight], Point2::new(50.0, 40.0));
        assert!(extreme_corners(&[]).is_none());
    }

    #[test]
    fn outer_contours_skip_holes() {
        let mut img = GrayImage::new(30, 30);
        for y in 5..25 {
            for x in 5..25 {
                let border = x < 8 || x >= 22 || y < 8 || y >= 22;
                if border {
                    img.set(x, y, 255);
                }
            }
        }
        let contours = outer_contours(&img).expect("valid raster");
        assert_eq!(contours.len(), 1);
        approx::assert_abs_diff_eq!(polygon_area(&contours[0]), 19.0 * 19.0, epsilon = 1.0);
    }

    #[test]
    fn regions_touching_the_border_are_traced() {
        let mut img = GrayImage::new(20, 20);
        for y in 0..20 {
            for x in 0..6 {
                img.set(x, y, 255);
            }
        }
        let contours = outer_contours(&img).expect("valid raster");
        assert_eq!(contours.len(), 1);
        let xs = contours[0].iter().map(|p| p.x);
        assert_eq!(xs.clone().fold(f32::INFINITY, f32::min), 0.0);
        assert_eq!(xs.fold(f32::NEG_INFINITY, f32::max), 5.0);
        assert!(contours[0].iter().all(|p| (0.0..20.0).contains(&p.y)));
    }
}
