use crate::quad::GridQuad;
use crate::{sample_bilinear_u8, GrayImage, GrayImageView};
use nalgebra::{Matrix3, Point2, SMatrix, SVector, Vector3};

/// 3x3 projective transform, normalized so that `h[(2, 2)] == 1`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Homography {
    pub h: Matrix3<f64>,
}

impl Homography {
    pub fn new(h: Matrix3<f64>) -> Self {
        Self { h }
    }

    #[inline]
    pub fn apply(&self, p: Point2<f32>) -> Point2<f32> {
        let v = self.h * Vector3::new(p.x as f64, p.y as f64, 1.0);
        let w = v[2];
        Point2::new((v[0] / w) as f32, (v[1] / w) as f32)
    }

    pub fn inverse(&self) -> Option<Self> {
        self.h.try_inverse().map(Self::new)
    }

    /// Map the axis-aligned square `[0, side]²` onto `quad`.
    ///
    /// Square corners are paired with the quad roles in storage order
    /// (top-left, top-right, bottom-left, bottom-right).
    pub fn square_to_quad(side: f32, quad: &GridQuad) -> Option<Self> {
        let square = [
            Point2::new(0.0, 0.0),
            Point2::new(side, 0.0),
            Point2::new(0.0, side),
            Point2::new(side, side),
        ];
        homography_from_4pt(&square, quad.points())
    }
}

fn hartley_normalization(cx: f64, cy: f64, mean_dist: f64) -> Matrix3<f64> {
    let s = if mean_dist > 1e-12 {
        (2.0_f64).sqrt() / mean_dist
    } else {
        1.0
    };

    Matrix3::<f64>::new(s, 0.0, -s * cx, 0.0, s, -s * cy, 0.0, 0.0, 1.0)
}

// Translate to the centroid and scale so the mean distance is sqrt(2).
fn normalize_points4(pts: &[Point2<f32>; 4]) -> ([Point2<f64>; 4], Matrix3<f64>) {
    let cx = pts.iter().map(|p| p.x as f64).sum::<f64>() / 4.0;
    let cy = pts.iter().map(|p| p.y as f64).sum::<f64>() / 4.0;
    let mean_dist = pts
        .iter()
        .map(|p| (p.x as f64 - cx).hypot(p.y as f64 - cy))
        .sum::<f64>()
        / 4.0;

    let t = hartley_normalization(cx, cy, mean_dist);
    let out = pts.map(|p| {
        let v = t * Vector3::new(p.x as f64, p.y as f64, 1.0);
        Point2::new(v[0], v[1])
    });
    (out, t)
}

fn normalize_homography(h: Matrix3<f64>) -> Option<Matrix3<f64>> {
    let s = h[(2, 2)];
    if s.abs() < 1e-12 {
        return None;
    }
    Some(h / s)
}

/// Compute H such that `dst ~ H * src` from four point correspondences.
///
/// Returns `None` for degenerate configurations (three collinear points,
/// repeated points).
pub fn homography_from_4pt(src: &[Point2<f32>; 4], dst: &[Point2<f32>; 4]) -> Option<Homography> {
    // Unknowns: [h11 h12 h13 h21 h22 h23 h31 h32], with h33 = 1
    // h11 x + h12 y + h13 - u h31 x - u h32 y = u
    // h21 x + h22 y + h23 - v h31 x - v h32 y = v
    let (src_n, t_src) = normalize_points4(src);
    let (dst_n, t_dst) = normalize_points4(dst);

    let mut a = SMatrix::<f64, 8, 8>::zeros();
    let mut b = SVector::<f64, 8>::zeros();

    for k in 0..4 {
        let (x, y) = (src_n[k].x, src_n[k].y);
        let (u, v) = (dst_n[k].x, dst_n[k].y);

        let r0 = 2 * k;
        a[(r0, 0)] = x;
        a[(r0, 1)] = y;
        a[(r0, 2)] = 1.0;
        a[(r0, 6)] = -u * x;
        a[(r0, 7)] = -u * y;
        b[r0] = u;

        let r1 = 2 * k + 1;
        a[(r1, 3)] = x;
        a[(r1, 4)] = y;
        a[(r1, 5)] = 1.0;
        a[(r1, 6)] = -v * x;
        a[(r1, 7)] = -v * y;
        b[r1] = v;
    }

    let x = a.lu().solve(&b)?;
    if x.iter().any(|v| !v.is_finite()) {
        return None;
    }

    let hn = Matrix3::<f64>::new(
        x[0], x[1], x[2], //
        x[3], x[4], x[5], //
        x[6], x[7], 1.0,
    );

    // H = T_dst^{-1} * Hn * T_src
    let h_den = t_dst.try_inverse()? * hn * t_src;
    normalize_homography(h_den).map(Homography::new)
}

/// Resample `src` into an `out_w × out_h` raster.
///
/// Every output pixel center is mapped through `h_src_from_out` and sampled
/// bilinearly; samples outside `src` read as black.
#[cfg_attr(
    feature = "tracing",
    tracing::instrument(level = "debug", skip(src, h_src_from_out))
)]
pub fn warp_perspective_gray(
    src: &GrayImageView<'_>,
    h_src_from_out: Homography,
    out_w: usize,
    out_h: usize,
) -> GrayImage {
    let mut out = GrayImage::new(out_w, out_h);
    for y in 0..out_h {
        for x in 0..out_w {
            let p = h_src_from_out.apply(Point2::new(x as f32 + 0.5, y as f32 + 0.5));
            out.data[y * out_w + x] = sample_bilinear_u8(src, p.x, p.y);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(a: Point2<f32>, b: Point2<f32>, tol: f32) {
        assert!(
            (a.x - b.x).abs() < tol && (a.y - b.y).abs() < tol,
            "expected ({:.4},{:.4}) ~ ({:.4},{:.4}) within {}",
            a.x,
            a.y,
            b.x,
            b.y,
            tol
        );
    }

    #[test]
    fn square_maps_onto_quad_corners() {
        let quad = GridQuad::new([
            Point2::new(112.0, 95.0),
            Point2::new(498.0, 120.0),
            Point2::new(90.0, 470.0),
            Point2::new(520.0, 505.0),
        ]);
        let h = Homography::square_to_quad(450.0, &quad).expect("homography");

        assert_close(h.apply(Point2::new(0.0, 0.0)), quad.points()[0], 1e-2);
        assert_close(h.apply(Point2::new(450.0, 0.0)), quad.points()[1], 1e-2);
        assert_close(h.apply(Point2::new(0.0, 450.0)), quad.points()[2], 1e-2);
        assert_close(h.apply(Point2::new(450.0, 450.0)), quad.points()[3], 1e-2);
    }

    #[test]
    fn inverse_round_trips_points() {
        let quad = GridQuad::new([
            Point2::new(10.0, 12.0),
            Point2::new(200.0, 30.0),
            Point2::new(15.0, 220.0),
            Point2::new(230.0, 240.0),
        ]);
        let h = Homography::square_to_quad(90.0, &quad).expect("homography");
        let inv = h.inverse().expect("invertible");
        for p in [Point2::new(5.0_f32, 7.0), Point2::new(80.0, 44.0)] {
            assert_close(inv.apply(h.apply(p)), p, 1e-3);
        }
    }

    #[test]
    fn collapsed_quad_has_no_homography() {
        let p = Point2::new(3.0_f32, 3.0);
        let quad = GridQuad::new([p, p, p, p]);
        assert!(Homography::square_to_quad(10.0, &quad).is_none());
    }

    #[test]
    fn identity_warp_preserves_pixels() {
        let src = GrayImage {
            width: 3,
            height: 2,
            data: vec![10, 20, 30, 40, 50, 60],
        };
        let id = Homography::new(Matrix3::identity());
        let out = warp_perspective_gray(&src.view(), id, 3, 2);
        // Pixel centers sample between neighbours; the top-left sample mixes four pixels.
        assert_eq!(out.width, 3);
        assert_eq!(out.height, 2);
        assert_eq!(out.data[0], 30);
    }
}
