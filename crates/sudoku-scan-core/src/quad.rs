//! Puzzle boundary geometry.
//!
//! Internally the boundary is a [`GridQuad`]: four pixel-space points in a
//! fixed role order. [`DetectionResult`] is the named-field, normalized form
//! exchanged with callers.

use nalgebra::Point2;
use serde::{Deserialize, Serialize};

/// Semantic role of a quad corner; the discriminant is its storage index.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CornerRole {
    TopLeft = 0,
    TopRight = 1,
    BottomLeft = 2,
    BottomRight = 3,
}

impl CornerRole {
    pub const ALL: [CornerRole; 4] = [
        CornerRole::TopLeft,
        CornerRole::TopRight,
        CornerRole::BottomLeft,
        CornerRole::BottomRight,
    ];
}

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum QuadError {
    #[error("corner {role:?} is not finite")]
    NotFinite { role: CornerRole },
    #[error("corner {role:?} at ({x}, {y}) is not strictly positive")]
    NonPositive { role: CornerRole, x: f32, y: f32 },
    #[error("{first:?} and {second:?} violate the corner ordering")]
    Misordered { first: CornerRole, second: CornerRole },
}

/// Four pixel-space corners stored as `[top-left, top-right, bottom-left, bottom-right]`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GridQuad {
    points: [Point2<f32>; 4],
}

impl std::ops::Index<CornerRole> for GridQuad {
    type Output = Point2<f32>;

    fn index(&self, role: CornerRole) -> &Self::Output {
        &self.points[role as usize]
    }
}

// Pairs (a, b) with a.x <= b.x.
const X_ORDER: [(CornerRole, CornerRole); 4] = [
    (CornerRole::TopLeft, CornerRole::TopRight),
    (CornerRole::TopLeft, CornerRole::BottomRight),
    (CornerRole::BottomLeft, CornerRole::TopRight),
    (CornerRole::BottomLeft, CornerRole::BottomRight),
];

// Pairs (a, b) with a.y <= b.y.
const Y_ORDER: [(CornerRole, CornerRole); 4] = [
    (CornerRole::TopLeft, CornerRole::BottomLeft),
    (CornerRole::TopLeft, CornerRole::BottomRight),
    (CornerRole::TopRight, CornerRole::BottomLeft),
    (CornerRole::TopRight, CornerRole::BottomRight),
];

impl GridQuad {
    /// Wrap points that are already in role order.
    pub fn new(points: [Point2<f32>; 4]) -> Self {
        Self { points }
    }

    /// Assign roles to four unordered corner points.
    ///
    /// Points are split by `y` into an upper and a lower pair. In the upper
    /// pair the top-left corner has the smaller `x + y`; in the lower pair the
    /// bottom-left corner has the smaller `x - y`.
    pub fn from_unordered(mut pts: [Point2<f32>; 4]) -> Self {
        pts.sort_by(|a, b| a.y.total_cmp(&b.y).then(a.x.total_cmp(&b.x)));
        let (upper, lower) = pts.split_at(2);

        let (tl, tr) = if upper[0].x + upper[0].y <= upper[1].x + upper[1].y {
            (upper[0], upper[1])
        } else {
            (upper[1], upper[0])
        };
        let (bl, br) = if lower[0].x - lower[0].y <= lower[1].x - lower[1].y {
            (lower[0], lower[1])
        } else {
            (lower[1], lower[0])
        };
        Self::new([tl, tr, bl, br])
    }

    pub fn points(&self) -> &[Point2<f32>; 4] {
        &self.points
    }

    /// Check that every corner is finite and strictly positive and that the
    /// corners satisfy the ordering invariant.
    pub fn validate(&self) -> Result<(), QuadError> {
        for role in CornerRole::ALL {
            let p = self[role];
            if !p.x.is_finite() || !p.y.is_finite() {
                return Err(QuadError::NotFinite { role });
            }
            if p.x <= 0.0 || p.y <= 0.0 {
                return Err(QuadError::NonPositive { role, x: p.x, y: p.y });
            }
        }
        for (first, second) in X_ORDER {
            if self[first].x > self[second].x {
                return Err(QuadError::Misordered { first, second });
            }
        }
        for (first, second) in Y_ORDER {
            if self[first].y > self[second].y {
                return Err(QuadError::Misordered { first, second });
            }
        }
        Ok(())
    }

    /// Polygon area (shoelace over the TL -> TR -> BR -> BL outline).
    pub fn area(&self) -> f32 {
        let ring = [
            self[CornerRole::TopLeft],
            self[CornerRole::TopRight],
            self[CornerRole::BottomRight],
            self[CornerRole::BottomLeft],
        ];
        let mut acc = 0.0f32;
        for i in 0..4 {
            let a = ring[i];
            let b = ring[(i + 1) % 4];
            acc += a.x * b.y - b.x * a.y;
        }
        acc.abs() * 0.5
    }
}

/// A 2-D point; normalized to `[0, 1]` when crossing the API boundary.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize, Default)]
pub struct Coordinate {
    pub x: f64,
    pub y: f64,
}

impl Coordinate {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Normalized puzzle boundary with named corners.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct DetectionResult {
    pub top_left: Coordinate,
    pub top_right: Coordinate,
    pub bottom_left: Coordinate,
    pub bottom_right: Coordinate,
}

impl DetectionResult {
    /// Result reported when the input could not be decoded: the whole frame.
    pub const fn full_frame() -> Self {
        Self {
            top_left: Coordinate::new(0.0, 0.0),
            top_right: Coordinate::new(1.0, 0.0),
            bottom_left: Coordinate::new(0.0, 1.0),
            bottom_right: Coordinate::new(1.0, 1.0),
        }
    }

    /// Normalize pixel-space corners by the image size.
    pub fn from_quad(quad: &GridQuad, width: usize, height: usize) -> Self {
        let (w, h) = (width as f64, height as f64);
        let n = |role: CornerRole| {
            let p = quad[role];
            Coordinate::new(p.x as f64 / w, p.y as f64 / h)
        };
        Self {
            top_left: n(CornerRole::TopLeft),
            top_right: n(CornerRole::TopRight),
            bottom_left: n(CornerRole::BottomLeft),
            bottom_right: n(CornerRole::BottomRight),
        }
    }

    /// Scale normalized corners back into pixel space.
    pub fn to_quad(&self, width: usize, height: usize) -> GridQuad {
        let (w, h) = (width as f64, height as f64);
        GridQuad::new(
            self.coordinates()
                .map(|c| Point2::new((c.x * w) as f32, (c.y * h) as f32)),
        )
    }

    /// Corners in role order.
    pub fn coordinates(&self) -> [Coordinate; 4] {
        [
            self.top_left,
            self.top_right,
            self.bottom_left,
            self.bottom_right,
        ]
    }
}
