//! Edge geometry shared by parent/child links and connections.

use crate::model::Point;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Curve {
    /// Parent/child link: `[source, c1, c2, target]`, drawn as one cubic segment.
    Diagonal,
    /// Connection between the same resolved node: closed 5-point loop.
    Loop,
    /// Axis-aligned, close endpoints: 3-point bulge.
    TightBulge,
    /// Axis-aligned, distant endpoints: 5-point bulge.
    WideBulge,
    /// Endpoints at different depths: 3-point open curve.
    Open,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EdgeGeometry {
    pub curve: Curve,
    pub points: Vec<Point>,
}

impl EdgeGeometry {
    /// Horizontal cubic from `s` to `d` with both control points at the mid depth.
    pub fn diagonal(s: Point, d: Point) -> Self {
        let mid = (s.x + d.x) / 2.0;
        Self {
            curve: Curve::Diagonal,
            points: vec![s, Point::new(mid, s.y), Point::new(mid, d.y), d],
        }
    }

    /// Same curve kind and point count, every point collapsed onto `at`.
    pub fn degenerate_like(&self, at: Point) -> Self {
        Self {
            curve: self.curve,
            points: vec![at; self.points.len()],
        }
    }

    pub fn is_degenerate(&self) -> bool {
        self.points.windows(2).all(|w| w[0] == w[1])
    }

    pub fn start(&self) -> Option<Point> {
        self.points.first().copied()
    }

    pub fn end(&self) -> Option<Point> {
        self.points.last().copied()
    }

    /// Pointwise interpolation. The shorter list is padded with its last point.
    pub fn lerp(&self, other: &EdgeGeometry, t: f64) -> EdgeGeometry {
        let n = self.points.len().max(other.points.len());
        let pick = |pts: &[Point], i: usize| -> Point {
            pts.get(i)
                .or_else(|| pts.last())
                .copied()
                .unwrap_or_default()
        };
        let points = (0..n)
            .map(|i| pick(&self.points, i).lerp(pick(&other.points, i), t))
            .collect();
        EdgeGeometry {
            curve: if t < 1.0 { self.curve } else { other.curve },
            points,
        }
    }
}
