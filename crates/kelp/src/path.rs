//! SVG path data for edge geometry.
//!
//! Numbers are written with at most three fractional digits, rounding half up, which is what
//! `d3-path` does by default.

use crate::geom::{Curve, EdgeGeometry};
use crate::model::Point;
use std::fmt::Write as _;

pub(crate) fn fmt_path_into(out: &mut String, v: f64) {
    if !v.is_finite() || v.abs() < 0.0005 {
        out.push('0');
        return;
    }

    let k = (v * 1000.0 + 0.5).floor() as i64;
    if k == 0 {
        out.push('0');
        return;
    }

    let abs = k.unsigned_abs();
    if k < 0 {
        out.push('-');
    }
    let _ = write!(out, "{}", abs / 1000);
    let frac = abs % 1000;
    if frac == 0 {
        return;
    }
    let digits = format!("{frac:03}");
    out.push('.');
    out.push_str(digits.trim_end_matches('0'));
}

fn emit_pair(out: &mut String, cmd: char, x: f64, y: f64) {
    out.push(cmd);
    fmt_path_into(out, x);
    out.push(',');
    fmt_path_into(out, y);
}

fn emit_cubic(out: &mut String, c1: Point, c2: Point, p: Point) {
    out.push('C');
    for (i, q) in [c1, c2, p].into_iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        fmt_path_into(out, q.x);
        out.push(',');
        fmt_path_into(out, q.y);
    }
}

/// Parent/child link: one cubic with both control points at the mid depth.
pub fn diagonal_path_d(s: Point, d: Point) -> String {
    let mut out = String::with_capacity(64);
    let mid = (s.x + d.x) / 2.0;
    emit_pair(&mut out, 'M', s.x, s.y);
    emit_cubic(&mut out, Point::new(mid, s.y), Point::new(mid, d.y), d);
    out
}

/// Uniform B-spline through the control points, anchored at both ends.
pub fn curve_basis_path_d(points: &[Point]) -> String {
    let mut out = String::with_capacity(points.len().saturating_mul(64));
    if points.is_empty() {
        return out;
    }

    fn basis_point(out: &mut String, p0: Point, p1: Point, p: Point) {
        let c1 = Point::new((2.0 * p0.x + p1.x) / 3.0, (2.0 * p0.y + p1.y) / 3.0);
        let c2 = Point::new((p0.x + 2.0 * p1.x) / 3.0, (p0.y + 2.0 * p1.y) / 3.0);
        let e = Point::new(
            (p0.x + 4.0 * p1.x + p.x) / 6.0,
            (p0.y + 4.0 * p1.y + p.y) / 6.0,
        );
        emit_cubic(out, c1, c2, e);
    }

    let mut state = 0u8;
    let mut p0 = Point::default();
    let mut p1 = Point::default();
    for &p in points {
        match state {
            0 => {
                state = 1;
                emit_pair(&mut out, 'M', p.x, p.y);
            }
            1 => state = 2,
            2 => {
                state = 3;
                emit_pair(
                    &mut out,
                    'L',
                    (5.0 * p0.x + p1.x) / 6.0,
                    (5.0 * p0.y + p1.y) / 6.0,
                );
                basis_point(&mut out, p0, p1, p);
            }
            _ => basis_point(&mut out, p0, p1, p),
        }
        p0 = p1;
        p1 = p;
    }

    match state {
        3 => {
            basis_point(&mut out, p0, p1, p1);
            emit_pair(&mut out, 'L', p1.x, p1.y);
        }
        2 => emit_pair(&mut out, 'L', p1.x, p1.y),
        _ => {}
    }
    out
}

/// Path data for any edge, translated by `offset` (usually the margin).
pub fn path_d(geometry: &EdgeGeometry, offset: Point) -> String {
    let pts: Vec<Point> = geometry
        .points
        .iter()
        .map(|p| Point::new(p.x + offset.x, p.y + offset.y))
        .collect();
    match (geometry.curve, pts.as_slice()) {
        (Curve::Diagonal, [s, .., d]) => diagonal_path_d(*s, *d),
        _ => curve_basis_path_d(&pts),
    }
}
