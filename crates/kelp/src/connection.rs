//! Routing of declared connections between nodes that may be hidden.
//!
//! Each endpoint is resolved to its nearest visible representative by walking the ancestor chain
//! precomputed at build time (self, parent, grandparent, ...), so hidden structure is never
//! re-walked. Unknown ids fall back to the root.

use crate::geom::{Curve, EdgeGeometry};
use crate::layout::{LaidOutNode, LayoutResult};
use crate::model::{ConnectionKey, HierarchyModel, NodeId, Point};
use rustc_hash::FxHashSet;
use serde::Serialize;

/// Endpoints closer than this along the sibling axis get the tight bulge.
pub const CLOSE_DISTANCE: f64 = 48.0;
pub const MIN_CURVE_RADIUS: f64 = 8.0;
pub const MAX_CURVE_RADIUS: f64 = 120.0;
/// Depth-axis tolerance for treating two endpoints as axis-aligned.
pub const ALIGN_EPSILON: f64 = 0.5;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoutedConnection {
    pub key: ConnectionKey,
    pub label: Option<String>,
    pub resolved_from: NodeId,
    pub resolved_to: NodeId,
    pub geometry: EdgeGeometry,
}

fn root_id(model: &HierarchyModel, layout: &LayoutResult) -> NodeId {
    layout
        .root()
        .map(|n| n.id.clone())
        .unwrap_or_else(|| model.root().id.clone())
}

/// Nearest visible representative of `id`: itself, else its closest visible ancestor.
pub fn resolve_endpoint(model: &HierarchyModel, layout: &LayoutResult, id: &NodeId) -> NodeId {
    let Some(chain) = model.ancestor_chain(id) else {
        tracing::warn!(%id, "connection endpoint is not part of the hierarchy, using root");
        return root_id(model, layout);
    };
    chain
        .iter()
        .rev()
        .find(|a| layout.contains(a))
        .cloned()
        .unwrap_or_else(|| root_id(model, layout))
}

fn curve_radius(distance: f64) -> f64 {
    (distance / 2.0).clamp(MIN_CURVE_RADIUS, MAX_CURVE_RADIUS)
}

/// Open nodes bulge inward (toward the root), closed ones outward.
fn bulge_sign(node: &LaidOutNode) -> f64 {
    if node.open { -1.0 } else { 1.0 }
}

pub fn connection_geometry(a: &LaidOutNode, b: &LaidOutNode) -> EdgeGeometry {
    if a.id == b.id {
        let p = a.position;
        let s = bulge_sign(a);
        let r = MIN_CURVE_RADIUS;
        return EdgeGeometry {
            curve: Curve::Loop,
            points: vec![
                p,
                Point::new(p.x + s * r, p.y - r),
                Point::new(p.x + s * 2.0 * r, p.y),
                Point::new(p.x + s * r, p.y + r),
                p,
            ],
        };
    }

    if (a.position.x - b.position.x).abs() < ALIGN_EPSILON {
        // Top to bottom along the sibling axis keeps the winding consistent.
        let (a, b) = if a.position.y <= b.position.y {
            (a, b)
        } else {
            (b, a)
        };
        let (pa, pb) = (a.position, b.position);
        let distance = (pb.y - pa.y).abs();
        let r = curve_radius(distance);
        let (sa, sb) = (bulge_sign(a), bulge_sign(b));
        let mid_x = (pa.x + pb.x) / 2.0;
        let mid_y = (pa.y + pb.y) / 2.0;

        if distance < CLOSE_DISTANCE {
            let s = if sa == sb { sa } else { 1.0 };
            return EdgeGeometry {
                curve: Curve::TightBulge,
                points: vec![pa, Point::new(mid_x + s * r, mid_y), pb],
            };
        }
        return EdgeGeometry {
            curve: Curve::WideBulge,
            points: vec![
                pa,
                Point::new(pa.x + sa * r, pa.y),
                Point::new(mid_x + (sa + sb) / 2.0 * r, mid_y),
                Point::new(pb.x + sb * r, pb.y),
                pb,
            ],
        };
    }

    // Shallower endpoint first.
    let (a, b) = if a.position.x <= b.position.x {
        (a, b)
    } else {
        (b, a)
    };
    let (pa, pb) = (a.position, b.position);
    let r = curve_radius((pb.x - pa.x).abs());
    EdgeGeometry {
        curve: Curve::Open,
        points: vec![
            pa,
            Point::new((pa.x + pb.x) / 2.0, (pa.y + pb.y) / 2.0 - r),
            pb,
        ],
    }
}

/// Resolves and routes every declared connection against the current layout.
///
/// Repeated `(from, to)` pairs keep their first declaration.
pub fn route_connections(model: &HierarchyModel, layout: &LayoutResult) -> Vec<RoutedConnection> {
    let mut seen: FxHashSet<ConnectionKey> = FxHashSet::default();
    let mut out = Vec::with_capacity(model.connections().len());
    for c in model.connections() {
        let key = c.key();
        if !seen.insert(key.clone()) {
            tracing::debug!(from = %key.from, to = %key.to, "ignoring duplicate connection");
            continue;
        }
        let resolved_from = resolve_endpoint(model, layout, &c.from);
        let resolved_to = resolve_endpoint(model, layout, &c.to);
        let (Some(a), Some(b)) = (layout.get(&resolved_from), layout.get(&resolved_to)) else {
            continue;
        };
        out.push(RoutedConnection {
            key,
            label: c.label.clone(),
            geometry: connection_geometry(a, b),
            resolved_from,
            resolved_to,
        });
    }
    out
}
