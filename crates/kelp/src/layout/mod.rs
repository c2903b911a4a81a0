//! Layout of the currently visible tree.
//!
//! Layout is a pure function of the model's visible subtree and the configuration: calling it
//! twice without an intervening mutation yields identical output.

use crate::config::TreeConfig;
use crate::model::{HierarchyModel, NodeId, NodeIndex, Point};
use crate::scale::ResolvedRadius;
use rustc_hash::FxHashMap;
use serde::Serialize;

pub mod labels;
pub mod separation;
mod tidy;

pub use labels::{LabelAnchor, default_label_visibility};
pub use separation::default_separation;

use separation::Separation;

/// Lower bound for any derived extent (column width, node height, inner canvas size).
pub const MIN_EXTENT: f64 = 1.0;

/// Half the leaf gap of padding on both ends of the sibling axis.
const SIBLING_AXIS_PADDING: f64 = 1.0;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LaidOutNode {
    pub id: NodeId,
    #[serde(skip)]
    pub index: NodeIndex,
    pub parent: Option<NodeId>,
    pub depth: usize,
    pub position: Point,
    pub radius: f64,
    pub label: String,
    pub label_visible: bool,
    pub label_anchor: LabelAnchor,
    pub label_dx: f64,
    pub label_dy: f64,
    pub open: bool,
    pub has_descendants: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutResult {
    /// Visible nodes in pre-order; positions are relative to the inner (margin-less) area.
    pub nodes: Vec<LaidOutNode>,
    pub width: f64,
    pub height: f64,
    pub margin: f64,
    pub inner_width: f64,
    pub inner_height: f64,
    /// Pixels per separation unit along the sibling axis.
    pub node_height: f64,
    /// Pixels per depth level along the depth axis.
    pub column_width: f64,
    #[serde(skip)]
    by_id: FxHashMap<NodeId, usize>,
}

impl LayoutResult {
    pub fn get(&self, id: &NodeId) -> Option<&LaidOutNode> {
        self.by_id.get(id).map(|&i| &self.nodes[i])
    }

    pub fn position(&self, id: &NodeId) -> Option<Point> {
        self.get(id).map(|n| n.position)
    }

    pub fn contains(&self, id: &NodeId) -> bool {
        self.by_id.contains_key(id)
    }

    pub fn root(&self) -> Option<&LaidOutNode> {
        self.nodes.first()
    }

    pub fn ids(&self) -> impl Iterator<Item = &NodeId> {
        self.nodes.iter().map(|n| &n.id)
    }
}

/// Widest visible level: the largest number of visible nodes sharing one depth.
pub fn max_level_width(model: &HierarchyModel, visible: &[NodeIndex]) -> usize {
    let mut widths: Vec<usize> = Vec::new();
    for &idx in visible {
        let d = model.get(idx).depth;
        if widths.len() <= d {
            widths.resize(d + 1, 0);
        }
        widths[d] += 1;
    }
    widths.into_iter().max().unwrap_or(1)
}

fn outer_height(config: &TreeConfig, level_width: usize) -> f64 {
    if let Some(h) = config.height {
        return h;
    }
    if config.pixels_per_node > 0.0 {
        return level_width as f64 * config.pixels_per_node + 2.0 * config.margin.max(0.0);
    }
    (config.width * config.aspect).round()
}

fn clamp_extent(v: f64, what: &str) -> f64 {
    if v.is_finite() && v >= MIN_EXTENT {
        return v;
    }
    tracing::debug!(value = v, extent = what, "insufficient canvas space, clamping");
    MIN_EXTENT
}

pub fn layout(model: &HierarchyModel, config: &TreeConfig) -> LayoutResult {
    let visible = model.visible_nodes();
    let radius = ResolvedRadius::resolve(&config.radius, model.value_range());
    let sep = Separation::resolve(config);

    let margin = if config.margin.is_finite() {
        config.margin.max(0.0)
    } else {
        0.0
    };
    let width = config.width;
    let height = outer_height(config, max_level_width(model, &visible));
    let inner_width = clamp_extent(width - 2.0 * margin, "inner width");
    let inner_height = clamp_extent(height - 2.0 * margin, "inner height");

    let radii: Vec<f64> = visible.iter().map(|&i| radius.radius(model.get(i))).collect();
    let max_radius = radii.iter().copied().fold(0.0, f64::max);
    let max_depth = visible
        .iter()
        .map(|&i| model.get(i).depth)
        .max()
        .unwrap_or(0);

    let glyph_width = if config.glyph_width.is_finite() {
        config.glyph_width.max(0.0)
    } else {
        0.0
    };
    let text_gap = if config.text_gap.is_finite() {
        config.text_gap
    } else {
        0.0
    };
    let reserved = model.max_label_length() as f64 * glyph_width + max_radius + text_gap;
    let column_width = clamp_extent(
        (inner_width - reserved) / max_depth.max(1) as f64,
        "column width",
    );

    let units = tidy::place(model, &visible, &sep);
    let (min_u, max_u) = units
        .values()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &u| {
            (lo.min(u), hi.max(u))
        });
    let (min_u, max_u) = if min_u.is_finite() {
        (min_u, max_u)
    } else {
        (0.0, 0.0)
    };
    let span = max_u - min_u + 2.0 * SIBLING_AXIS_PADDING;
    let node_height = {
        let h = inner_height / span;
        if h.is_finite() && h > 0.0 {
            h
        } else {
            tracing::debug!(span, inner_height, "degenerate sibling span, clamping");
            MIN_EXTENT
        }
    };

    let mut nodes = Vec::with_capacity(visible.len());
    let mut by_id = FxHashMap::default();
    by_id.reserve(visible.len());
    for (&idx, r) in visible.iter().zip(radii) {
        let node = model.get(idx);
        let u = units.get(&idx).copied().unwrap_or(0.0);
        let position = Point::new(
            node.depth as f64 * column_width,
            (u - min_u + SIBLING_AXIS_PADDING) * node_height,
        );
        let (label_anchor, label_dx, label_dy) = labels::label_placement(node, text_gap);
        by_id.insert(node.id.clone(), nodes.len());
        nodes.push(LaidOutNode {
            id: node.id.clone(),
            index: idx,
            parent: model.parent(idx).map(|p| p.id.clone()),
            depth: node.depth,
            position,
            radius: r,
            label: node.label.clone(),
            label_visible: labels::label_visible(model, idx, config),
            label_anchor,
            label_dx,
            label_dy,
            open: node.is_open(),
            has_descendants: node.has_descendants,
        });
    }

    LayoutResult {
        nodes,
        width,
        height,
        margin,
        inner_width,
        inner_height,
        node_height,
        column_width,
        by_id,
    }
}
