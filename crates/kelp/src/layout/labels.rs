//! Label visibility and anchoring hints for the painter.

use crate::config::{LabelPeers, TreeConfig};
use crate::model::{HierarchyModel, Node, NodeIndex};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum LabelAnchor {
    Start,
    End,
}

pub fn peers(model: &HierarchyModel, idx: NodeIndex) -> LabelPeers {
    let siblings: &[NodeIndex] = match model.get(idx).parent {
        Some(p) => &model.get(p).visible_children,
        None => std::slice::from_ref(&model.root),
    };
    let mut out = LabelPeers::default();
    for &s in siblings {
        let n = model.get(s);
        if n.is_open() {
            out.open += 1;
        }
        if n.has_descendants {
            out.expandable += 1;
        }
    }
    out
}

/// Shows a label unless a sibling branch is expanded and this node's own is not.
///
/// When every expandable sibling is open no label is privileged, so all are shown.
pub fn default_label_visibility(node: &Node, peers: &LabelPeers) -> bool {
    if node.is_open() {
        return true;
    }
    if peers.open > 1 && peers.open == peers.expandable {
        return true;
    }
    peers.open == 0
}

pub(crate) fn label_visible(model: &HierarchyModel, idx: NodeIndex, config: &TreeConfig) -> bool {
    let node = model.get(idx);
    let peers = peers(model, idx);
    match &config.label_visibility {
        Some(custom) => (custom.0)(node, &peers),
        None => default_label_visibility(node, &peers),
    }
}

/// Text anchor and `(dx, dy)` offset relative to the node centre.
///
/// `dx` follows whether the node has children at all; the root is always start-anchored and
/// lifted by `text_gap`.
pub(crate) fn label_placement(node: &Node, text_gap: f64) -> (LabelAnchor, f64, f64) {
    let dx = if node.has_descendants { -text_gap } else { text_gap };
    if node.parent.is_none() {
        (LabelAnchor::Start, dx, -text_gap)
    } else if node.has_descendants {
        (LabelAnchor::End, -text_gap, 0.0)
    } else {
        (LabelAnchor::Start, text_gap, 0.0)
    }
}
