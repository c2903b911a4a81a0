//! Tidy-tree placement along the sibling-order axis.
//!
//! Subtrees are laid out bottom-up. Each subtree keeps a contour: for every depth below its root,
//! the outermost node on the left and right together with its offset. A new sibling subtree is
//! pushed right until, at every shared depth, its left contour clears the right contour of the
//! siblings before it by the pairwise separation gap. Parents sit at the mean of their children.
//!
//! Because the nodes facing each other across a contour are exactly the adjacent same-depth
//! pairs, every adjacent pair ends up at least one gap apart.

use super::separation::Separation;
use crate::model::{HierarchyModel, NodeIndex};
use rustc_hash::FxHashMap;

#[derive(Debug, Clone, Copy)]
struct Row {
    left: f64,
    left_node: NodeIndex,
    right: f64,
    right_node: NodeIndex,
}

impl Row {
    fn single(idx: NodeIndex) -> Self {
        Self {
            left: 0.0,
            left_node: idx,
            right: 0.0,
            right_node: idx,
        }
    }

    fn shifted(self, dx: f64) -> Self {
        Self {
            left: self.left + dx,
            right: self.right + dx,
            ..self
        }
    }
}

/// Sibling-axis coordinates in separation units, root at `0`.
///
/// `visible` must be the model's visible nodes in pre-order.
pub(crate) fn place(
    model: &HierarchyModel,
    visible: &[NodeIndex],
    sep: &Separation<'_>,
) -> FxHashMap<NodeIndex, f64> {
    let mut relative: FxHashMap<NodeIndex, f64> = FxHashMap::default();
    let mut contours: FxHashMap<NodeIndex, Vec<Row>> = FxHashMap::default();

    // Reverse pre-order visits every child before its parent.
    for &idx in visible.iter().rev() {
        let node = model.get(idx);
        let mut merged: Vec<Row> = Vec::new();
        let mut offsets: Vec<f64> = Vec::with_capacity(node.visible_children.len());

        for &child in &node.visible_children {
            let contour = contours
                .remove(&child)
                .unwrap_or_else(|| vec![Row::single(child)]);
            if merged.is_empty() {
                merged = contour;
                offsets.push(0.0);
                continue;
            }

            let mut shift = f64::NEG_INFINITY;
            for (placed, incoming) in merged.iter().zip(contour.iter()) {
                let gap = sep.gap(model.get(placed.right_node), model.get(incoming.left_node));
                shift = shift.max(placed.right + gap - incoming.left);
            }
            offsets.push(shift);

            for (depth, row) in contour.into_iter().enumerate() {
                let row = row.shifted(shift);
                if let Some(existing) = merged.get_mut(depth) {
                    existing.right = row.right;
                    existing.right_node = row.right_node;
                } else {
                    merged.push(row);
                }
            }
        }

        let center = if offsets.is_empty() {
            0.0
        } else {
            offsets.iter().sum::<f64>() / offsets.len() as f64
        };
        for (&child, offset) in node.visible_children.iter().zip(offsets) {
            relative.insert(child, offset - center);
        }

        let mut contour = Vec::with_capacity(merged.len() + 1);
        contour.push(Row::single(idx));
        contour.extend(merged.into_iter().map(|r| r.shifted(-center)));
        contours.insert(idx, contour);
    }

    let mut absolute: FxHashMap<NodeIndex, f64> = FxHashMap::default();
    absolute.reserve(visible.len());
    absolute.insert(model.root_index(), 0.0);
    for &idx in visible {
        let base = absolute.get(&idx).copied().unwrap_or(0.0);
        for &child in &model.get(idx).visible_children {
            let rel = relative.get(&child).copied().unwrap_or(0.0);
            absolute.insert(child, base + rel);
        }
    }
    absolute
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hierarchy::bind;
    use crate::model::NodeId;
    use serde_json::json;

    #[test]
    fn parent_sits_at_mean_of_children() {
        let model = bind(&json!({
            "id": 1,
            "children": [{ "id": 2 }, { "id": 3 }, { "id": 4 }]
        }))
        .unwrap();
        let visible = model.visible_nodes();
        let units = place(&model, &visible, &Separation::Default);
        let at = |id: u64| units[&model.index_of(&NodeId::Int(id)).unwrap()];
        assert_eq!(at(1), 0.0);
        assert_eq!(at(2), -2.0);
        assert_eq!(at(3), 0.0);
        assert_eq!(at(4), 2.0);
    }

    #[test]
    fn cousins_are_pushed_apart_by_contour() {
        let model = bind(&json!({
            "id": 1,
            "children": [
                { "id": 2, "children": [{ "id": 20 }, { "id": 21 }] },
                { "id": 3, "children": [{ "id": 30 }, { "id": 31 }] }
            ]
        }))
        .unwrap();
        let visible = model.visible_nodes();
        let units = place(&model, &visible, &Separation::Default);
        let at = |id: u64| units[&model.index_of(&NodeId::Int(id)).unwrap()];
        assert!(at(30) - at(21) >= 3.0 - 1e-9);
        assert!(at(3) - at(2) >= 6.0 - 1e-9);
        assert_eq!(at(21) - at(20), 2.0);
    }
}
