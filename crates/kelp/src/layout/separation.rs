//! Pairwise minimum gap between adjacent same-depth nodes, in node-height units.

use crate::config::{SeparationFn, TreeConfig};
use crate::model::Node;

pub const GAP_DIFFERENT_PARENTS: f64 = 3.0;
pub const GAP_BOTH_OPEN: f64 = 6.0;
/// Per child of the open node when its neighbour is a leaf.
pub const GAP_PER_REVEALED_CHILD: f64 = 1.33;
pub const GAP_ONE_OPEN: f64 = 3.0;
pub const GAP_CLOSED_WITH_DESCENDANTS: f64 = 2.5;
pub const GAP_LEAVES: f64 = 2.0;

/// The state-dependent default policy. Rules are checked in order; the first match wins.
pub fn default_separation(a: &Node, b: &Node) -> f64 {
    if a.parent != b.parent {
        return GAP_DIFFERENT_PARENTS;
    }
    match (a.is_open(), b.is_open()) {
        (true, true) => GAP_BOTH_OPEN,
        (true, false) | (false, true) => {
            let other_is_leaf = if a.is_open() {
                !b.has_descendants
            } else {
                !a.has_descendants
            };
            if other_is_leaf {
                a.child_count().max(b.child_count()) as f64 * GAP_PER_REVEALED_CHILD
            } else {
                GAP_ONE_OPEN
            }
        }
        (false, false) if a.has_descendants || b.has_descendants => GAP_CLOSED_WITH_DESCENDANTS,
        (false, false) => GAP_LEAVES,
    }
}

/// Separation policy resolved once per layout.
pub(crate) enum Separation<'a> {
    Default,
    Custom(&'a SeparationFn),
}

impl<'a> Separation<'a> {
    pub(crate) fn resolve(config: &'a TreeConfig) -> Self {
        match &config.separation {
            Some(custom) => Self::Custom(custom.0.as_ref()),
            None => Self::Default,
        }
    }

    /// Sanitized gap: never negative, never NaN.
    pub(crate) fn gap(&self, a: &Node, b: &Node) -> f64 {
        let g = match self {
            Self::Default => default_separation(a, b),
            Self::Custom(f) => f(a, b),
        };
        if g.is_finite() { g.max(0.0) } else { GAP_LEAVES }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hierarchy::bind;
    use crate::model::NodeId;
    use serde_json::json;

    fn gap(model: &crate::model::HierarchyModel, a: u64, b: u64) -> f64 {
        default_separation(
            model.node(&NodeId::Int(a)).unwrap(),
            model.node(&NodeId::Int(b)).unwrap(),
        )
    }

    #[test]
    fn table_rules_in_order() {
        let mut model = bind(&json!({
            "id": 1,
            "children": [
                { "id": 2, "children": [{ "id": 20 }, { "id": 21 }, { "id": 22 }] },
                { "id": 3, "children": [{ "id": 30 }] },
                { "id": 4 },
                { "id": 5 },
                { "id": 6, "children": [{ "id": 60 }] }
            ]
        }))
        .unwrap();
        assert_eq!(gap(&model, 22, 30), GAP_DIFFERENT_PARENTS);
        assert_eq!(gap(&model, 2, 3), GAP_BOTH_OPEN);
        assert_eq!(gap(&model, 3, 4), 1.0 * GAP_PER_REVEALED_CHILD);
        assert_eq!(gap(&model, 4, 2), 3.0 * GAP_PER_REVEALED_CHILD);
        assert_eq!(gap(&model, 4, 5), GAP_LEAVES);
        assert_eq!(gap(&model, 5, 6), 1.0 * GAP_PER_REVEALED_CHILD);

        model.toggle(&NodeId::Int(3));
        assert_eq!(gap(&model, 2, 3), GAP_ONE_OPEN);
        assert_eq!(gap(&model, 3, 4), GAP_CLOSED_WITH_DESCENDANTS);
        model.toggle(&NodeId::Int(6));
        assert_eq!(gap(&model, 3, 6), GAP_CLOSED_WITH_DESCENDANTS);
    }
}
