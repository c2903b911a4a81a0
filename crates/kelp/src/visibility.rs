//! Expand/collapse commands over a bound [`HierarchyModel`].
//!
//! Every operation is total: depth limits beyond the tree simply match no node. Subtrees only
//! ever move between a node's `visible_children` and `hidden_children`, so no node is created or
//! dropped by these commands.

use crate::model::{HierarchyModel, NodeId, NodeIndex};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Per-node open flags, as returned by [`HierarchyModel::snapshot_open_state`].
///
/// Serialized as a list of `{ "id", "open" }` entries sorted by id. JSON object keys would turn
/// integer ids into strings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OpenState(pub FxHashMap<NodeId, bool>);

#[derive(Serialize, Deserialize)]
struct OpenEntry {
    id: NodeId,
    open: bool,
}

impl Serialize for OpenState {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut entries: Vec<(&NodeId, &bool)> = self.0.iter().collect();
        entries.sort_by(|a, b| a.0.cmp(b.0));
        serializer.collect_seq(entries.into_iter().map(|(id, open)| OpenEntry {
            id: id.clone(),
            open: *open,
        }))
    }
}

impl<'de> Deserialize<'de> for OpenState {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let entries = Vec::<OpenEntry>::deserialize(deserializer)?;
        Ok(OpenState(
            entries.into_iter().map(|e| (e.id, e.open)).collect(),
        ))
    }
}

impl OpenState {
    pub fn is_open(&self, id: &NodeId) -> Option<bool> {
        self.0.get(id).copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl HierarchyModel {
    fn open(&mut self, idx: NodeIndex) -> bool {
        let node = self.get_mut(idx);
        if node.hidden_children.is_empty() {
            return false;
        }
        node.visible_children = std::mem::take(&mut node.hidden_children);
        true
    }

    fn close(&mut self, idx: NodeIndex) -> bool {
        let node = self.get_mut(idx);
        if node.visible_children.is_empty() {
            return false;
        }
        node.hidden_children = std::mem::take(&mut node.visible_children);
        true
    }

    /// Opens every node shallower than `depth_limit` (default: the full tree height).
    ///
    /// Runs root to leaf, so children exposed by this call are themselves considered.
    pub fn expand(&mut self, depth_limit: Option<usize>) {
        let limit = depth_limit.unwrap_or_else(|| self.height());
        let mut stack = vec![self.root_index()];
        while let Some(idx) = stack.pop() {
            if self.get(idx).depth < limit {
                self.open(idx);
            }
            stack.extend(self.get(idx).visible_children.iter().rev().copied());
        }
    }

    /// Closes every open node at depth `>= depth_limit` (default: 1, all but the root).
    ///
    /// Runs leaf to root over both child lists, so open nodes inside already hidden subtrees are
    /// closed too.
    pub fn collapse(&mut self, depth_limit: Option<usize>) {
        let limit = depth_limit.unwrap_or(1);
        for idx in self.all_nodes_preorder().into_iter().rev() {
            if self.get(idx).depth >= limit {
                self.close(idx);
            }
        }
    }

    /// Flips one node between open and closed. Returns `false` for unknown ids and leaves.
    pub fn toggle(&mut self, id: &NodeId) -> bool {
        let Some(idx) = self.index_of(id) else {
            return false;
        };
        if self.get(idx).is_open() {
            self.close(idx)
        } else {
            self.open(idx)
        }
    }

    pub fn snapshot_open_state(&self) -> OpenState {
        OpenState(
            self.nodes()
                .map(|(_, n)| (n.id.clone(), n.is_open()))
                .collect(),
        )
    }

    /// Re-applies a snapshot. Ids missing from the snapshot keep their current state.
    pub fn restore_open_state(&mut self, snapshot: &OpenState) {
        for idx in self.all_nodes_preorder().into_iter().rev() {
            let Some(want_open) = snapshot.is_open(&self.get(idx).id) else {
                continue;
            };
            if want_open {
                self.open(idx);
            } else {
                self.close(idx);
            }
        }
    }
}
