//! Hierarchy model types.
//!
//! Nodes live in an arena owned by [`HierarchyModel`]; parent and child references are
//! [`NodeIndex`] handles into that arena, so moving a subtree between the visible and hidden
//! child lists is a plain `Vec` move.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Stable node identifier, either taken from the source data or synthesized at build time.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(untagged)]
pub enum NodeId {
    Int(u64),
    Name(String),
}

impl NodeId {
    /// Non-negative integers keep their numeric identity; any other number is named by its
    /// JSON text (`-1`, `2.5`).
    pub fn from_number(n: &serde_json::Number) -> Self {
        match n.as_u64() {
            Some(u) => NodeId::Int(u),
            None => NodeId::Name(n.to_string()),
        }
    }
}

impl<'de> Deserialize<'de> for NodeId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Int(u64),
            Number(serde_json::Number),
            Name(String),
        }

        Ok(match Raw::deserialize(deserializer)? {
            Raw::Int(v) => NodeId::Int(v),
            Raw::Number(n) => NodeId::from_number(&n),
            Raw::Name(s) => NodeId::Name(s),
        })
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeId::Int(v) => write!(f, "{v}"),
            NodeId::Name(v) => f.write_str(v),
        }
    }
}

impl From<u64> for NodeId {
    fn from(value: u64) -> Self {
        Self::Int(value)
    }
}

impl From<&str> for NodeId {
    fn from(value: &str) -> Self {
        Self::Name(value.to_string())
    }
}

impl From<String> for NodeId {
    fn from(value: String) -> Self {
        Self::Name(value)
    }
}

/// Arena slot of a node inside one [`HierarchyModel`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeIndex(pub(crate) usize);

impl NodeIndex {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Screen-space point.
///
/// The tree grows left to right: `x` is the depth axis, `y` the sibling-order axis.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn lerp(self, other: Point, t: f64) -> Point {
        Point {
            x: self.x + (other.x - self.x) * t,
            y: self.y + (other.y - self.y) * t,
        }
    }

    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ValueRange {
    pub min: f64,
    pub max: f64,
}

impl ValueRange {
    pub fn is_degenerate(&self) -> bool {
        !(self.max - self.min).is_normal()
    }
}

impl Default for ValueRange {
    fn default() -> Self {
        Self { min: 0.0, max: 0.0 }
    }
}

/// A declared non-hierarchical edge between two node ids.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Connection {
    pub from: NodeId,
    pub to: NodeId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl Connection {
    pub fn new(from: impl Into<NodeId>, to: impl Into<NodeId>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            label: None,
        }
    }

    pub fn key(&self) -> ConnectionKey {
        ConnectionKey {
            from: self.from.clone(),
            to: self.to.clone(),
        }
    }
}

/// Identity of a connection across commits.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ConnectionKey {
    pub from: NodeId,
    pub to: NodeId,
}

#[derive(Debug, Clone)]
pub struct Node {
    pub id: NodeId,
    pub parent: Option<NodeIndex>,
    pub visible_children: Vec<NodeIndex>,
    pub hidden_children: Vec<NodeIndex>,
    /// True if the node has children in either list, independent of toggle state.
    pub has_descendants: bool,
    pub depth: usize,
    /// Height of the full subtree (leaf = 0), fixed at build time.
    pub height: usize,
    /// `None` when the source entry had no numeric value.
    pub value: Option<f64>,
    pub label: String,
}

impl Node {
    pub fn is_open(&self) -> bool {
        !self.visible_children.is_empty()
    }

    pub fn is_closed(&self) -> bool {
        !self.hidden_children.is_empty()
    }

    pub fn child_count(&self) -> usize {
        self.visible_children.len() + self.hidden_children.len()
    }
}

/// One bound data set: the node arena plus build-time metadata.
#[derive(Debug, Clone)]
pub struct HierarchyModel {
    pub(crate) nodes: Vec<Node>,
    pub(crate) root: NodeIndex,
    pub(crate) by_id: FxHashMap<NodeId, NodeIndex>,
    pub(crate) max_label_length: usize,
    pub(crate) value_range: ValueRange,
    pub(crate) ancestor_chains: FxHashMap<NodeId, Vec<NodeId>>,
    pub(crate) connections: Vec<Connection>,
}

impl HierarchyModel {
    pub fn root_index(&self) -> NodeIndex {
        self.root
    }

    pub fn root(&self) -> &Node {
        &self.nodes[self.root.0]
    }

    pub fn get(&self, idx: NodeIndex) -> &Node {
        &self.nodes[idx.0]
    }

    pub(crate) fn get_mut(&mut self, idx: NodeIndex) -> &mut Node {
        &mut self.nodes[idx.0]
    }

    pub fn index_of(&self, id: &NodeId) -> Option<NodeIndex> {
        self.by_id.get(id).copied()
    }

    pub fn node(&self, id: &NodeId) -> Option<&Node> {
        self.index_of(id).map(|idx| self.get(idx))
    }

    pub fn parent(&self, idx: NodeIndex) -> Option<&Node> {
        self.get(idx).parent.map(|p| self.get(p))
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Height of the full tree, including collapsed parts.
    pub fn height(&self) -> usize {
        self.root().height
    }

    pub fn max_label_length(&self) -> usize {
        self.max_label_length
    }

    pub fn value_range(&self) -> ValueRange {
        self.value_range
    }

    /// Root-to-node id sequence over the full tree.
    pub fn ancestor_chain(&self, id: &NodeId) -> Option<&[NodeId]> {
        self.ancestor_chains.get(id).map(Vec::as_slice)
    }

    pub fn connections(&self) -> &[Connection] {
        &self.connections
    }

    pub fn set_connections(&mut self, connections: Vec<Connection>) {
        self.connections = connections;
    }

    pub fn nodes(&self) -> impl Iterator<Item = (NodeIndex, &Node)> {
        self.nodes.iter().enumerate().map(|(i, n)| (NodeIndex(i), n))
    }

    /// Currently visible nodes in depth-first (pre-order) sibling order.
    pub fn visible_nodes(&self) -> Vec<NodeIndex> {
        let mut out = Vec::new();
        let mut stack = vec![self.root];
        while let Some(idx) = stack.pop() {
            out.push(idx);
            stack.extend(self.get(idx).visible_children.iter().rev().copied());
        }
        out
    }

    pub fn visible_ids(&self) -> Vec<NodeId> {
        self.visible_nodes()
            .into_iter()
            .map(|idx| self.get(idx).id.clone())
            .collect()
    }

    /// Every node in pre-order over both child lists.
    pub(crate) fn all_nodes_preorder(&self) -> Vec<NodeIndex> {
        let mut out = Vec::with_capacity(self.nodes.len());
        let mut stack = vec![self.root];
        while let Some(idx) = stack.pop() {
            out.push(idx);
            let n = self.get(idx);
            stack.extend(n.hidden_children.iter().rev().copied());
            stack.extend(n.visible_children.iter().rev().copied());
        }
        out
    }
}
