//! Builds a [`HierarchyModel`] from a nested JSON document.
//!
//! Children and labels are read through accessor closures, so callers can describe trees that
//! are not literally nested (e.g. child lists that reference entries of a flat table). That is
//! also why the builder checks that the accessor actually yields a tree: two paths reaching the
//! same JSON value, or an accessor that walks back to an ancestor, is rejected.

use crate::model::{Connection, HierarchyModel, Node, NodeId, NodeIndex, ValueRange};
use crate::{Error, Result};
use rustc_hash::{FxHashMap, FxHashSet};
use serde_json::Value;

/// Synthesized ids start here so they do not collide with small caller-supplied integers.
pub const SYNTHETIC_ID_BASE: u64 = 1_000_000;

pub type ChildAccessor<'a> = dyn Fn(&'a Value) -> Vec<&'a Value> + 'a;
pub type LabelAccessor<'a> = dyn Fn(&'a Value) -> String + 'a;

pub fn default_children(v: &Value) -> Vec<&Value> {
    v.get("children")
        .and_then(Value::as_array)
        .map(|a| a.iter().collect())
        .unwrap_or_default()
}

pub fn default_label(v: &Value) -> String {
    match v.get("name") {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        _ => String::new(),
    }
}

fn source_id(v: &Value) -> Option<NodeId> {
    match v.get("id")? {
        Value::Number(n) => Some(NodeId::from_number(n)),
        Value::String(s) => Some(NodeId::Name(s.clone())),
        _ => None,
    }
}

fn source_value(v: &Value) -> Option<f64> {
    v.get("value")
        .and_then(Value::as_f64)
        .filter(|x| x.is_finite())
}

pub struct HierarchyBuilder<'a> {
    children: Box<ChildAccessor<'a>>,
    label: Box<LabelAccessor<'a>>,
    connections: Option<Vec<Connection>>,
}

impl Default for HierarchyBuilder<'_> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a> HierarchyBuilder<'a> {
    pub fn new() -> Self {
        Self {
            children: Box::new(default_children),
            label: Box::new(default_label),
            connections: None,
        }
    }

    pub fn children(mut self, accessor: impl Fn(&'a Value) -> Vec<&'a Value> + 'a) -> Self {
        self.children = Box::new(accessor);
        self
    }

    pub fn label(mut self, accessor: impl Fn(&'a Value) -> String + 'a) -> Self {
        self.label = Box::new(accessor);
        self
    }

    /// Connections to attach instead of the root's `connections` field.
    pub fn connections(mut self, connections: Vec<Connection>) -> Self {
        self.connections = Some(connections);
        self
    }

    pub fn build(self, source: &'a Value) -> Result<HierarchyModel> {
        let mut nodes: Vec<Node> = Vec::new();
        let mut explicit: Vec<Option<NodeId>> = Vec::new();
        let mut on_path: FxHashSet<*const Value> = FxHashSet::default();
        let mut visited: FxHashSet<*const Value> = FxHashSet::default();

        // Iterative pre-order walk; `Exit` frames pop the node off the current path so a
        // value reached again while still on the path is reported as a cycle.
        enum Frame<'v> {
            Enter(&'v Value, Option<NodeIndex>, usize),
            Exit(*const Value),
        }

        let mut stack = vec![Frame::Enter(source, None, 0)];
        while let Some(frame) = stack.pop() {
            let (value, parent, depth) = match frame {
                Frame::Enter(v, p, d) => (v, p, d),
                Frame::Exit(ptr) => {
                    on_path.remove(&ptr);
                    continue;
                }
            };
            let ptr = value as *const Value;
            if on_path.contains(&ptr) {
                return Err(Error::InvalidHierarchy {
                    message: format!("cycle detected at depth {depth}"),
                });
            }
            if !visited.insert(ptr) {
                return Err(Error::InvalidHierarchy {
                    message: format!("entry at depth {depth} is reachable via more than one path"),
                });
            }
            on_path.insert(ptr);

            let idx = NodeIndex(nodes.len());
            nodes.push(Node {
                id: NodeId::Int(0),
                parent,
                visible_children: Vec::new(),
                hidden_children: Vec::new(),
                has_descendants: false,
                depth,
                height: 0,
                value: source_value(value),
                label: (self.label)(value),
            });
            explicit.push(source_id(value));
            if let Some(p) = parent {
                nodes[p.0].visible_children.push(idx);
                nodes[p.0].has_descendants = true;
            }

            stack.push(Frame::Exit(ptr));
            let kids = (self.children)(value);
            for child in kids.into_iter().rev() {
                stack.push(Frame::Enter(child, Some(idx), depth + 1));
            }
        }

        // Children were pushed while walking, but the walk visits them through a stack, so the
        // arena order already is pre-order and each child list is in source order.
        let by_id = assign_ids(&mut nodes, explicit)?;

        // Heights bottom-up: reverse pre-order visits children before parents.
        for i in (0..nodes.len()).rev() {
            if let Some(p) = nodes[i].parent {
                let h = nodes[i].height + 1;
                if nodes[p.0].height < h {
                    nodes[p.0].height = h;
                }
            }
        }

        let root = NodeIndex(0);
        let tree_height = nodes[0].height;
        let mut max_label_length = 0usize;
        let mut value_range: Option<ValueRange> = None;
        for n in &nodes {
            if n.depth == tree_height {
                max_label_length = max_label_length.max(n.label.chars().count());
            }
            let v = n.value.unwrap_or(0.0);
            let r = value_range.get_or_insert(ValueRange { min: v, max: v });
            r.min = r.min.min(v);
            r.max = r.max.max(v);
        }

        let mut model = HierarchyModel {
            nodes,
            root,
            by_id,
            max_label_length,
            value_range: value_range.unwrap_or_default(),
            ancestor_chains: FxHashMap::default(),
            connections: Vec::new(),
        };
        model.ancestor_chains = build_ancestor_chains(&model);
        model.connections = match self.connections {
            Some(c) => c,
            None => source_connections(source)?,
        };
        Ok(model)
    }
}

fn assign_ids(
    nodes: &mut [Node],
    explicit: Vec<Option<NodeId>>,
) -> Result<FxHashMap<NodeId, NodeIndex>> {
    let mut by_id: FxHashMap<NodeId, NodeIndex> = FxHashMap::default();
    for (i, id) in explicit.iter().enumerate() {
        let Some(id) = id else {
            continue;
        };
        if by_id.insert(id.clone(), NodeIndex(i)).is_some() {
            return Err(Error::InvalidHierarchy {
                message: format!("duplicate node id {id}"),
            });
        }
        nodes[i].id = id.clone();
    }

    let mut next = SYNTHETIC_ID_BASE;
    for (i, id) in explicit.iter().enumerate() {
        if id.is_some() {
            continue;
        }
        let mut candidate = NodeId::Int(next);
        while by_id.contains_key(&candidate) {
            next += 1;
            candidate = NodeId::Int(next);
        }
        next += 1;
        by_id.insert(candidate.clone(), NodeIndex(i));
        nodes[i].id = candidate;
    }
    Ok(by_id)
}

fn build_ancestor_chains(model: &HierarchyModel) -> FxHashMap<NodeId, Vec<NodeId>> {
    let mut chains: FxHashMap<NodeId, Vec<NodeId>> = FxHashMap::default();
    chains.reserve(model.len());
    for idx in model.all_nodes_preorder() {
        let node = model.get(idx);
        let mut chain = match node.parent {
            Some(p) => chains
                .get(&model.get(p).id)
                .cloned()
                .unwrap_or_default(),
            None => Vec::new(),
        };
        chain.push(node.id.clone());
        chains.insert(node.id.clone(), chain);
    }
    chains
}

fn source_connections(source: &Value) -> Result<Vec<Connection>> {
    match source.get("connections") {
        Some(v @ Value::Array(_)) => Ok(crate::json::from_value_ref(v)?),
        _ => Ok(Vec::new()),
    }
}

/// Builds a model with the default accessors (`children` and `name` fields).
pub fn bind(source: &Value) -> Result<HierarchyModel> {
    HierarchyBuilder::new().build(source)
}
